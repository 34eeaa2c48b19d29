//! Pomforge - format-preserving editor for linked XML build-manifest trees
//!
//! Models a multi-module build-manifest hierarchy (a tree of linked XML
//! project files) and performs targeted, byte-faithful edits to it: bumping
//! versions across the whole tree, pruning and restoring module links, and
//! updating managed dependency and plugin declarations. Consumed by
//! higher-level release and repository-maintenance tooling; not itself a
//! build tool.
//!
//! # Architecture
//!
//! - **coords**: coordinate identities (Ga/Gav), placeholder-aware
//!   Expressions, wildcard coordinate sets
//! - **model**: Module, Profile, the active-profile selection, and the
//!   immutable SourceTree graph
//! - **parse**: streaming per-file parse and recursive tree construction
//! - **resolve**: `${...}` expansion with scope climbing and memoization
//! - **closure**: required-module closures, complements, dependency
//!   collection
//! - **edit**: edit planning plus the format-preserving tree editor
//!
//! Data flows one way: SourceTree -> Resolver/ClosureEngine (read-only
//! queries) -> EditPlanner (pending edit set) -> TreeEditor (writes files)
//! -> optional re-parse into a new SourceTree.

// Core modules
pub mod closure;
pub mod commands;
pub mod coords;
pub mod edit;
pub mod error;
pub mod logging;
pub mod model;
pub mod parse;
pub mod resolve;

// Re-exports
pub use closure::ClosureEngine;
pub use coords::{Expression, Ga, Gav, WildcardSet};
pub use edit::{
    apply_edit_set, apply_edits, plan_add_module, plan_restrict, plan_set_version,
    restore_pruned, EditOp, EditSet, RemovalStrategy, SelfClosingStyle,
};
pub use error::{PomforgeError, Result};
pub use model::{Module, ProfileSelection, SourceTree};
pub use resolve::Resolver;
