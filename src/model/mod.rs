//! Source-tree data model
//!
//! Defines Module, Profile, the active-profile selection value, and the
//! immutable SourceTree graph.

mod module;
mod profile;
mod selection;
mod source_tree;

pub use module::{Module, ParentRef};
pub use profile::{
    DependencyDecl, ExtensionDecl, PluginDecl, Profile, DEFAULT_PLUGIN_GROUP,
};
pub use selection::ProfileSelection;
pub use source_tree::{SourceTree, DEFAULT_MANIFEST_NAME};
