//! Error types for pomforge
//!
//! One error enum covering every failure mode across the crate, with a
//! crate-wide Result alias. Uses thiserror.

use thiserror::Error;

/// Result type alias for pomforge operations
pub type Result<T> = std::result::Result<T, PomforgeError>;

/// Comprehensive error type for pomforge operations
#[derive(Error, Debug)]
pub enum PomforgeError {
    /// Malformed manifest content (authoring error, never retried)
    #[error("Parse error in {path}: {message}")]
    Parse { path: String, message: String },

    /// I/O errors (non-transient, propagated immediately)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors from the XML layer
    #[error("XML error: {0}")]
    Xml(#[from] xmlgrove::XmlError),

    /// A `${...}` reference that no module in the parent chain defines
    #[error("Unresolved property reference ${{{name}}} starting from {origin}")]
    UnresolvedProperty { name: String, origin: String },

    /// A property whose expansion leads back to itself
    #[error("Property resolution cycle: {chain}")]
    PropertyCycle { chain: String },

    /// A coordinate that no module in the tree carries
    #[error("Module not found in tree: {0}")]
    ModuleNotFound(String),

    /// A selector that matched nothing where an edit expected a target
    #[error("Selector matched nothing in {path}: {selector}")]
    SelectorNoMatch { path: String, selector: String },

    /// An element name missing from the canonical ordering table
    #[error("No ordering entry for element <{0}>")]
    UnknownElement(String),

    /// Invalid coordinate text (expected group:artifact)
    #[error("Invalid coordinates: {0}")]
    Coordinates(String),

    /// Invalid wildcard pattern
    #[error("Invalid wildcard pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),

    /// Anyhow errors (for more context)
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}
