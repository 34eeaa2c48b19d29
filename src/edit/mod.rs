//! Edit planning and application
//!
//! The planner turns a request into a deduplicated per-file set of pending
//! edits; the editor applies one file's edits to its original text while
//! preserving formatting. Nothing here mutates the SourceTree — callers
//! re-parse after writing.

pub mod editor;
pub mod ordering;
pub mod planner;

pub use editor::{apply_edit_set, apply_edits, SelfClosingStyle};
pub use planner::{plan_add_module, plan_restrict, plan_set_version, restore_pruned, RemovalStrategy};

use serde::Serialize;
use std::collections::HashMap;
use xmlgrove::Selector;

/// One pending operation against one file's tree
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EditOp {
    /// Replace the text content of the selected element
    SetText { selector: Selector, text: String },
    /// Insert `<name>text</name>` under the selected parent, creating the
    /// parent at its canonical position when missing
    InsertElement {
        parent: Selector,
        name: String,
        text: String,
    },
    /// Remove the selected element and its preceding indentation
    RemoveElement { selector: Selector },
    /// Replace the selected element with a comment carrying its markup
    /// plus a trailing tag, so it can be restored later
    CommentOut { selector: Selector, tag: String },
    /// Convert every tagged module-link comment back to a live element
    UncommentLinks { tag: String },
}

/// Deduplicated pending edits, grouped per target file
#[derive(Debug, Default)]
pub struct EditSet {
    edits: HashMap<String, Vec<EditOp>>,
}

impl EditSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an edit unless the same edit is already pending for the file
    pub fn push(&mut self, file: &str, op: EditOp) {
        let ops = self.edits.entry(file.to_string()).or_default();
        if !ops.contains(&op) {
            ops.push(op);
        }
    }

    /// Target files in sorted order
    pub fn files(&self) -> Vec<&str> {
        let mut files: Vec<&str> = self.edits.keys().map(String::as_str).collect();
        files.sort_unstable();
        files
    }

    pub fn for_file(&self, file: &str) -> &[EditOp] {
        self.edits.get(file).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Total pending edits across all files
    pub fn len(&self) -> usize {
        self.edits.values().map(Vec::len).sum()
    }
}

/// Summary of an apply pass, serializable for CLI output
#[derive(Debug, Clone, Serialize)]
pub struct ApplyReport {
    pub changed: Vec<String>,
    pub unchanged: Vec<String>,
}
