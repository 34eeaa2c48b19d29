//! Active-profile selection
//!
//! The caller decides which named profiles are "on" for a resolution or
//! traversal pass. The selection is a plain value (normalized sorted id
//! sets), never an opaque predicate, so it can key caches and compare
//! across calls.

use std::collections::BTreeSet;
use std::fmt;

/// Which named profiles are active
///
/// The unconditioned profile (id = None) is always active.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProfileSelection {
    enabled: BTreeSet<String>,
    disabled: BTreeSet<String>,
}

impl ProfileSelection {
    /// No named profiles active
    pub fn none() -> Self {
        Self::default()
    }

    /// Parse a `p1,p2,!p3` activation argument; `!` or `-` prefixed
    /// entries deactivate
    pub fn parse(spec: &str) -> Self {
        let mut selection = Self::default();
        for entry in spec.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            if let Some(id) = entry.strip_prefix('!').or_else(|| entry.strip_prefix('-')) {
                selection.disabled.insert(id.to_string());
            } else {
                selection.enabled.insert(entry.to_string());
            }
        }
        selection
    }

    pub fn enable(&mut self, id: impl Into<String>) {
        self.enabled.insert(id.into());
    }

    /// Whether a profile with the given id passes this selection
    pub fn is_active(&self, id: Option<&str>) -> bool {
        match id {
            None => true,
            Some(id) => self.enabled.contains(id) && !self.disabled.contains(id),
        }
    }
}

impl fmt::Display for ProfileSelection {
    /// Canonical form: sorted enabled ids, then sorted `!`-prefixed
    /// disabled ids
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for id in &self.enabled {
            if !first {
                write!(f, ",")?;
            }
            write!(f, "{}", id)?;
            first = false;
        }
        for id in &self.disabled {
            if !first {
                write!(f, ",")?;
            }
            write!(f, "!{}", id)?;
            first = false;
        }
        Ok(())
    }
}
