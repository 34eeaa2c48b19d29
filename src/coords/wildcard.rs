//! Wildcard coordinate sets
//!
//! Include/exclude pattern algebra over `group:artifact` strings, backed by
//! glob patterns. `org.example:*` matches every artifact in a group,
//! `*:*-parent` every parent artifact. An entry prefixed with `!` excludes.
//! Excludes always win over includes; a set with no includes matches
//! nothing unless it consists solely of excludes, in which case it matches
//! everything not excluded.

use super::Ga;
use crate::Result;
use glob::Pattern;

/// A set of coordinates described by wildcard patterns
#[derive(Debug, Clone)]
pub struct WildcardSet {
    includes: Vec<Pattern>,
    excludes: Vec<Pattern>,
}

impl WildcardSet {
    /// Parse a comma-separated pattern list, `!`-prefixed entries excluding
    pub fn parse(spec: &str) -> Result<Self> {
        let mut includes = Vec::new();
        let mut excludes = Vec::new();
        for entry in spec.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            if let Some(negated) = entry.strip_prefix('!') {
                excludes.push(Pattern::new(negated)?);
            } else {
                includes.push(Pattern::new(entry)?);
            }
        }
        Ok(Self { includes, excludes })
    }

    pub fn matches(&self, ga: &Ga) -> bool {
        let text = ga.to_string();
        if self.excludes.iter().any(|p| p.matches(&text)) {
            return false;
        }
        if self.includes.is_empty() {
            return !self.excludes.is_empty();
        }
        self.includes.iter().any(|p| p.matches(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_wildcard() {
        let set = WildcardSet::parse("org.example:*").unwrap();
        assert!(set.matches(&Ga::new("org.example", "core")));
        assert!(!set.matches(&Ga::new("org.other", "core")));
    }

    #[test]
    fn test_exclude_wins() {
        let set = WildcardSet::parse("org.example:*,!org.example:legacy").unwrap();
        assert!(set.matches(&Ga::new("org.example", "core")));
        assert!(!set.matches(&Ga::new("org.example", "legacy")));
    }

    #[test]
    fn test_exclude_only_matches_rest() {
        let set = WildcardSet::parse("!org.example:legacy").unwrap();
        assert!(set.matches(&Ga::new("org.other", "thing")));
        assert!(!set.matches(&Ga::new("org.example", "legacy")));
    }

    #[test]
    fn test_empty_spec_matches_nothing() {
        let set = WildcardSet::parse("").unwrap();
        assert!(!set.matches(&Ga::new("g", "a")));
    }
}
