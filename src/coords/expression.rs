//! Placeholder-aware strings
//!
//! Every scalar read from a manifest is bound to the coordinate scope it
//! resolves against. An expression with no `${` substring is constant and
//! compares equal across owners; anything else only compares equal within
//! the same owning scope, because `${foo}` can mean different things in
//! different modules.

use super::Ga;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A raw manifest scalar plus the coordinate scope that owns it
#[derive(Debug, Clone)]
pub struct Expression {
    raw: String,
    owner: Ga,
    constant: bool,
}

impl Expression {
    pub fn new(raw: impl Into<String>, owner: Ga) -> Self {
        let raw = raw.into();
        let constant = !raw.contains("${");
        Self {
            raw,
            owner,
            constant,
        }
    }

    /// The text exactly as written in the manifest
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The coordinate scope this expression resolves against
    pub fn owner(&self) -> &Ga {
        &self.owner
    }

    /// True when the raw text contains no placeholder
    pub fn is_constant(&self) -> bool {
        self.constant
    }

    /// When the whole expression is a single `${name}` reference, the name
    pub fn property_name(&self) -> Option<&str> {
        self.raw
            .strip_prefix("${")
            .and_then(|rest| rest.strip_suffix('}'))
            .filter(|name| !name.contains("${"))
    }
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        if self.constant != other.constant {
            return false;
        }
        // constant expressions are equal regardless of owner
        if self.constant {
            self.raw == other.raw
        } else {
            self.raw == other.raw && self.owner == other.owner
        }
    }
}

impl Eq for Expression {}

impl Hash for Expression {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
        if !self.constant {
            self.owner.hash(state);
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn ga(s: &str) -> Ga {
        Ga::new("g", s)
    }

    #[test]
    fn test_constant_detection() {
        assert!(Expression::new("1.2.3", ga("a")).is_constant());
        assert!(!Expression::new("${revision}", ga("a")).is_constant());
        assert!(!Expression::new("1.${minor}", ga("a")).is_constant());
    }

    #[test]
    fn test_constant_equality_ignores_owner() {
        let a = Expression::new("1.2.3", ga("a"));
        let b = Expression::new("1.2.3", ga("b"));
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_placeholder_equality_respects_owner() {
        let a = Expression::new("${revision}", ga("a"));
        let b = Expression::new("${revision}", ga("b"));
        let a2 = Expression::new("${revision}", ga("a"));
        assert_ne!(a, b);
        assert_eq!(a, a2);
    }

    #[test]
    fn test_property_name() {
        assert_eq!(
            Expression::new("${foo.bar}", ga("a")).property_name(),
            Some("foo.bar")
        );
        assert_eq!(Expression::new("1.${minor}", ga("a")).property_name(), None);
        assert_eq!(Expression::new("1.2.3", ga("a")).property_name(), None);
    }
}
