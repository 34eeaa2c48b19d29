//! Coordinate identity types
//!
//! A module is identified by its group id + artifact id independent of
//! version. Both types are immutable values with total ordering, so they can
//! key maps and produce stable sorted output.

use crate::{PomforgeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Group-id/artifact-id pair identifying a module independent of version
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Ga {
    pub group: String,
    pub artifact: String,
}

impl Ga {
    pub fn new(group: impl Into<String>, artifact: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
        }
    }
}

impl fmt::Display for Ga {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.artifact)
    }
}

impl FromStr for Ga {
    type Err = PomforgeError;

    /// Parse `group:artifact`
    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.splitn(2, ':');
        match (parts.next(), parts.next()) {
            (Some(group), Some(artifact)) if !group.is_empty() && !artifact.is_empty() => {
                Ok(Self::new(group, artifact))
            }
            _ => Err(PomforgeError::Coordinates(s.to_string())),
        }
    }
}

/// Group-id/artifact-id/version triple
///
/// The version may be absent when it is managed elsewhere in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Gav {
    pub ga: Ga,
    pub version: Option<String>,
}

impl Gav {
    pub fn new(ga: Ga, version: Option<String>) -> Self {
        Self { ga, version }
    }
}

impl fmt::Display for Gav {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{}:{}", self.ga, v),
            None => write!(f, "{}", self.ga),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let ga: Ga = "org.example:core".parse().unwrap();
        assert_eq!(ga.group, "org.example");
        assert_eq!(ga.artifact, "core");
        assert_eq!(ga.to_string(), "org.example:core");
    }

    #[test]
    fn test_parse_rejects_missing_parts() {
        assert!("org.example".parse::<Ga>().is_err());
        assert!(":core".parse::<Ga>().is_err());
        assert!("org.example:".parse::<Ga>().is_err());
    }

    #[test]
    fn test_total_order_by_group_then_artifact() {
        let mut gas = vec![
            Ga::new("b", "a"),
            Ga::new("a", "z"),
            Ga::new("a", "b"),
        ];
        gas.sort();
        assert_eq!(gas[0], Ga::new("a", "b"));
        assert_eq!(gas[2], Ga::new("b", "a"));
    }

    #[test]
    fn test_gav_display_without_version() {
        let gav = Gav::new(Ga::new("g", "a"), None);
        assert_eq!(gav.to_string(), "g:a");
        let gav = Gav::new(Ga::new("g", "a"), Some("1.0".to_string()));
        assert_eq!(gav.to_string(), "g:a:1.0");
    }
}
