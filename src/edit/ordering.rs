//! Canonical top-level element ordering
//!
//! New elements inserted under the root go at the conventionally correct
//! position. Elements are grouped; a blank line separates groups but not
//! members of one group. Asking for a name absent from the table is a
//! programmer error.

use lazy_static::lazy_static;
use std::collections::HashMap;

lazy_static! {
    /// Conventional ordering of root-level manifest elements, grouped
    static ref GROUPS: Vec<Vec<&'static str>> = vec![
        vec!["modelVersion"],
        vec!["parent"],
        vec!["groupId", "artifactId", "version", "packaging"],
        vec![
            "name",
            "description",
            "url",
            "inceptionYear",
            "organization",
            "licenses",
        ],
        vec!["developers", "contributors"],
        vec!["mailingLists"],
        vec!["prerequisites"],
        vec!["modules"],
        vec![
            "scm",
            "issueManagement",
            "ciManagement",
            "distributionManagement",
        ],
        vec!["properties"],
        vec!["dependencyManagement", "dependencies"],
        vec!["repositories", "pluginRepositories"],
        vec!["build"],
        vec!["reporting"],
        vec!["profiles"],
    ];

    static ref POSITIONS: HashMap<&'static str, (usize, usize)> = {
        let mut map = HashMap::new();
        for (group_idx, group) in GROUPS.iter().enumerate() {
            for (member_idx, name) in group.iter().enumerate() {
                map.insert(*name, (group_idx, member_idx));
            }
        }
        map
    };
}

/// (group, position-within-group) of a root-level element name
pub fn position(name: &str) -> Option<(usize, usize)> {
    POSITIONS.get(name).copied()
}

/// The ordering group an element belongs to
pub fn group_of(name: &str) -> Option<usize> {
    position(name).map(|(group, _)| group)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_names_are_ordered() {
        assert!(position("modelVersion").unwrap() < position("parent").unwrap());
        assert!(position("modules").unwrap() < position("properties").unwrap());
        assert!(position("dependencyManagement").unwrap() < position("dependencies").unwrap());
        assert!(position("build").unwrap() < position("profiles").unwrap());
    }

    #[test]
    fn test_group_membership() {
        assert_eq!(group_of("groupId"), group_of("version"));
        assert_ne!(group_of("modules"), group_of("properties"));
    }

    #[test]
    fn test_unknown_name() {
        assert_eq!(position("banana"), None);
    }
}
