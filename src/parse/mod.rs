//! Recursive tree construction
//!
//! Parses the root manifest, then follows module links of every profile
//! that passes the active-profile selection. Already-visited paths are
//! never re-parsed, so link cycles cannot recurse. Modules land in the
//! arena in first-seen depth-first order.

mod manifest;

pub use manifest::parse_manifest;

use crate::coords::Ga;
use crate::model::{Module, ProfileSelection};
use crate::Result;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Everything the tree build pass produces
#[derive(Debug, Default)]
pub(crate) struct TreeBuild {
    pub modules: Vec<Module>,
    pub by_path: HashMap<String, usize>,
    pub by_ga: HashMap<Ga, usize>,
    pub linked_by: HashMap<String, String>,
}

pub(crate) fn build_tree(
    root_dir: &Path,
    manifest_name: &str,
    selection: &ProfileSelection,
) -> Result<TreeBuild> {
    let mut build = TreeBuild::default();
    let mut visited = HashSet::new();
    visit(
        root_dir,
        manifest_name,
        selection,
        manifest_name.to_string(),
        &mut build,
        &mut visited,
    )?;
    Ok(build)
}

fn visit(
    root_dir: &Path,
    manifest_name: &str,
    selection: &ProfileSelection,
    path: String,
    build: &mut TreeBuild,
    visited: &mut HashSet<String>,
) -> Result<()> {
    if !visited.insert(path.clone()) {
        return Ok(());
    }
    let file = root_dir.join(&path);
    tracing::debug!(file = %file.display(), "parsing manifest");
    let text = std::fs::read_to_string(&file)?;
    let module = parse_manifest(&text, &path)?;

    let links: Vec<String> = module
        .profiles
        .iter()
        .filter(|p| selection.is_active(p.id.as_deref()))
        .flat_map(|p| p.modules.iter())
        .map(|link| resolve_link(&path, link, manifest_name))
        .collect();

    let index = build.modules.len();
    build.by_path.insert(path.clone(), index);
    build.by_ga.entry(module.ga()).or_insert(index);
    build.modules.push(module);

    for child in links {
        build
            .linked_by
            .entry(child.clone())
            .or_insert_with(|| path.clone());
        visit(root_dir, manifest_name, selection, child, build, visited)?;
    }
    Ok(())
}

/// Turn a module-link value into the root-relative path of the linked
/// manifest file.
///
/// A link names either a directory (the manifest file name is appended) or
/// a manifest file directly; `.` and `..` segments are normalized out.
pub(crate) fn resolve_link(parent_path: &str, link: &str, manifest_name: &str) -> String {
    let parent_dir = match parent_path.rfind('/') {
        Some(idx) => &parent_path[..idx],
        None => "",
    };
    let link = link.trim().trim_end_matches('/');
    let mut joined = String::new();
    if !parent_dir.is_empty() {
        joined.push_str(parent_dir);
        joined.push('/');
    }
    joined.push_str(link);
    if !joined.ends_with(".xml") {
        joined.push('/');
        joined.push_str(manifest_name);
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_to_directory() {
        assert_eq!(resolve_link("pom.xml", "core", "pom.xml"), "core/pom.xml");
        assert_eq!(
            resolve_link("stack/pom.xml", "api", "pom.xml"),
            "stack/api/pom.xml"
        );
    }

    #[test]
    fn test_link_to_file() {
        assert_eq!(
            resolve_link("pom.xml", "special/alt-pom.xml", "pom.xml"),
            "special/alt-pom.xml"
        );
    }

    #[test]
    fn test_parent_segments_normalize() {
        assert_eq!(
            resolve_link("stack/pom.xml", "../sibling", "pom.xml"),
            "sibling/pom.xml"
        );
        assert_eq!(
            resolve_link("a/b/pom.xml", "./c", "pom.xml"),
            "a/b/c/pom.xml"
        );
    }
}
