//! Turning requests into pending edit sets
//!
//! Planners are read-only over the tree: they emit deduplicated per-file
//! edits and never touch disk themselves, except for the restore driver
//! which alternates writes with fresh parses until a fixed point.

use super::editor::{apply_edit_set, SelfClosingStyle};
use super::{ApplyReport, EditOp, EditSet};
use crate::coords::Ga;
use crate::model::{
    DependencyDecl, ExtensionDecl, Module, PluginDecl, Profile, ProfileSelection, SourceTree,
};
use crate::parse;
use crate::resolve::Resolver;
use crate::Result;
use std::collections::HashSet;
use std::path::Path;
use xmlgrove::{Selector, Step};

/// How pruned module links are removed
#[derive(Debug, Clone)]
pub enum RemovalStrategy {
    /// Delete the link element outright
    Delete,
    /// Comment the link out with a trailing tag so it can be restored
    CommentOut { tag: String },
}

/// Selector prefix for content under the given profile scope
fn scope_selector(profile: &Profile) -> Selector {
    match &profile.id {
        None => Selector::path(&["project"]),
        Some(id) => Selector::path(&["project", "profiles"])
            .then_step(Step::named("profile").with_child_text("id", id.clone())),
    }
}

/// Kinds of versioned declaration entries the set-version planner visits
enum Entry<'a> {
    Dependency(&'a DependencyDecl, &'a [&'a str]),
    Plugin(&'a PluginDecl, &'a [&'a str]),
    Extension(&'a ExtensionDecl),
}

/// Plan edits that move every in-tree declaration to `new_version`.
///
/// Covers: each module's own explicitly declared version, in-tree parent
/// references, and every profile's managed/direct dependency,
/// managed/direct plugin, and extension entries whose resolved
/// coordinates are in-tree and which carry an explicit version. A version
/// that is a pure property reference is rewritten where the property is
/// defined instead, except the built-in `project.version`, which already
/// follows the module version.
pub fn plan_set_version(
    tree: &SourceTree,
    resolver: &Resolver<'_>,
    new_version: &str,
) -> Result<EditSet> {
    let mut edits = EditSet::new();

    for module in tree.modules() {
        if module.has_explicit_version() {
            edits.push(
                &module.path,
                EditOp::SetText {
                    selector: Selector::path(&["project", "version"]),
                    text: new_version.to_string(),
                },
            );
        }
        if let Some(parent) = &module.parent {
            if tree.contains(&parent.ga()) {
                edits.push(
                    &module.path,
                    EditOp::SetText {
                        selector: Selector::path(&["project", "parent", "version"]),
                        text: new_version.to_string(),
                    },
                );
            }
        }

        for profile in &module.profiles {
            let scope = scope_selector(profile);
            for dep in &profile.dependency_management {
                plan_entry_version(
                    tree,
                    resolver,
                    module,
                    &scope,
                    Entry::Dependency(dep, &["dependencyManagement", "dependencies"]),
                    new_version,
                    &mut edits,
                )?;
            }
            for dep in &profile.dependencies {
                plan_entry_version(
                    tree,
                    resolver,
                    module,
                    &scope,
                    Entry::Dependency(dep, &["dependencies"]),
                    new_version,
                    &mut edits,
                )?;
            }
            for plugin in &profile.plugin_management {
                plan_entry_version(
                    tree,
                    resolver,
                    module,
                    &scope,
                    Entry::Plugin(plugin, &["build", "pluginManagement", "plugins"]),
                    new_version,
                    &mut edits,
                )?;
            }
            for plugin in &profile.plugins {
                plan_entry_version(
                    tree,
                    resolver,
                    module,
                    &scope,
                    Entry::Plugin(plugin, &["build", "plugins"]),
                    new_version,
                    &mut edits,
                )?;
            }
            for ext in &profile.extensions {
                plan_entry_version(
                    tree,
                    resolver,
                    module,
                    &scope,
                    Entry::Extension(ext),
                    new_version,
                    &mut edits,
                )?;
            }
        }
    }

    tracing::debug!(edits = edits.len(), "planned version edits");
    Ok(edits)
}

fn plan_entry_version(
    tree: &SourceTree,
    resolver: &Resolver<'_>,
    module: &Module,
    scope: &Selector,
    entry: Entry<'_>,
    new_version: &str,
    edits: &mut EditSet,
) -> Result<()> {
    let (ga, version, container, entry_name, group_raw, artifact_raw) = match &entry {
        Entry::Dependency(dep, container) => (
            resolver.dependency_ga(dep)?,
            dep.version.as_ref(),
            *container,
            "dependency",
            Some(dep.group_id.raw().to_string()),
            dep.artifact_id.raw().to_string(),
        ),
        Entry::Plugin(plugin, container) => (
            resolver.plugin_ga(plugin)?,
            plugin.version.as_ref(),
            *container,
            "plugin",
            plugin.group_id.as_ref().map(|g| g.raw().to_string()),
            plugin.artifact_id.raw().to_string(),
        ),
        Entry::Extension(ext) => (
            resolver.extension_ga(ext)?,
            ext.version.as_ref(),
            &["build", "extensions"][..],
            "extension",
            Some(ext.group_id.raw().to_string()),
            ext.artifact_id.raw().to_string(),
        ),
    };

    let Some(version) = version else {
        return Ok(());
    };
    if !tree.contains(&ga) {
        return Ok(());
    }

    if let Some(name) = version.property_name() {
        // a property reference: rewrite the definition, not the usage;
        // the built-ins already track the module version
        if name.starts_with("project.") {
            return Ok(());
        }
        let site = resolver.find_property_definition(module, name)?;
        let defining = tree
            .by_path(&site.module_path)
            .expect("definition site is in-tree");
        let scope = match &site.profile_id {
            None => Selector::path(&["project"]),
            Some(id) => Selector::path(&["project", "profiles"])
                .then_step(Step::named("profile").with_child_text("id", id.clone())),
        };
        let selector = scope.then("properties").then(name);
        edits.push(
            &defining.path,
            EditOp::SetText {
                selector,
                text: new_version.to_string(),
            },
        );
        return Ok(());
    }

    // locate the entry by its literal group + artifact text
    let mut selector = scope.clone();
    for step in container {
        selector = selector.then(*step);
    }
    let mut entry_step = Step::named(entry_name).with_child_text("artifactId", artifact_raw);
    if let Some(group) = group_raw {
        entry_step = entry_step.with_child_text("groupId", group);
    }
    let selector = selector.then_step(entry_step).then("version");
    edits.push(
        &module.path,
        EditOp::SetText {
            selector,
            text: new_version.to_string(),
        },
    );
    Ok(())
}

/// Plan removal of every module link whose in-tree target falls outside
/// the required set, walking only into children that remain required
pub fn plan_restrict(
    tree: &SourceTree,
    required: &HashSet<Ga>,
    strategy: &RemovalStrategy,
) -> Result<EditSet> {
    let mut edits = EditSet::new();
    restrict_walk(tree, tree.root(), required, strategy, &mut edits)?;
    tracing::debug!(edits = edits.len(), "planned module-link removals");
    Ok(edits)
}

fn restrict_walk(
    tree: &SourceTree,
    module: &Module,
    required: &HashSet<Ga>,
    strategy: &RemovalStrategy,
    edits: &mut EditSet,
) -> Result<()> {
    for profile in &module.profiles {
        for link in &profile.modules {
            let child_path = parse::resolve_link(&module.path, link, tree.manifest_name());
            let Some(child) = tree.by_path(&child_path) else {
                // link into a subtree this selection never parsed
                continue;
            };
            if required.contains(&child.ga()) {
                restrict_walk(tree, child, required, strategy, edits)?;
            } else {
                let selector = scope_selector(profile)
                    .then("modules")
                    .then_step(Step::named("module").with_text(link.clone()));
                let op = match strategy {
                    RemovalStrategy::Delete => EditOp::RemoveElement { selector },
                    RemovalStrategy::CommentOut { tag } => EditOp::CommentOut {
                        selector,
                        tag: tag.clone(),
                    },
                };
                edits.push(&module.path, op);
            }
        }
    }
    Ok(())
}

/// Plan adding one module link to a module's unconditioned module list
pub fn plan_add_module(module: &Module, link: &str) -> EditSet {
    let mut edits = EditSet::new();
    edits.push(
        &module.path,
        EditOp::InsertElement {
            parent: Selector::path(&["project", "modules"]),
            name: "module".to_string(),
            text: link.to_string(),
        },
    );
    edits
}

/// Restore every module link pruned with `tag`, repeating
/// {write -> re-parse -> restore} until a pass changes nothing, then
/// return the final tree.
///
/// Each restored link can reveal descendants whose files only become
/// reachable after a fresh parse, so a single pass is not enough; the
/// fixed point is, and reaching it makes the operation idempotent.
pub fn restore_pruned(
    root_dir: &Path,
    manifest_name: &str,
    selection: &ProfileSelection,
    tag: &str,
    style: SelfClosingStyle,
) -> Result<(SourceTree, ApplyReport)> {
    let mut total = ApplyReport {
        changed: Vec::new(),
        unchanged: Vec::new(),
    };
    loop {
        let tree = SourceTree::load_with(root_dir, manifest_name, selection)?;
        let mut edits = EditSet::new();
        for module in tree.modules() {
            edits.push(
                &module.path,
                EditOp::UncommentLinks {
                    tag: tag.to_string(),
                },
            );
        }
        let report = apply_edit_set(root_dir, &edits, style)?;
        if report.changed.is_empty() {
            total.unchanged = report.unchanged;
            tracing::debug!("restore reached its fixed point");
            return Ok((tree, total));
        }
        total.changed.extend(report.changed);
    }
}
