//! Graph closures over the module tree
//!
//! Walks "depends on", "is parent of", and "imports" edges to answer the
//! planning questions release tooling asks: which modules must stay when a
//! seed set is built, what the rest of the tree is, and what a module's
//! dependency declarations amount to once resolved.

use crate::coords::{Ga, Gav, WildcardSet};
use crate::model::{Module, ProfileSelection, SourceTree};
use crate::resolve::Resolver;
use crate::Result;
use std::collections::{BTreeSet, HashSet, VecDeque};

/// Read-only closure queries bound to one tree and selection
pub struct ClosureEngine<'t> {
    tree: &'t SourceTree,
    resolver: Resolver<'t>,
}

impl<'t> ClosureEngine<'t> {
    pub fn new(tree: &'t SourceTree, selection: ProfileSelection) -> Self {
        let resolver = Resolver::new(tree, selection);
        Self { tree, resolver }
    }

    pub fn resolver(&self) -> &Resolver<'t> {
        &self.resolver
    }

    /// Every module that must remain buildable for the seeds to build:
    /// declared-parent ancestors, proper parents, and in-tree targets of
    /// dependency, plugin, and import edges, transitively. First-seen
    /// insertion order.
    pub fn required_modules(&self, seeds: &[Ga]) -> Result<Vec<Ga>> {
        let mut result: Vec<Ga> = Vec::new();
        let mut seen: HashSet<Ga> = HashSet::new();
        let mut queue: VecDeque<Ga> = VecDeque::new();

        let mut admit = |ga: Ga,
                         result: &mut Vec<Ga>,
                         queue: &mut VecDeque<Ga>,
                         seen: &mut HashSet<Ga>| {
            if seen.insert(ga.clone()) {
                result.push(ga.clone());
                queue.push_back(ga);
            }
        };

        for seed in seeds {
            if self.tree.contains(seed) {
                admit(seed.clone(), &mut result, &mut queue, &mut seen);
            } else {
                tracing::debug!(seed = %seed, "seed not in tree, skipping");
            }
        }

        while let Some(ga) = queue.pop_front() {
            let module = self.tree.require(&ga)?;

            if let Some(parent) = self.tree.declared_parent(module) {
                admit(parent.ga(), &mut result, &mut queue, &mut seen);
            }
            if let Some(linker) = self.tree.linking_parent(&module.path) {
                admit(linker.ga(), &mut result, &mut queue, &mut seen);
            }

            for profile in module.active_profiles(self.resolver.selection()) {
                for dep in &profile.dependencies {
                    let target = self.resolver.dependency_ga(dep)?;
                    if self.tree.contains(&target) {
                        admit(target, &mut result, &mut queue, &mut seen);
                    }
                }
                for dep in profile.import_dependencies() {
                    let target = self.resolver.dependency_ga(dep)?;
                    if self.tree.contains(&target) {
                        admit(target, &mut result, &mut queue, &mut seen);
                    }
                }
                for plugin in &profile.plugins {
                    let target = self.resolver.plugin_ga(plugin)?;
                    if self.tree.contains(&target) {
                        admit(target, &mut result, &mut queue, &mut seen);
                    }
                }
            }
        }
        Ok(result)
    }

    /// All known coordinates minus the given set, in stable first-seen
    /// order
    pub fn complement(&self, set: &[Ga]) -> Vec<Ga> {
        let excluded: HashSet<&Ga> = set.iter().collect();
        self.tree
            .gas()
            .into_iter()
            .filter(|ga| !excluded.contains(ga))
            .collect()
    }

    /// Every resolved coordinate the tree references that matches the
    /// wildcard set: parents, dependencies, import-scoped managed
    /// dependencies, plugins and their nested dependencies, managed
    /// plugins, and extensions. Sorted and deduplicated.
    pub fn filter_dependencies(&self, wildcards: &WildcardSet) -> Result<Vec<Ga>> {
        let mut matched: BTreeSet<Ga> = BTreeSet::new();
        let mut keep = |ga: Ga, matched: &mut BTreeSet<Ga>| {
            if wildcards.matches(&ga) {
                matched.insert(ga);
            }
        };

        for module in self.tree.modules() {
            if let Some(parent) = &module.parent {
                let ga = Ga::new(
                    self.resolver.resolve(&parent.group_id)?,
                    self.resolver.resolve(&parent.artifact_id)?,
                );
                keep(ga, &mut matched);
            }
            for profile in module.active_profiles(self.resolver.selection()) {
                for dep in &profile.dependencies {
                    keep(self.resolver.dependency_ga(dep)?, &mut matched);
                }
                for dep in profile.import_dependencies() {
                    keep(self.resolver.dependency_ga(dep)?, &mut matched);
                }
                for plugin in profile.plugins.iter().chain(&profile.plugin_management) {
                    keep(self.resolver.plugin_ga(plugin)?, &mut matched);
                    for dep in &plugin.dependencies {
                        keep(self.resolver.dependency_ga(dep)?, &mut matched);
                    }
                }
                for ext in &profile.extensions {
                    keep(self.resolver.extension_ga(ext)?, &mut matched);
                }
            }
        }
        Ok(matched.into_iter().collect())
    }

    /// Dependency declarations of a module and its declared-parent chain,
    /// resolved, first declaration per coordinate wins
    pub fn collect_own_dependencies(&self, ga: &Ga) -> Result<Vec<Gav>> {
        let module = self.tree.require(ga)?;
        let mut out: Vec<Gav> = Vec::new();
        let mut seen: HashSet<Ga> = HashSet::new();
        self.own_dependencies_into(module, &mut out, &mut seen)?;
        Ok(out)
    }

    /// Like [`Self::collect_own_dependencies`], but additionally walking
    /// into each dependency's own in-tree module
    pub fn collect_transitive_dependencies(&self, ga: &Ga) -> Result<Vec<Gav>> {
        let mut out: Vec<Gav> = Vec::new();
        let mut seen: HashSet<Ga> = HashSet::new();
        let mut visited_modules: HashSet<Ga> = HashSet::new();
        self.transitive_into(ga, &mut out, &mut seen, &mut visited_modules)?;
        Ok(out)
    }

    fn own_dependencies_into(
        &self,
        module: &Module,
        out: &mut Vec<Gav>,
        seen: &mut HashSet<Ga>,
    ) -> Result<()> {
        let mut current = Some(module);
        while let Some(m) = current {
            for profile in m.active_profiles(self.resolver.selection()) {
                for dep in &profile.dependencies {
                    let gav = self.resolver.dependency_gav(dep)?;
                    if seen.insert(gav.ga.clone()) {
                        out.push(gav);
                    }
                }
            }
            current = self.tree.declared_parent(m);
        }
        Ok(())
    }

    fn transitive_into(
        &self,
        ga: &Ga,
        out: &mut Vec<Gav>,
        seen: &mut HashSet<Ga>,
        visited_modules: &mut HashSet<Ga>,
    ) -> Result<()> {
        if !visited_modules.insert(ga.clone()) {
            return Ok(());
        }
        let module = self.tree.require(ga)?;
        let before = out.len();
        self.own_dependencies_into(module, out, seen)?;
        let added: Vec<Ga> = out[before..].iter().map(|gav| gav.ga.clone()).collect();
        for dep_ga in added {
            if self.tree.contains(&dep_ga) {
                self.transitive_into(&dep_ga, out, seen, visited_modules)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_tree(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (path, text) in files {
            let full = dir.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, text).unwrap();
        }
        dir
    }

    fn ga(artifact: &str) -> Ga {
        Ga::new("org.example", artifact)
    }

    /// root links core, api, util, extras; api depends on core; extras
    /// depends on api; util is independent
    fn fixture() -> (TempDir, SourceTree) {
        let root = r#"<project>
  <groupId>org.example</groupId>
  <artifactId>root</artifactId>
  <version>1.0.0</version>
  <modules>
    <module>core</module>
    <module>api</module>
    <module>util</module>
    <module>extras</module>
  </modules>
</project>
"#;
        let core = r#"<project>
  <parent>
    <groupId>org.example</groupId>
    <artifactId>root</artifactId>
    <version>1.0.0</version>
  </parent>
  <artifactId>core</artifactId>
</project>
"#;
        let api = r#"<project>
  <parent>
    <groupId>org.example</groupId>
    <artifactId>root</artifactId>
    <version>1.0.0</version>
  </parent>
  <artifactId>api</artifactId>
  <dependencies>
    <dependency>
      <groupId>org.example</groupId>
      <artifactId>core</artifactId>
      <version>${project.version}</version>
    </dependency>
    <dependency>
      <groupId>com.vendor</groupId>
      <artifactId>outside</artifactId>
      <version>3.0</version>
    </dependency>
  </dependencies>
</project>
"#;
        let util = r#"<project>
  <parent>
    <groupId>org.example</groupId>
    <artifactId>root</artifactId>
    <version>1.0.0</version>
  </parent>
  <artifactId>util</artifactId>
</project>
"#;
        let extras = r#"<project>
  <parent>
    <groupId>org.example</groupId>
    <artifactId>root</artifactId>
    <version>1.0.0</version>
  </parent>
  <artifactId>extras</artifactId>
  <dependencies>
    <dependency>
      <groupId>org.example</groupId>
      <artifactId>api</artifactId>
      <version>1.0.0</version>
    </dependency>
  </dependencies>
</project>
"#;
        let dir = write_tree(&[
            ("pom.xml", root),
            ("core/pom.xml", core),
            ("api/pom.xml", api),
            ("util/pom.xml", util),
            ("extras/pom.xml", extras),
        ]);
        let tree = SourceTree::load(dir.path(), &ProfileSelection::none()).unwrap();
        (dir, tree)
    }

    #[test]
    fn test_required_closure_follows_parents_and_dependencies() {
        let (_dir, tree) = fixture();
        let engine = ClosureEngine::new(&tree, ProfileSelection::none());
        let required = engine.required_modules(&[ga("api")]).unwrap();
        assert!(required.contains(&ga("api")));
        assert!(required.contains(&ga("root")), "declared parent");
        assert!(required.contains(&ga("core")), "dependency target");
        assert!(!required.contains(&ga("extras")));
        assert!(!required.contains(&ga("util")));
        // first-seen order starts at the seed
        assert_eq!(required[0], ga("api"));
    }

    #[test]
    fn test_required_closure_is_monotone() {
        let (_dir, tree) = fixture();
        let engine = ClosureEngine::new(&tree, ProfileSelection::none());
        let small = engine.required_modules(&[ga("core")]).unwrap();
        let large = engine.required_modules(&[ga("core"), ga("extras")]).unwrap();
        for needed in &small {
            assert!(large.contains(needed));
        }
    }

    #[test]
    fn test_complement_preserves_arena_order() {
        let (_dir, tree) = fixture();
        let engine = ClosureEngine::new(&tree, ProfileSelection::none());
        let required = engine.required_modules(&[ga("api")]).unwrap();
        let rest = engine.complement(&required);
        assert_eq!(rest, vec![ga("util"), ga("extras")]);
    }

    #[test]
    fn test_filter_dependencies_matches_wildcards() {
        let (_dir, tree) = fixture();
        let engine = ClosureEngine::new(&tree, ProfileSelection::none());
        let set = WildcardSet::parse("com.vendor:*").unwrap();
        let hits = engine.filter_dependencies(&set).unwrap();
        assert_eq!(hits, vec![Ga::new("com.vendor", "outside")]);
    }

    #[test]
    fn test_collect_own_and_transitive() {
        let (_dir, tree) = fixture();
        let engine = ClosureEngine::new(&tree, ProfileSelection::none());
        let own = engine.collect_own_dependencies(&ga("extras")).unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].ga, ga("api"));

        let transitive = engine
            .collect_transitive_dependencies(&ga("extras"))
            .unwrap();
        let gas: Vec<&Ga> = transitive.iter().map(|g| &g.ga).collect();
        assert!(gas.contains(&&ga("api")));
        assert!(gas.contains(&&ga("core")), "reached through api's module");
        assert!(gas.contains(&&Ga::new("com.vendor", "outside")));
    }
}
