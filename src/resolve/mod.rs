//! Placeholder resolution
//!
//! Expands `${...}` expressions against the module scope that owns them:
//! built-in coordinate names come straight from the owner's own GAV, other
//! names search the owner's profiles in reverse declaration order and then
//! climb the declared-parent chain. Results are memoized per resolver, and
//! a resolver is bound to one (tree, profile-selection) pair — the
//! selection is a value, so two resolvers over the same selection agree.
//!
//! A self-referential property chain is detected by an explicit
//! in-progress stack and fails instead of recursing without bound.

use crate::coords::{Expression, Ga, Gav};
use crate::model::{
    DependencyDecl, ExtensionDecl, Module, PluginDecl, ProfileSelection, SourceTree,
    DEFAULT_PLUGIN_GROUP,
};
use crate::{PomforgeError, Result};
use std::cell::RefCell;
use std::collections::HashMap;

/// Where a property definition was found: the defining module's path and
/// the profile id carrying the definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySite {
    pub module_path: String,
    pub profile_id: Option<String>,
}

/// Memoizing expression resolver bound to one tree and one
/// active-profile selection
pub struct Resolver<'t> {
    tree: &'t SourceTree,
    selection: ProfileSelection,
    cache: RefCell<HashMap<Expression, String>>,
}

impl<'t> Resolver<'t> {
    pub fn new(tree: &'t SourceTree, selection: ProfileSelection) -> Self {
        Self {
            tree,
            selection,
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn selection(&self) -> &ProfileSelection {
        &self.selection
    }

    /// Expand an expression to its literal value
    pub fn resolve(&self, expr: &Expression) -> Result<String> {
        let mut in_progress = Vec::new();
        self.resolve_inner(expr, &mut in_progress)
    }

    fn resolve_inner(
        &self,
        expr: &Expression,
        in_progress: &mut Vec<(Ga, String)>,
    ) -> Result<String> {
        if expr.is_constant() {
            return Ok(expr.raw().to_string());
        }
        if let Some(hit) = self.cache.borrow().get(expr) {
            return Ok(hit.clone());
        }

        let owner = self.tree.require(expr.owner())?;
        let mut out = String::new();
        let mut rest = expr.raw();
        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            rest = &rest[start + 2..];
            let end = rest.find('}').ok_or_else(|| PomforgeError::Parse {
                path: owner.path.clone(),
                message: format!("unterminated placeholder in '{}'", expr.raw()),
            })?;
            let name = &rest[..end];
            rest = &rest[end + 1..];
            let value = self.property_value(owner, name, in_progress)?;
            out.push_str(&value);
        }
        out.push_str(rest);

        self.cache.borrow_mut().insert(expr.clone(), out.clone());
        Ok(out)
    }

    /// Resolve one property name in a module's scope
    pub fn resolve_property(&self, module: &Module, name: &str) -> Result<String> {
        let mut in_progress = Vec::new();
        self.property_value(module, name, &mut in_progress)
    }

    fn property_value(
        &self,
        module: &Module,
        name: &str,
        in_progress: &mut Vec<(Ga, String)>,
    ) -> Result<String> {
        // the three built-ins resolve from the module's own coordinates
        match name {
            "project.groupId" => return self.resolve_inner(&module.group_id, in_progress),
            "project.artifactId" => return self.resolve_inner(&module.artifact_id, in_progress),
            "project.version" => {
                let version = module.version_expr().ok_or_else(|| {
                    PomforgeError::UnresolvedProperty {
                        name: name.to_string(),
                        origin: module.ga().to_string(),
                    }
                })?;
                return self.resolve_inner(version, in_progress);
            }
            _ => {}
        }

        let key = (module.ga(), name.to_string());
        if in_progress.contains(&key) {
            let mut chain: Vec<String> = in_progress
                .iter()
                .map(|(ga, n)| format!("{}#{}", ga, n))
                .collect();
            chain.push(format!("{}#{}", key.0, key.1));
            return Err(PomforgeError::PropertyCycle {
                chain: chain.join(" -> "),
            });
        }
        in_progress.push(key);
        let result = self.property_value_uncycled(module, name, in_progress);
        in_progress.pop();
        result
    }

    fn property_value_uncycled(
        &self,
        module: &Module,
        name: &str,
        in_progress: &mut Vec<(Ga, String)>,
    ) -> Result<String> {
        // last declared matching active profile wins
        for profile in module.profiles.iter().rev() {
            if !self.selection.is_active(profile.id.as_deref()) {
                continue;
            }
            if let Some(value) = profile.properties.get(name) {
                return self.resolve_inner(value, in_progress);
            }
        }
        if let Some(parent) = self.tree.declared_parent(module) {
            return self.property_value(parent, name, in_progress);
        }
        Err(PomforgeError::UnresolvedProperty {
            name: name.to_string(),
            origin: module.ga().to_string(),
        })
    }

    /// Where a property is defined, climbing the same chain as resolution
    pub fn find_property_definition(&self, module: &Module, name: &str) -> Result<PropertySite> {
        let mut current = module;
        loop {
            for profile in current.profiles.iter().rev() {
                if !self.selection.is_active(profile.id.as_deref()) {
                    continue;
                }
                if profile.properties.contains_key(name) {
                    return Ok(PropertySite {
                        module_path: current.path.clone(),
                        profile_id: profile.id.clone(),
                    });
                }
            }
            match self.tree.declared_parent(current) {
                Some(parent) => current = parent,
                None => {
                    return Err(PomforgeError::UnresolvedProperty {
                        name: name.to_string(),
                        origin: module.ga().to_string(),
                    })
                }
            }
        }
    }

    /// A module's fully resolved coordinates
    pub fn resolve_gav(&self, module: &Module) -> Result<Gav> {
        let group = self.resolve(&module.group_id)?;
        let artifact = self.resolve(&module.artifact_id)?;
        let version = match module.version_expr() {
            Some(expr) => Some(self.resolve(expr)?),
            None => None,
        };
        Ok(Gav::new(Ga::new(group, artifact), version))
    }

    /// Resolved identity of a dependency declaration
    pub fn dependency_ga(&self, dep: &DependencyDecl) -> Result<Ga> {
        Ok(Ga::new(
            self.resolve(&dep.group_id)?,
            self.resolve(&dep.artifact_id)?,
        ))
    }

    /// Resolved identity of a dependency with its declared version
    pub fn dependency_gav(&self, dep: &DependencyDecl) -> Result<Gav> {
        let version = match &dep.version {
            Some(expr) => Some(self.resolve(expr)?),
            None => None,
        };
        Ok(Gav::new(self.dependency_ga(dep)?, version))
    }

    /// Resolved identity of a plugin declaration, defaulting the group
    pub fn plugin_ga(&self, plugin: &PluginDecl) -> Result<Ga> {
        let group = match &plugin.group_id {
            Some(expr) => self.resolve(expr)?,
            None => DEFAULT_PLUGIN_GROUP.to_string(),
        };
        Ok(Ga::new(group, self.resolve(&plugin.artifact_id)?))
    }

    /// Resolved identity of an extension declaration
    pub fn extension_ga(&self, ext: &ExtensionDecl) -> Result<Ga> {
        Ok(Ga::new(
            self.resolve(&ext.group_id)?,
            self.resolve(&ext.artifact_id)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProfileSelection;
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

    const ROOT: &str = r#"<project>
  <groupId>org.example</groupId>
  <artifactId>root</artifactId>
  <version>1.0.0</version>
  <modules>
    <module>mid</module>
  </modules>
  <properties>
    <answer>42</answer>
    <greeting>hello ${answer}</greeting>
  </properties>
  <profiles>
    <profile>
      <id>loud</id>
      <properties>
        <answer>FORTY-TWO</answer>
      </properties>
    </profile>
  </profiles>
</project>
"#;

    const MID: &str = r#"<project>
  <parent>
    <groupId>org.example</groupId>
    <artifactId>root</artifactId>
    <version>1.0.0</version>
  </parent>
  <artifactId>mid</artifactId>
  <modules>
    <module>leaf</module>
  </modules>
</project>
"#;

    const LEAF: &str = r#"<project>
  <parent>
    <groupId>org.example</groupId>
    <artifactId>mid</artifactId>
    <version>1.0.0</version>
  </parent>
  <artifactId>leaf</artifactId>
  <properties>
    <label>${greeting}</label>
  </properties>
</project>
"#;

    fn leaf_tree() -> (TempDir, SourceTree) {
        let dir = write_tree(&[
            ("pom.xml", ROOT),
            ("mid/pom.xml", MID),
            ("mid/leaf/pom.xml", LEAF),
        ]);
        let tree = SourceTree::load(dir.path(), &ProfileSelection::none()).unwrap();
        (dir, tree)
    }

    #[test]
    fn test_builtins_resolve_from_own_gav() {
        let (_dir, tree) = leaf_tree();
        let resolver = Resolver::new(&tree, ProfileSelection::none());
        let leaf = tree.by_ga(&Ga::new("org.example", "leaf")).unwrap();
        assert_eq!(
            resolver.resolve_property(leaf, "project.version").unwrap(),
            "1.0.0"
        );
        assert_eq!(
            resolver.resolve_property(leaf, "project.artifactId").unwrap(),
            "leaf"
        );
    }

    #[test]
    fn test_property_climbs_intermediate_modules() {
        let (_dir, tree) = leaf_tree();
        let resolver = Resolver::new(&tree, ProfileSelection::none());
        let leaf = tree.by_ga(&Ga::new("org.example", "leaf")).unwrap();
        // greeting is defined two levels up and itself references answer
        let label = &leaf.base_profile().properties["label"];
        assert_eq!(resolver.resolve(label).unwrap(), "hello 42");
    }

    #[test]
    fn test_profile_overrides_in_reverse_order() {
        let (_dir, tree) = leaf_tree();
        let resolver = Resolver::new(&tree, ProfileSelection::parse("loud"));
        let leaf = tree.by_ga(&Ga::new("org.example", "leaf")).unwrap();
        let label = &leaf.base_profile().properties["label"];
        assert_eq!(resolver.resolve(label).unwrap(), "hello FORTY-TWO");
    }

    #[test]
    fn test_unresolved_property_is_fatal_and_named() {
        let (_dir, tree) = leaf_tree();
        let resolver = Resolver::new(&tree, ProfileSelection::none());
        let leaf = tree.by_ga(&Ga::new("org.example", "leaf")).unwrap();
        let bogus = Expression::new("${nope}", leaf.ga());
        let err = resolver.resolve(&bogus).unwrap_err();
        match err {
            PomforgeError::UnresolvedProperty { name, .. } => assert_eq!(name, "nope"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_self_referential_chain_fails() {
        let dir = write_tree(&[(
            "pom.xml",
            r#"<project>
  <groupId>g</groupId><artifactId>a</artifactId><version>1</version>
  <properties>
    <x>${y}</x>
    <y>${x}</y>
  </properties>
</project>
"#,
        )]);
        let tree = SourceTree::load(dir.path(), &ProfileSelection::none()).unwrap();
        let resolver = Resolver::new(&tree, ProfileSelection::none());
        let module = tree.root();
        let expr = Expression::new("${x}", module.ga());
        assert!(matches!(
            resolver.resolve(&expr),
            Err(PomforgeError::PropertyCycle { .. })
        ));
    }

    #[test]
    fn test_find_property_definition_site() {
        let (_dir, tree) = leaf_tree();
        let resolver = Resolver::new(&tree, ProfileSelection::none());
        let leaf = tree.by_ga(&Ga::new("org.example", "leaf")).unwrap();
        let site = resolver.find_property_definition(leaf, "answer").unwrap();
        assert_eq!(site.module_path, "pom.xml");
        assert_eq!(site.profile_id, None);
    }
}
