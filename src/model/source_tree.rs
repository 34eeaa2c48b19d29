//! The immutable module graph
//!
//! Built once by recursively parsing from a root manifest, then only
//! queried. Every "edit" computes pending edits against this snapshot and
//! applies them to files; callers re-parse for a consistent new tree.

use super::{Module, ProfileSelection};
use crate::coords::Ga;
use crate::parse;
use crate::{PomforgeError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Default manifest file name inside a module directory
pub const DEFAULT_MANIFEST_NAME: &str = "pom.xml";

/// The full module graph, indexed by file path and by coordinate identity
#[derive(Debug)]
pub struct SourceTree {
    root_dir: PathBuf,
    manifest_name: String,
    /// Arena in first-seen depth-first order; index 0 is the root module
    modules: Vec<Module>,
    by_path: HashMap<String, usize>,
    by_ga: HashMap<Ga, usize>,
    /// Child path -> path of the module whose link list names it
    linked_by: HashMap<String, String>,
}

impl SourceTree {
    /// Parse the tree rooted at `root_dir/pom.xml`
    pub fn load(root_dir: impl AsRef<Path>, selection: &ProfileSelection) -> Result<Self> {
        Self::load_with(root_dir, DEFAULT_MANIFEST_NAME, selection)
    }

    /// Parse with a caller-chosen manifest file name
    pub fn load_with(
        root_dir: impl AsRef<Path>,
        manifest_name: &str,
        selection: &ProfileSelection,
    ) -> Result<Self> {
        let root_dir = root_dir.as_ref().to_path_buf();
        let build = parse::build_tree(&root_dir, manifest_name, selection)?;
        tracing::debug!(
            root = %root_dir.display(),
            modules = build.modules.len(),
            "parsed source tree"
        );
        Ok(Self {
            root_dir,
            manifest_name: manifest_name.to_string(),
            modules: build.modules,
            by_path: build.by_path,
            by_ga: build.by_ga,
            linked_by: build.linked_by,
        })
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn manifest_name(&self) -> &str {
        &self.manifest_name
    }

    /// The module the tree was parsed from
    pub fn root(&self) -> &Module {
        &self.modules[0]
    }

    /// All modules in first-seen order
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn by_path(&self, path: &str) -> Option<&Module> {
        self.by_path.get(path).map(|&i| &self.modules[i])
    }

    pub fn by_ga(&self, ga: &Ga) -> Option<&Module> {
        self.by_ga.get(ga).map(|&i| &self.modules[i])
    }

    pub fn contains(&self, ga: &Ga) -> bool {
        self.by_ga.contains_key(ga)
    }

    /// Like [`Self::by_ga`] but failing with [`PomforgeError::ModuleNotFound`]
    pub fn require(&self, ga: &Ga) -> Result<&Module> {
        self.by_ga(ga)
            .ok_or_else(|| PomforgeError::ModuleNotFound(ga.to_string()))
    }

    /// All coordinate identities in first-seen order
    pub fn gas(&self) -> Vec<Ga> {
        self.modules.iter().map(Module::ga).collect()
    }

    /// The module named in this module's parent block, when it is in-tree
    pub fn declared_parent(&self, module: &Module) -> Option<&Module> {
        module.parent.as_ref().and_then(|p| self.by_ga(&p.ga()))
    }

    /// The module whose link list actually names this path; may differ
    /// from the declared parent
    pub fn linking_parent(&self, path: &str) -> Option<&Module> {
        self.linked_by.get(path).and_then(|p| self.by_path(p))
    }

    /// Absolute path of a module's manifest file
    pub fn file_path(&self, module: &Module) -> PathBuf {
        self.root_dir.join(&module.path)
    }
}
