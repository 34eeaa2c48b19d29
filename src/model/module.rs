//! One manifest's frozen model
//!
//! A Module is the immutable result of parsing a single manifest file: its
//! own coordinates, the declared parent, and the profile-scoped declaration
//! sets. Construction happens in the parser's two-phase freeze; nothing
//! here is mutated afterwards.

use super::{Profile, ProfileSelection};
use crate::coords::{Expression, Ga};

/// The declared parent block of a manifest
#[derive(Debug, Clone)]
pub struct ParentRef {
    /// Owned by the parent's coordinates, not this module's
    pub group_id: Expression,
    pub artifact_id: Expression,
    pub version: Expression,
    pub relative_path: Option<String>,
}

impl ParentRef {
    /// The parent's identity by raw group/artifact text
    pub fn ga(&self) -> Ga {
        Ga::new(self.group_id.raw(), self.artifact_id.raw())
    }
}

/// One manifest file, parsed and frozen
#[derive(Debug, Clone)]
pub struct Module {
    /// Root-relative, `/`-separated path of the manifest file
    pub path: String,

    /// Own group id; inherited from the parent block when the manifest
    /// declares none of its own
    pub group_id: Expression,
    pub artifact_id: Expression,

    /// Own version element, when present; None means inherited
    pub version: Option<Expression>,

    /// Whether the manifest declared its own groupId element
    pub own_group: bool,

    pub parent: Option<ParentRef>,

    /// profiles[0] is the always-present unconditioned profile
    pub profiles: Vec<Profile>,
}

impl Module {
    /// Identity by raw (unresolved) group/artifact text
    pub fn ga(&self) -> Ga {
        Ga::new(self.group_id.raw(), self.artifact_id.raw())
    }

    /// The unconditioned profile holding top-level declarations
    pub fn base_profile(&self) -> &Profile {
        &self.profiles[0]
    }

    /// The version expression governing this module: its own, or the
    /// declared parent's
    pub fn version_expr(&self) -> Option<&Expression> {
        self.version
            .as_ref()
            .or_else(|| self.parent.as_ref().map(|p| &p.version))
    }

    /// Whether the version is declared on the module itself rather than
    /// merely inherited: an own version element exists and differs from
    /// the parent's version text (or there is no parent)
    pub fn has_explicit_version(&self) -> bool {
        match (&self.version, &self.parent) {
            (Some(own), Some(parent)) => own.raw() != parent.version.raw(),
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// Profiles passing the selection, in declaration order
    pub fn active_profiles<'a>(
        &'a self,
        selection: &'a ProfileSelection,
    ) -> impl Iterator<Item = &'a Profile> {
        self.profiles
            .iter()
            .filter(|p| selection.is_active(p.id.as_deref()))
    }
}
