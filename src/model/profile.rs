//! Profile-scoped declaration collections
//!
//! Every module carries one unconditioned profile (id = None) holding its
//! top-level declarations, followed by the named profiles in declaration
//! order. Property lookup across profiles runs in reverse declaration order:
//! the last matching active profile wins.

use crate::coords::{Expression, Ga};
use std::collections::HashMap;

/// Conventional group id assumed for a plugin that declares none
pub const DEFAULT_PLUGIN_GROUP: &str = "org.apache.maven.plugins";

/// A dependency declaration, direct or managed
#[derive(Debug, Clone)]
pub struct DependencyDecl {
    pub group_id: Expression,
    pub artifact_id: Expression,
    pub version: Option<Expression>,
    pub dep_type: Option<String>,
    pub classifier: Option<String>,
    pub scope: Option<String>,
    /// Exclusions as literal GA pairs
    pub exclusions: Vec<Ga>,
}

impl DependencyDecl {
    /// True for a managed entry of type "pom" and scope "import"
    pub fn is_import(&self) -> bool {
        self.dep_type.as_deref() == Some("pom") && self.scope.as_deref() == Some("import")
    }
}

/// A plugin declaration, direct or managed
#[derive(Debug, Clone)]
pub struct PluginDecl {
    /// Absent means the conventional plugin group applies
    pub group_id: Option<Expression>,
    pub artifact_id: Expression,
    pub version: Option<Expression>,
    /// The plugin's own nested dependency list
    pub dependencies: Vec<DependencyDecl>,
}

/// A build extension declaration
#[derive(Debug, Clone)]
pub struct ExtensionDecl {
    pub group_id: Expression,
    pub artifact_id: Expression,
    pub version: Option<Expression>,
}

/// One profile's declarations
#[derive(Debug, Clone, Default)]
pub struct Profile {
    /// None for the always-present unconditioned profile
    pub id: Option<String>,

    /// Child module links in declaration order
    pub modules: Vec<String>,

    pub dependencies: Vec<DependencyDecl>,
    pub dependency_management: Vec<DependencyDecl>,
    pub plugins: Vec<PluginDecl>,
    pub plugin_management: Vec<PluginDecl>,
    pub extensions: Vec<ExtensionDecl>,

    /// Property name to value; duplicate keys are rejected at parse time
    pub properties: HashMap<String, Expression>,
}

impl Profile {
    pub fn unconditioned() -> Self {
        Self::default()
    }

    /// Managed entries that pull in another manifest's managed set
    pub fn import_dependencies(&self) -> impl Iterator<Item = &DependencyDecl> {
        self.dependency_management.iter().filter(|d| d.is_import())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(raw: &str) -> Expression {
        Expression::new(raw, Ga::new("g", "a"))
    }

    #[test]
    fn test_import_scope_detection() {
        let dep = DependencyDecl {
            group_id: expr("g"),
            artifact_id: expr("bom"),
            version: Some(expr("1.0")),
            dep_type: Some("pom".to_string()),
            classifier: None,
            scope: Some("import".to_string()),
            exclusions: Vec::new(),
        };
        assert!(dep.is_import());

        let plain = DependencyDecl {
            dep_type: None,
            scope: None,
            ..dep.clone()
        };
        assert!(!plain.is_import());
    }
}
