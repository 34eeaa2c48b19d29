//! Single-manifest streaming parse
//!
//! One pass over quick-xml events per file, matching elements by local name
//! only. An element-name stack plus a stack of tagged binding-context
//! frames (dependency / plugin / extension / exclusion) classifies every
//! scalar by its ancestor context. Transient Raw* builders accumulate
//! strings during the pass and are frozen once into an immutable
//! [`Module`] at the end.

use crate::coords::{Expression, Ga};
use crate::model::{
    DependencyDecl, ExtensionDecl, Module, ParentRef, PluginDecl, Profile,
};
use crate::{PomforgeError, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;

#[derive(Debug, Default)]
struct RawModule {
    group: Option<String>,
    artifact: Option<String>,
    version: Option<String>,
    parent: Option<RawParent>,
    base: RawProfile,
    profiles: Vec<RawProfile>,
}

#[derive(Debug, Default)]
struct RawParent {
    group: Option<String>,
    artifact: Option<String>,
    version: Option<String>,
    relative_path: Option<String>,
}

#[derive(Debug, Default)]
struct RawProfile {
    id: Option<String>,
    modules: Vec<String>,
    dependencies: Vec<RawDep>,
    dependency_management: Vec<RawDep>,
    plugins: Vec<RawPlugin>,
    plugin_management: Vec<RawPlugin>,
    extensions: Vec<RawExtension>,
    properties: HashMap<String, String>,
}

#[derive(Debug, Default)]
struct RawDep {
    group: Option<String>,
    artifact: Option<String>,
    version: Option<String>,
    dep_type: Option<String>,
    classifier: Option<String>,
    scope: Option<String>,
    exclusions: Vec<Ga>,
}

#[derive(Debug, Default)]
struct RawPlugin {
    group: Option<String>,
    artifact: Option<String>,
    version: Option<String>,
    dependencies: Vec<RawDep>,
}

#[derive(Debug, Default)]
struct RawExtension {
    group: Option<String>,
    artifact: Option<String>,
    version: Option<String>,
}

/// Which profile a frame delivers into: the unconditioned one or a named
/// profile by index
#[derive(Debug, Clone, Copy)]
enum ProfileSlot {
    Base,
    Named(usize),
}

/// Where a finished dependency frame is delivered
#[derive(Debug, Clone, Copy)]
enum DepKind {
    Direct(ProfileSlot),
    Managed(ProfileSlot),
    /// Nested under an open plugin frame
    PluginNested,
}

/// Where a finished plugin frame is delivered
#[derive(Debug, Clone, Copy)]
enum PluginKind {
    Direct(ProfileSlot),
    Managed(ProfileSlot),
}

/// An open binding context
#[derive(Debug)]
enum Frame {
    Dependency {
        depth: usize,
        kind: DepKind,
        dep: RawDep,
    },
    Plugin {
        depth: usize,
        kind: PluginKind,
        plugin: RawPlugin,
    },
    Extension {
        depth: usize,
        slot: ProfileSlot,
        ext: RawExtension,
    },
    Exclusion {
        depth: usize,
        group: Option<String>,
        artifact: Option<String>,
    },
}

struct ManifestParser<'a> {
    path: &'a str,
    raw: RawModule,
    /// Local names of open elements, root included
    stack: Vec<String>,
    frames: Vec<Frame>,
    text: String,
    /// Non-zero while inside an ignored subtree
    skip_depth: usize,
}

/// Parse one manifest file's text into a frozen module
pub fn parse_manifest(text: &str, path: &str) -> Result<Module> {
    let mut reader = Reader::from_str(text);
    let mut parser = ManifestParser {
        path,
        raw: RawModule::default(),
        stack: Vec::new(),
        frames: Vec::new(),
        text: String::new(),
        skip_depth: 0,
    };

    loop {
        let event = reader.read_event().map_err(|e| PomforgeError::Parse {
            path: path.to_string(),
            message: format!("{} at byte {}", e, reader.buffer_position()),
        })?;
        match event {
            Event::Start(e) => {
                let name = local_name_of(e.name().as_ref());
                parser.on_start(name)?;
            }
            Event::Empty(e) => {
                let name = local_name_of(e.name().as_ref());
                parser.on_start(name.clone())?;
                parser.on_end()?;
            }
            Event::End(_) => parser.on_end()?,
            Event::Text(t) => {
                if parser.skip_depth == 0 {
                    let value = t.decode().map_err(|e| PomforgeError::Parse {
                        path: path.to_string(),
                        message: e.to_string(),
                    })?;
                    parser.text.push_str(&value);
                }
            }
            Event::CData(t) => {
                if parser.skip_depth == 0 {
                    parser.text.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Event::GeneralRef(t) => {
                if parser.skip_depth == 0 {
                    let raw = format!("&{};", String::from_utf8_lossy(&t));
                    parser.text.push_str(&xmlgrove::unescape_text(&raw));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    parser.freeze()
}

fn local_name_of(qname: &[u8]) -> String {
    let name = String::from_utf8_lossy(qname).into_owned();
    match name.rfind(':') {
        Some(idx) => name[idx + 1..].to_string(),
        None => name,
    }
}

impl ManifestParser<'_> {
    fn error(&self, message: impl Into<String>) -> PomforgeError {
        PomforgeError::Parse {
            path: self.path.to_string(),
            message: message.into(),
        }
    }

    /// Path of open element names relative to the enclosing profile (or to
    /// the root for top-level content), plus the profile slot
    fn profile_relative(&self) -> (ProfileSlot, &[String]) {
        if self.stack.len() >= 3 && self.stack[1] == "profiles" && self.stack[2] == "profile" {
            (ProfileSlot::Named(self.raw.profiles.len() - 1), &self.stack[3..])
        } else {
            (ProfileSlot::Base, &self.stack[1..])
        }
    }

    fn profile_mut(&mut self, slot: ProfileSlot) -> &mut RawProfile {
        match slot {
            ProfileSlot::Base => &mut self.raw.base,
            ProfileSlot::Named(i) => &mut self.raw.profiles[i],
        }
    }

    fn on_start(&mut self, name: String) -> Result<()> {
        if self.skip_depth > 0 {
            self.skip_depth += 1;
            return Ok(());
        }
        // configuration payloads are opaque to the model
        if name == "configuration" && !self.stack.is_empty() {
            self.skip_depth = 1;
            return Ok(());
        }

        let depth = self.stack.len() + 1;
        match name.as_str() {
            "parent" if self.stack.len() == 1 => {
                self.raw.parent = Some(RawParent::default());
            }
            "profile" if self.stack.len() == 2 && self.stack[1] == "profiles" => {
                self.raw.profiles.push(RawProfile::default());
            }
            "dependency" => {
                if let Some(kind) = self.classify_dependency() {
                    self.frames.push(Frame::Dependency {
                        depth,
                        kind,
                        dep: RawDep::default(),
                    });
                }
            }
            "plugin" => {
                if let Some(kind) = self.classify_plugin() {
                    self.frames.push(Frame::Plugin {
                        depth,
                        kind,
                        plugin: RawPlugin::default(),
                    });
                }
            }
            "extension" => {
                let (slot, rel) = self.profile_relative();
                if rel == ["build", "extensions"] {
                    self.frames.push(Frame::Extension {
                        depth,
                        slot,
                        ext: RawExtension::default(),
                    });
                }
            }
            "exclusion" => {
                let in_dep_exclusions = matches!(
                    self.frames.last(),
                    Some(Frame::Dependency { depth: d, .. })
                        if self.stack.len() == d + 1 && self.stack.last().map(String::as_str) == Some("exclusions")
                );
                if in_dep_exclusions {
                    self.frames.push(Frame::Exclusion {
                        depth,
                        group: None,
                        artifact: None,
                    });
                }
            }
            _ => {}
        }

        self.stack.push(name);
        self.text.clear();
        Ok(())
    }

    /// Decide what an opening `<dependency>` belongs to, from its ancestors
    fn classify_dependency(&self) -> Option<DepKind> {
        if let Some(Frame::Plugin { depth, .. }) = self.frames.last() {
            if self.stack.len() == depth + 1
                && self.stack.last().map(String::as_str) == Some("dependencies")
            {
                return Some(DepKind::PluginNested);
            }
        }
        let (slot, rel) = self.profile_relative();
        match rel {
            r if r == ["dependencies"] => Some(DepKind::Direct(slot)),
            r if r == ["dependencyManagement", "dependencies"] => Some(DepKind::Managed(slot)),
            _ => None,
        }
    }

    fn classify_plugin(&self) -> Option<PluginKind> {
        let (slot, rel) = self.profile_relative();
        match rel {
            r if r == ["build", "plugins"] => Some(PluginKind::Direct(slot)),
            r if r == ["build", "pluginManagement", "plugins"] => Some(PluginKind::Managed(slot)),
            _ => None,
        }
    }

    fn on_end(&mut self) -> Result<()> {
        if self.skip_depth > 0 {
            self.skip_depth -= 1;
            return Ok(());
        }
        let depth = self.stack.len();
        let name = self
            .stack
            .last()
            .cloned()
            .ok_or_else(|| self.error("unbalanced closing tag"))?;
        let value = self.text.trim().to_string();

        if self.frame_closes_here(depth, &name) {
            self.finish_frame()?;
        } else {
            self.dispatch_scalar(depth, &name, value)?;
        }

        self.stack.pop();
        self.text.clear();
        Ok(())
    }

    fn frame_closes_here(&self, depth: usize, name: &str) -> bool {
        match self.frames.last() {
            Some(Frame::Dependency { depth: d, .. }) => *d == depth && name == "dependency",
            Some(Frame::Plugin { depth: d, .. }) => *d == depth && name == "plugin",
            Some(Frame::Extension { depth: d, .. }) => *d == depth && name == "extension",
            Some(Frame::Exclusion { depth: d, .. }) => *d == depth && name == "exclusion",
            None => false,
        }
    }

    fn finish_frame(&mut self) -> Result<()> {
        match self.frames.pop().expect("frame checked by caller") {
            Frame::Dependency { kind, dep, .. } => match kind {
                DepKind::Direct(slot) => self.profile_mut(slot).dependencies.push(dep),
                DepKind::Managed(slot) => self.profile_mut(slot).dependency_management.push(dep),
                DepKind::PluginNested => match self.frames.last_mut() {
                    Some(Frame::Plugin { plugin, .. }) => plugin.dependencies.push(dep),
                    _ => return Err(self.error("dependency frame lost its plugin")),
                },
            },
            Frame::Plugin { kind, plugin, .. } => match kind {
                PluginKind::Direct(slot) => self.profile_mut(slot).plugins.push(plugin),
                PluginKind::Managed(slot) => self.profile_mut(slot).plugin_management.push(plugin),
            },
            Frame::Extension { slot, ext, .. } => self.profile_mut(slot).extensions.push(ext),
            Frame::Exclusion { group, artifact, .. } => {
                if let (Some(group), Some(artifact)) = (group, artifact) {
                    match self.frames.last_mut() {
                        Some(Frame::Dependency { dep, .. }) => {
                            dep.exclusions.push(Ga::new(group, artifact))
                        }
                        _ => return Err(self.error("exclusion frame lost its dependency")),
                    }
                } else {
                    tracing::debug!(path = self.path, "ignoring incomplete exclusion");
                }
            }
        }
        Ok(())
    }

    fn dispatch_scalar(&mut self, depth: usize, name: &str, value: String) -> Result<()> {
        // innermost frame field?
        if let Some(frame) = self.frames.last_mut() {
            let assigned = match frame {
                Frame::Dependency { depth: d, dep, .. } if depth == *d + 1 => {
                    match name {
                        "groupId" => dep.group = Some(value.clone()),
                        "artifactId" => dep.artifact = Some(value.clone()),
                        "version" => dep.version = Some(value.clone()),
                        "type" => dep.dep_type = Some(value.clone()),
                        "classifier" => dep.classifier = Some(value.clone()),
                        "scope" => dep.scope = Some(value.clone()),
                        _ => {}
                    }
                    true
                }
                Frame::Plugin { depth: d, plugin, .. } if depth == *d + 1 => {
                    match name {
                        "groupId" => plugin.group = Some(value.clone()),
                        "artifactId" => plugin.artifact = Some(value.clone()),
                        "version" => plugin.version = Some(value.clone()),
                        _ => {}
                    }
                    true
                }
                Frame::Extension { depth: d, ext, .. } if depth == *d + 1 => {
                    match name {
                        "groupId" => ext.group = Some(value.clone()),
                        "artifactId" => ext.artifact = Some(value.clone()),
                        "version" => ext.version = Some(value.clone()),
                        _ => {}
                    }
                    true
                }
                Frame::Exclusion {
                    depth: d,
                    group,
                    artifact,
                } if depth == *d + 1 => {
                    match name {
                        "groupId" => *group = Some(value.clone()),
                        "artifactId" => *artifact = Some(value.clone()),
                        _ => {}
                    }
                    true
                }
                _ => false,
            };
            if assigned {
                return Ok(());
            }
        }

        // parent block scalars
        if depth == 3 && self.stack[1] == "parent" {
            if let Some(parent) = self.raw.parent.as_mut() {
                match name {
                    "groupId" => parent.group = Some(value),
                    "artifactId" => parent.artifact = Some(value),
                    "version" => parent.version = Some(value),
                    "relativePath" => parent.relative_path = Some(value),
                    _ => {}
                }
            }
            return Ok(());
        }

        // the module's own coordinates
        if depth == 2 {
            match name {
                "groupId" => self.raw.group = Some(value),
                "artifactId" => self.raw.artifact = Some(value),
                "version" => self.raw.version = Some(value),
                _ => {}
            }
            return Ok(());
        }

        // properties: the element name is the key
        if depth >= 3 && self.stack[depth - 2] == "properties" {
            let (slot, rel) = self.profile_relative();
            if rel.len() == 2 && rel[0] == "properties" {
                let key = name.to_string();
                let path = self.path.to_string();
                let profile = self.profile_mut(slot);
                if profile.properties.contains_key(&key) {
                    return Err(PomforgeError::Parse {
                        path,
                        message: format!("duplicate property '{}' within one profile", key),
                    });
                }
                profile.properties.insert(key, value);
            }
            return Ok(());
        }

        // module links
        if name == "module" {
            let (slot, rel) = self.profile_relative();
            if rel == ["modules", "module"] && !value.is_empty() {
                self.profile_mut(slot).modules.push(value);
            }
            return Ok(());
        }

        // profile ids
        if name == "id" {
            let (slot, rel) = self.profile_relative();
            if rel == ["id"] {
                if let ProfileSlot::Named(_) = slot {
                    self.profile_mut(slot).id = Some(value);
                }
            }
        }

        Ok(())
    }

    /// Convert the accumulated raw structures into a frozen module
    fn freeze(self) -> Result<Module> {
        let ManifestParser { path, raw, .. } = self;
        let err = |message: String| PomforgeError::Parse {
            path: path.to_string(),
            message,
        };

        let artifact = raw
            .artifact
            .ok_or_else(|| err("missing artifactId".to_string()))?;

        let parent = match raw.parent {
            Some(p) => {
                let group = p
                    .group
                    .ok_or_else(|| err("parent block missing groupId".to_string()))?;
                let artifact = p
                    .artifact
                    .ok_or_else(|| err("parent block missing artifactId".to_string()))?;
                let version = p
                    .version
                    .ok_or_else(|| err("parent block missing version".to_string()))?;
                let parent_ga = Ga::new(group.clone(), artifact.clone());
                Some(ParentRef {
                    group_id: Expression::new(group, parent_ga.clone()),
                    artifact_id: Expression::new(artifact, parent_ga.clone()),
                    version: Expression::new(version, parent_ga),
                    relative_path: p.relative_path,
                })
            }
            None => None,
        };

        let own_group = raw.group.is_some();
        let group = raw
            .group
            .or_else(|| parent.as_ref().map(|p| p.group_id.raw().to_string()))
            .ok_or_else(|| err("missing groupId and no parent to inherit from".to_string()))?;
        let ga = Ga::new(group.clone(), artifact.clone());

        let mut profiles = Vec::with_capacity(raw.profiles.len() + 1);
        profiles.push(freeze_profile(raw.base, &ga));
        for profile in raw.profiles {
            profiles.push(freeze_profile(profile, &ga));
        }

        Ok(Module {
            path: path.to_string(),
            group_id: Expression::new(group, ga.clone()),
            artifact_id: Expression::new(artifact, ga.clone()),
            version: raw.version.map(|v| Expression::new(v, ga)),
            own_group,
            parent,
            profiles,
        })
    }
}

fn freeze_profile(raw: RawProfile, owner: &Ga) -> Profile {
    Profile {
        id: raw.id,
        modules: raw.modules,
        dependencies: raw
            .dependencies
            .into_iter()
            .map(|d| freeze_dep(d, owner))
            .collect(),
        dependency_management: raw
            .dependency_management
            .into_iter()
            .map(|d| freeze_dep(d, owner))
            .collect(),
        plugins: raw
            .plugins
            .into_iter()
            .map(|p| freeze_plugin(p, owner))
            .collect(),
        plugin_management: raw
            .plugin_management
            .into_iter()
            .map(|p| freeze_plugin(p, owner))
            .collect(),
        extensions: raw
            .extensions
            .into_iter()
            .map(|e| ExtensionDecl {
                group_id: Expression::new(e.group.unwrap_or_default(), owner.clone()),
                artifact_id: Expression::new(e.artifact.unwrap_or_default(), owner.clone()),
                version: e.version.map(|v| Expression::new(v, owner.clone())),
            })
            .collect(),
        properties: raw
            .properties
            .into_iter()
            .map(|(k, v)| (k, Expression::new(v, owner.clone())))
            .collect(),
    }
}

fn freeze_dep(raw: RawDep, owner: &Ga) -> DependencyDecl {
    DependencyDecl {
        group_id: Expression::new(raw.group.unwrap_or_default(), owner.clone()),
        artifact_id: Expression::new(raw.artifact.unwrap_or_default(), owner.clone()),
        version: raw.version.map(|v| Expression::new(v, owner.clone())),
        dep_type: raw.dep_type,
        classifier: raw.classifier,
        scope: raw.scope,
        exclusions: raw.exclusions,
    }
}

fn freeze_plugin(raw: RawPlugin, owner: &Ga) -> PluginDecl {
    PluginDecl {
        group_id: raw.group.map(|g| Expression::new(g, owner.clone())),
        artifact_id: Expression::new(raw.artifact.unwrap_or_default(), owner.clone()),
        version: raw.version.map(|v| Expression::new(v, owner.clone())),
        dependencies: raw
            .dependencies
            .into_iter()
            .map(|d| freeze_dep(d, owner))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://example.org/manifest/4.0.0">
  <modelVersion>4.0.0</modelVersion>
  <parent>
    <groupId>org.example</groupId>
    <artifactId>parent</artifactId>
    <version>1.0.0</version>
  </parent>
  <artifactId>core</artifactId>
  <packaging>jar</packaging>

  <modules>
    <module>sub-a</module>
    <module>sub-b</module>
  </modules>

  <properties>
    <thing.version>2.5</thing.version>
  </properties>

  <dependencyManagement>
    <dependencies>
      <dependency>
        <groupId>org.example</groupId>
        <artifactId>bom</artifactId>
        <version>${thing.version}</version>
        <type>pom</type>
        <scope>import</scope>
      </dependency>
    </dependencies>
  </dependencyManagement>

  <dependencies>
    <dependency>
      <groupId>org.example</groupId>
      <artifactId>util</artifactId>
      <version>1.1</version>
      <exclusions>
        <exclusion>
          <groupId>junk</groupId>
          <artifactId>legacy</artifactId>
        </exclusion>
      </exclusions>
    </dependency>
  </dependencies>

  <build>
    <extensions>
      <extension>
        <groupId>org.example</groupId>
        <artifactId>wagon</artifactId>
        <version>9</version>
      </extension>
    </extensions>
    <plugins>
      <plugin>
        <artifactId>maven-compiler-plugin</artifactId>
        <version>3.11.0</version>
        <configuration>
          <dependencies>
            <dependency><artifactId>decoy</artifactId></dependency>
          </dependencies>
        </configuration>
        <dependencies>
          <dependency>
            <groupId>org.example</groupId>
            <artifactId>compiler-extras</artifactId>
            <version>1.2</version>
          </dependency>
        </dependencies>
      </plugin>
    </plugins>
  </build>

  <profiles>
    <profile>
      <id>extras</id>
      <modules>
        <module>sub-extra</module>
      </modules>
      <properties>
        <thing.version>9.9</thing.version>
      </properties>
      <dependencies>
        <dependency>
          <groupId>org.example</groupId>
          <artifactId>extra</artifactId>
        </dependency>
      </dependencies>
    </profile>
  </profiles>
</project>
"#;

    #[test]
    fn test_parse_coordinates_and_parent() {
        let m = parse_manifest(MANIFEST, "pom.xml").unwrap();
        assert_eq!(m.ga(), Ga::new("org.example", "core"));
        assert!(!m.own_group, "group comes from the parent block");
        assert!(m.version.is_none(), "version is inherited");
        let parent = m.parent.as_ref().unwrap();
        assert_eq!(parent.ga(), Ga::new("org.example", "parent"));
        assert_eq!(parent.version.raw(), "1.0.0");
        // parent scalars are owned by the parent's coordinates
        assert_eq!(parent.version.owner(), &Ga::new("org.example", "parent"));
    }

    #[test]
    fn test_profile_classification() {
        let m = parse_manifest(MANIFEST, "pom.xml").unwrap();
        let base = m.base_profile();
        assert_eq!(base.modules, vec!["sub-a", "sub-b"]);
        assert_eq!(base.dependencies.len(), 1);
        assert_eq!(base.dependency_management.len(), 1);
        assert!(base.dependency_management[0].is_import());
        assert_eq!(base.plugins.len(), 1);
        assert_eq!(base.extensions.len(), 1);

        assert_eq!(m.profiles.len(), 2);
        let extras = &m.profiles[1];
        assert_eq!(extras.id.as_deref(), Some("extras"));
        assert_eq!(extras.modules, vec!["sub-extra"]);
        assert_eq!(extras.dependencies.len(), 1);
        assert_eq!(extras.properties["thing.version"].raw(), "9.9");
    }

    #[test]
    fn test_configuration_subtree_is_opaque() {
        let m = parse_manifest(MANIFEST, "pom.xml").unwrap();
        let plugin = &m.base_profile().plugins[0];
        assert_eq!(plugin.artifact_id.raw(), "maven-compiler-plugin");
        // the decoy dependency inside <configuration> was not picked up
        assert_eq!(plugin.dependencies.len(), 1);
        assert_eq!(plugin.dependencies[0].artifact_id.raw(), "compiler-extras");
    }

    #[test]
    fn test_exclusions_parsed_as_ga_pairs() {
        let m = parse_manifest(MANIFEST, "pom.xml").unwrap();
        let dep = &m.base_profile().dependencies[0];
        assert_eq!(dep.exclusions, vec![Ga::new("junk", "legacy")]);
    }

    #[test]
    fn test_duplicate_property_is_fatal() {
        let text = r#"<project>
          <groupId>g</groupId><artifactId>a</artifactId><version>1</version>
          <properties><p>1</p><p>2</p></properties>
        </project>"#;
        let err = parse_manifest(text, "pom.xml").unwrap_err();
        assert!(err.to_string().contains("duplicate property 'p'"));
    }

    #[test]
    fn test_missing_artifact_id_is_fatal() {
        let err = parse_manifest("<project><groupId>g</groupId></project>", "pom.xml").unwrap_err();
        assert!(err.to_string().contains("missing artifactId"));
    }

    #[test]
    fn test_property_value_may_be_empty() {
        let text = r#"<project>
          <groupId>g</groupId><artifactId>a</artifactId><version>1</version>
          <properties><empty.flag/></properties>
        </project>"#;
        let m = parse_manifest(text, "pom.xml").unwrap();
        assert_eq!(m.base_profile().properties["empty.flag"].raw(), "");
    }
}
