//! Local-name selector paths.
//!
//! Selectors address elements the way namespace-agnostic XPath does:
//! `/*[local-name()='project']/*[local-name()='version']`. Steps may carry
//! predicates on child-element text or on the element's own text, rendered
//! as `[*[local-name()='groupId']='org.x']` and `[.='core']`. [`Selector`]
//! round-trips through that textual shape via [`std::fmt::Display`] and
//! [`Selector::parse`].

use crate::{Document, Element, Node, NodePath, Result, XmlError};
use std::fmt;

/// A predicate narrowing one selector step
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Predicate {
    /// A direct child element with this local name has exactly this text
    ChildText { name: String, value: String },
    /// The element's own text equals this value
    TextIs(String),
}

/// One step of a selector path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Step {
    /// Local name the element must have
    pub name: String,
    pub predicates: Vec<Predicate>,
}

impl Step {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            predicates: Vec::new(),
        }
    }

    pub fn with_child_text(mut self, child: impl Into<String>, value: impl Into<String>) -> Self {
        self.predicates.push(Predicate::ChildText {
            name: child.into(),
            value: value.into(),
        });
        self
    }

    pub fn with_text(mut self, value: impl Into<String>) -> Self {
        self.predicates.push(Predicate::TextIs(value.into()));
        self
    }

    fn matches(&self, element: &Element) -> bool {
        if element.local_name() != self.name {
            return false;
        }
        self.predicates.iter().all(|p| match p {
            Predicate::ChildText { name, value } => element
                .children_named(name)
                .any(|child| child.text() == *value),
            Predicate::TextIs(value) => element.text() == *value,
        })
    }
}

/// An absolute path of local-name steps, beginning at the document root
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selector {
    pub steps: Vec<Step>,
}

impl Selector {
    /// Plain path of local names, no predicates
    pub fn path(names: &[&str]) -> Self {
        Self {
            steps: names.iter().map(|n| Step::named(*n)).collect(),
        }
    }

    pub fn from_steps(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// Append a plain step
    pub fn then(mut self, name: impl Into<String>) -> Self {
        self.steps.push(Step::named(name));
        self
    }

    /// Append an arbitrary step
    pub fn then_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Parse the textual form emitted by [`fmt::Display`].
    ///
    /// # Errors
    /// Fails on anything that deviates from the canonical shape.
    pub fn parse(text: &str) -> Result<Self> {
        let syntax = || XmlError::SelectorSyntax(text.to_string());
        let mut steps = Vec::new();
        let mut rest = text;
        while !rest.is_empty() {
            rest = rest.strip_prefix("/*[local-name()='").ok_or_else(syntax)?;
            let end = rest.find("']").ok_or_else(syntax)?;
            let mut step = Step::named(&rest[..end]);
            rest = &rest[end + 2..];
            // optional predicates before the next step
            while rest.starts_with('[') {
                if let Some(tail) = rest.strip_prefix("[.='") {
                    let end = tail.find("']").ok_or_else(syntax)?;
                    step = step.with_text(&tail[..end]);
                    rest = &tail[end + 2..];
                } else if let Some(tail) = rest.strip_prefix("[*[local-name()='") {
                    let name_end = tail.find("']='").ok_or_else(syntax)?;
                    let name = &tail[..name_end];
                    let tail = &tail[name_end + 4..];
                    let value_end = tail.find("']").ok_or_else(syntax)?;
                    step = step.with_child_text(name, &tail[..value_end]);
                    rest = &tail[value_end + 2..];
                } else {
                    return Err(syntax());
                }
            }
            steps.push(step);
        }
        if steps.is_empty() {
            return Err(syntax());
        }
        Ok(Self { steps })
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            write!(f, "/*[local-name()='{}']", step.name)?;
            for predicate in &step.predicates {
                match predicate {
                    Predicate::ChildText { name, value } => {
                        write!(f, "[*[local-name()='{}']='{}']", name, value)?
                    }
                    Predicate::TextIs(value) => write!(f, "[.='{}']", value)?,
                }
            }
        }
        Ok(())
    }
}

/// Evaluate a selector, returning the node paths of all matches in
/// document order
pub fn evaluate(doc: &Document, selector: &Selector) -> Vec<NodePath> {
    let Some((first, rest)) = selector.steps.split_first() else {
        return Vec::new();
    };
    if !first.matches(&doc.root) {
        return Vec::new();
    }
    let mut matches: Vec<NodePath> = vec![Vec::new()];
    for step in rest {
        let mut next: Vec<NodePath> = Vec::new();
        for path in &matches {
            let element = doc
                .element_at(path)
                .expect("selector paths always address elements");
            for (idx, node) in element.children.iter().enumerate() {
                if let Node::Element(child) = node {
                    if step.matches(child) {
                        let mut extended = path.clone();
                        extended.push(idx);
                        next.push(extended);
                    }
                }
            }
        }
        matches = next;
        if matches.is_empty() {
            break;
        }
    }
    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "<project>\
        <modules><module>a</module><module>b</module></modules>\
        <dependencies>\
          <dependency><groupId>g</groupId><artifactId>x</artifactId><version>1</version></dependency>\
          <dependency><groupId>g</groupId><artifactId>y</artifactId><version>2</version></dependency>\
        </dependencies>\
        </project>";

    #[test]
    fn test_plain_path() {
        let doc = Document::parse(DOC).unwrap();
        let hits = doc.select(&Selector::path(&["project", "modules", "module"]));
        assert_eq!(hits.len(), 2);
        assert_eq!(doc.element_at(&hits[1]).unwrap().text(), "b");
    }

    #[test]
    fn test_child_text_predicate() {
        let doc = Document::parse(DOC).unwrap();
        let sel = Selector::path(&["project", "dependencies"]).then_step(
            Step::named("dependency")
                .with_child_text("groupId", "g")
                .with_child_text("artifactId", "y"),
        );
        let hits = doc.select(&sel);
        assert_eq!(hits.len(), 1);
        let version = doc.element_at(&hits[0]).unwrap().child("version").unwrap();
        assert_eq!(version.text(), "2");
    }

    #[test]
    fn test_self_text_predicate() {
        let doc = Document::parse(DOC).unwrap();
        let sel = Selector::path(&["project", "modules"])
            .then_step(Step::named("module").with_text("b"));
        let hits = doc.select(&sel);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_display_and_parse_round_trip() {
        let sel = Selector::path(&["project", "dependencies"]).then_step(
            Step::named("dependency")
                .with_child_text("groupId", "g")
                .with_child_text("artifactId", "y"),
        );
        let text = sel.to_string();
        assert!(text.starts_with("/*[local-name()='project']"));
        assert_eq!(Selector::parse(&text).unwrap(), sel);
    }

    #[test]
    fn test_no_match_on_wrong_root() {
        let doc = Document::parse(DOC).unwrap();
        assert!(doc.select(&Selector::path(&["pom", "modules"])).is_empty());
    }
}
