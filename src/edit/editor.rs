//! Format-preserving application of pending edits
//!
//! Given one file's original text and its pending edits, produce new text
//! differing only in the targeted content. The tree is mutated through
//! xmlgrove and re-serialized with its generic writer; the spans that
//! writer normalizes (everything through the root opening tag, and
//! everything after the root closing tag) are spliced back verbatim from
//! the original by anchored matching. End-of-line convention and the
//! indentation unit are auto-detected so inserted lines blend in.

use super::{ordering, ApplyReport, EditOp, EditSet};
use crate::{PomforgeError, Result};
use std::path::Path;
use std::str::FromStr;
use xmlgrove::{
    escape_text, write_document, write_element, Document, Element, EmptyElementStyle, Node,
    Selector,
};

/// Caller policy for empty-element tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelfClosingStyle {
    /// Detect from the source's first empty-element tag, `<a />` when
    /// the source has none
    #[default]
    AutoPreferSpace,
    /// Detect from the source, `<a/>` when the source has none
    AutoPreferEmpty,
    AlwaysSpace,
    AlwaysEmpty,
}

impl FromStr for SelfClosingStyle {
    type Err = PomforgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto-prefer-space" => Ok(Self::AutoPreferSpace),
            "auto-prefer-empty" => Ok(Self::AutoPreferEmpty),
            "always-space" => Ok(Self::AlwaysSpace),
            "always-empty" => Ok(Self::AlwaysEmpty),
            other => Err(PomforgeError::Other(format!(
                "unknown self-closing style '{}' (expected auto-prefer-space, auto-prefer-empty, always-space, or always-empty)",
                other
            ))),
        }
    }
}

/// Apply a file's pending edits to its original text.
///
/// Returns `None` when the outcome is byte-identical to the input (an
/// empty edit set never even parses the text). `path` is used in error
/// messages only.
pub fn apply_edits(
    original: &str,
    edits: &[EditOp],
    style: SelfClosingStyle,
    path: &str,
) -> Result<Option<String>> {
    if edits.is_empty() {
        return Ok(None);
    }

    let eol = if original.contains('\r') { "\r\n" } else { "\n" };
    let empty_style = resolve_empty_style(style, original);
    let mut doc = Document::parse(original)?;
    let unit = detect_indent_unit(&doc);

    let ctx = EditContext {
        path,
        eol,
        unit,
        empty_style,
    };
    for edit in edits {
        ctx.apply(&mut doc, edit)?;
    }

    let serialized = write_document(&doc, empty_style);
    let result = splice_verbatim(original, &serialized, &doc.root.name)?;
    if result == original {
        Ok(None)
    } else {
        Ok(Some(result))
    }
}

/// Apply a whole edit set to the files under `root_dir`, writing only
/// files whose content actually changes
pub fn apply_edit_set(
    root_dir: &Path,
    edits: &EditSet,
    style: SelfClosingStyle,
) -> Result<ApplyReport> {
    let mut report = ApplyReport {
        changed: Vec::new(),
        unchanged: Vec::new(),
    };
    for file in edits.files() {
        let full = root_dir.join(file);
        let original = std::fs::read_to_string(&full)?;
        match apply_edits(&original, edits.for_file(file), style, file)? {
            Some(updated) => {
                std::fs::write(&full, updated)?;
                tracing::info!(file, "rewrote manifest");
                report.changed.push(file.to_string());
            }
            None => {
                tracing::debug!(file, "no content change, skipping write");
                report.unchanged.push(file.to_string());
            }
        }
    }
    Ok(report)
}

struct EditContext<'a> {
    path: &'a str,
    eol: &'a str,
    unit: String,
    empty_style: EmptyElementStyle,
}

impl EditContext<'_> {
    fn no_match(&self, selector: &Selector) -> PomforgeError {
        PomforgeError::SelectorNoMatch {
            path: self.path.to_string(),
            selector: selector.to_string(),
        }
    }

    fn apply(&self, doc: &mut Document, edit: &EditOp) -> Result<()> {
        match edit {
            EditOp::SetText { selector, text } => {
                let path = doc
                    .select_first(selector)
                    .ok_or_else(|| self.no_match(selector))?;
                let element = doc.element_at_mut(&path).expect("selected path exists");
                element.children = vec![Node::Text(escape_text(text))];
                element.self_closing = false;
            }
            EditOp::InsertElement { parent, name, text } => {
                let parent_path = match doc.select_first(parent) {
                    Some(path) => path,
                    None if parent.steps.len() == 2 => {
                        let idx = self.insert_top_level(doc, &parent.steps[1].name)?;
                        vec![idx]
                    }
                    None => return Err(self.no_match(parent)),
                };
                let depth = parent_path.len() + 1;
                let element = doc
                    .element_at_mut(&parent_path)
                    .expect("selected path exists");
                self.insert_child(element, depth, name, text);
            }
            EditOp::RemoveElement { selector } => {
                let path = doc
                    .select_first(selector)
                    .ok_or_else(|| self.no_match(selector))?;
                self.remove_at(doc, &path, false)?;
            }
            EditOp::CommentOut { selector, tag } => {
                let path = doc
                    .select_first(selector)
                    .ok_or_else(|| self.no_match(selector))?;
                let element = doc.element_at(&path).expect("selected path exists");
                let markup = write_element(element, self.empty_style);
                let comment = Node::Comment(format!(" {} {} ", markup, tag));
                let (parent_path, idx) = split_last(&path)?;
                let parent = doc
                    .element_at_mut(parent_path)
                    .expect("parent of match exists");
                parent.children[idx] = comment;
            }
            EditOp::UncommentLinks { tag } => {
                uncomment_links(&mut doc.root, tag);
            }
        }
        Ok(())
    }

    /// Create a missing root-level container at its canonical position
    fn insert_top_level(&self, doc: &mut Document, name: &str) -> Result<usize> {
        let position =
            ordering::position(name).ok_or_else(|| PomforgeError::UnknownElement(name.to_string()))?;

        // the last existing element that sorts at or before the new one
        let mut anchor: Option<(usize, (usize, usize))> = None;
        let mut following_group: Option<usize> = None;
        for (idx, node) in doc.root.children.iter().enumerate() {
            if let Node::Element(e) = node {
                match ordering::position(e.local_name()) {
                    Some(pos) if pos <= position => anchor = Some((idx, pos)),
                    Some(pos) => {
                        if following_group.is_none() {
                            following_group = Some(pos.0);
                        }
                    }
                    None => {}
                }
            }
        }

        let element = Element::new(name);
        match anchor {
            Some((idx, (anchor_group, _))) => {
                let separator = if anchor_group == position.0 {
                    format!("{}{}", self.eol, self.unit)
                } else {
                    format!("{}{}{}", self.eol, self.eol, self.unit)
                };
                doc.root.children.insert(idx + 1, Node::Text(separator));
                doc.root.children.insert(idx + 2, Node::Element(element));
                Ok(idx + 2)
            }
            None => {
                // before every known element, or into a childless root
                let first_elem = doc
                    .root
                    .children
                    .iter()
                    .position(|n| matches!(n, Node::Element(_)));
                match first_elem {
                    Some(idx) => {
                        let separator = if following_group == Some(position.0) {
                            format!("{}{}", self.eol, self.unit)
                        } else {
                            format!("{}{}{}", self.eol, self.eol, self.unit)
                        };
                        doc.root.children.insert(idx, Node::Element(element));
                        doc.root.children.insert(idx + 1, Node::Text(separator));
                        Ok(idx)
                    }
                    None => {
                        doc.root.children.clear();
                        doc.root
                            .children
                            .push(Node::Text(format!("{}{}", self.eol, self.unit)));
                        doc.root.children.push(Node::Element(element));
                        doc.root.children.push(Node::Text(self.eol.to_string()));
                        doc.root.self_closing = false;
                        Ok(1)
                    }
                }
            }
        }
    }

    /// Append `<name>text</name>` inside a parent element at the given
    /// depth, keeping one child per line
    fn insert_child(&self, parent: &mut Element, depth: usize, name: &str, text: &str) {
        let mut child = Element::new(name);
        if text.is_empty() {
            child.self_closing = true;
        } else {
            child.children.push(Node::Text(escape_text(text)));
        }

        let child_indent = self.unit.repeat(depth);
        let close_indent = self.unit.repeat(depth.saturating_sub(1));
        match parent.element_indices().last() {
            Some(&last) => {
                parent
                    .children
                    .insert(last + 1, Node::Text(format!("{}{}", self.eol, child_indent)));
                parent.children.insert(last + 2, Node::Element(child));
            }
            None => {
                parent.children.clear();
                parent
                    .children
                    .push(Node::Text(format!("{}{}", self.eol, child_indent)));
                parent.children.push(Node::Element(child));
                parent
                    .children
                    .push(Node::Text(format!("{}{}", self.eol, close_indent)));
                parent.self_closing = false;
            }
        }
    }

    /// Remove the addressed element together with its preceding
    /// indentation; optionally also a preceding comment
    fn remove_at(&self, doc: &mut Document, path: &[usize], take_comment: bool) -> Result<()> {
        let (parent_path, idx) = split_last(path)?;
        let parent = doc
            .element_at_mut(parent_path)
            .expect("parent of match exists");
        parent.children.remove(idx);
        let mut i = idx;
        while i > 0 && parent.children[i - 1].is_whitespace() {
            parent.children.remove(i - 1);
            i -= 1;
        }
        if take_comment && i > 0 && matches!(parent.children[i - 1], Node::Comment(_)) {
            parent.children.remove(i - 1);
            i -= 1;
            while i > 0 && parent.children[i - 1].is_whitespace() {
                parent.children.remove(i - 1);
                i -= 1;
            }
        }
        Ok(())
    }
}

fn split_last(path: &[usize]) -> Result<(&[usize], usize)> {
    match path.split_last() {
        Some((&idx, parent)) => Ok((parent, idx)),
        None => Err(PomforgeError::Other(
            "edit would replace the root element".to_string(),
        )),
    }
}

/// Convert tagged link comments back into live elements, depth-first
fn uncomment_links(element: &mut Element, tag: &str) {
    for node in element.children.iter_mut() {
        if let Node::Element(child) = node {
            uncomment_links(child, tag);
        }
    }
    for idx in 0..element.children.len() {
        if let Node::Comment(content) = &element.children[idx] {
            if let Some(restored) = parse_tagged_link(content, tag) {
                element.children[idx] = Node::Element(restored);
            }
        }
    }
}

/// Recognize `<!-- <module>x</module> TAG -->` and give back the element
fn parse_tagged_link(content: &str, tag: &str) -> Option<Element> {
    let trimmed = content.trim();
    let markup = trimmed.strip_suffix(tag)?.trim_end();
    if !markup.starts_with('<') {
        return None;
    }
    let doc = Document::parse(markup).ok()?;
    if doc.root.local_name() != "module" {
        return None;
    }
    Some(doc.root)
}

/// Indentation unit: the whitespace preceding the root's first child
/// element, taken after its last line break
fn detect_indent_unit(doc: &Document) -> String {
    let mut preceding: Option<&str> = None;
    for node in &doc.root.children {
        match node {
            Node::Element(_) => break,
            Node::Text(t) if node.is_whitespace() => preceding = Some(t),
            _ => {}
        }
    }
    if let Some(text) = preceding {
        if let Some(pos) = text.rfind('\n') {
            let unit = &text[pos + 1..];
            if !unit.is_empty() {
                return unit.to_string();
            }
        }
    }
    "  ".to_string()
}

/// Pick the empty-element style: forced by policy, else detected from the
/// source's first occurrence, else the policy's preference
fn resolve_empty_style(style: SelfClosingStyle, original: &str) -> EmptyElementStyle {
    match style {
        SelfClosingStyle::AlwaysSpace => EmptyElementStyle::Spaced,
        SelfClosingStyle::AlwaysEmpty => EmptyElementStyle::Compact,
        SelfClosingStyle::AutoPreferSpace | SelfClosingStyle::AutoPreferEmpty => {
            match original.find("/>") {
                Some(pos) => {
                    if original[..pos].ends_with(' ') {
                        EmptyElementStyle::Spaced
                    } else {
                        EmptyElementStyle::Compact
                    }
                }
                None => match style {
                    SelfClosingStyle::AutoPreferSpace => EmptyElementStyle::Spaced,
                    _ => EmptyElementStyle::Compact,
                },
            }
        }
    }
}

/// Recombine the serialized body with the original's verbatim prolog,
/// root opening tag, and trailing span
fn splice_verbatim(original: &str, serialized: &str, root_name: &str) -> Result<String> {
    let orig_open_end = root_open_end(original, root_name)?;
    let ser_open_end = root_open_end(serialized, root_name)?;
    let orig_tail_start = root_close_end(original, root_name)?;
    let ser_tail_start = root_close_end(serialized, root_name)?;
    let mut out = String::with_capacity(original.len() + 64);
    out.push_str(&original[..orig_open_end]);
    out.push_str(&serialized[ser_open_end..ser_tail_start]);
    out.push_str(&original[orig_tail_start..]);
    Ok(out)
}

/// Byte offset just past the `>` of the root element's opening tag
fn root_open_end(text: &str, root_name: &str) -> Result<usize> {
    let bytes = text.as_bytes();
    let mut i = 0;
    let err = || PomforgeError::Other(format!("could not locate <{}> opening tag", root_name));
    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() {
            return Err(err());
        }
        let rest = &text[i..];
        if let Some(stripped) = rest.strip_prefix("<!--") {
            i += 4 + stripped.find("-->").ok_or_else(err)? + 3;
        } else if let Some(stripped) = rest.strip_prefix("<?") {
            i += 2 + stripped.find("?>").ok_or_else(err)? + 2;
        } else if rest.starts_with("<!") {
            // doctype, possibly with an internal subset
            let mut depth = 0usize;
            let mut advanced = None;
            for (k, c) in rest.char_indices() {
                match c {
                    '[' => depth += 1,
                    ']' => depth = depth.saturating_sub(1),
                    '>' if depth == 0 => {
                        advanced = Some(k + 1);
                        break;
                    }
                    _ => {}
                }
            }
            i += advanced.ok_or_else(err)?;
        } else if rest.starts_with('<') {
            if !rest[1..].starts_with(root_name) {
                return Err(err());
            }
            // find the closing '>' outside attribute quotes
            let mut quote: Option<char> = None;
            for (k, c) in rest.char_indices() {
                match (quote, c) {
                    (Some(q), _) if c == q => quote = None,
                    (Some(_), _) => {}
                    (None, '"') | (None, '\'') => quote = Some(c),
                    (None, '>') => return Ok(i + k + 1),
                    _ => {}
                }
            }
            return Err(err());
        } else {
            return Err(err());
        }
    }
}

/// Byte offset just past the root element's closing tag (or past the
/// self-closing opening tag when there is no separate closing tag)
fn root_close_end(text: &str, root_name: &str) -> Result<usize> {
    let close = format!("</{}", root_name);
    if let Some(pos) = text.rfind(&close) {
        let end = text[pos..]
            .find('>')
            .ok_or_else(|| PomforgeError::Other(format!("unterminated </{}>", root_name)))?;
        Ok(pos + end + 1)
    } else {
        root_open_end(text, root_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_version(text: &str) -> EditOp {
        EditOp::SetText {
            selector: Selector::path(&["project", "version"]),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_empty_edit_set_is_identity() {
        for text in [
            "<?xml version=\"1.0\"?>\n<project>\n  <version>1</version>\n</project>\n",
            "<?xml version=\"1.0\"?>\r\n<project>\r\n  <version>1</version>\r\n</project>\r\n",
        ] {
            assert!(apply_edits(text, &[], SelfClosingStyle::default(), "pom.xml")
                .unwrap()
                .is_none());
        }
    }

    #[test]
    fn test_set_text_changes_only_the_target() {
        let original = "<?xml version=\"1.0\" encoding=\"UTF-8\" ?>\n\
            <!-- release manifest -->\n\
            <project xmlns=\"http://example.org/4.0.0\"  >\n\
            \t<groupId>g</groupId>\n\
            \t<artifactId>a</artifactId>\n\
            \t<version>1.0.0</version>\n\
            </project>\n\n";
        let updated = apply_edits(
            original,
            &[set_version("2.0.0")],
            SelfClosingStyle::default(),
            "pom.xml",
        )
        .unwrap()
        .unwrap();
        assert_eq!(updated, original.replace("1.0.0", "2.0.0"));
    }

    #[test]
    fn test_crlf_preserved_through_edits() {
        let original = "<project>\r\n  <version>1</version>\r\n  <modules>\r\n    <module>a</module>\r\n  </modules>\r\n</project>\r\n";
        let edit = EditOp::InsertElement {
            parent: Selector::path(&["project", "modules"]),
            name: "module".to_string(),
            text: "b".to_string(),
        };
        let updated = apply_edits(original, &[edit], SelfClosingStyle::default(), "pom.xml")
            .unwrap()
            .unwrap();
        assert_eq!(
            updated,
            "<project>\r\n  <version>1</version>\r\n  <modules>\r\n    <module>a</module>\r\n    <module>b</module>\r\n  </modules>\r\n</project>\r\n"
        );
    }

    #[test]
    fn test_insert_module_block_scenario() {
        // 4-space indented, LF terminated, no modules block
        let original = "<project>\n    <groupId>g</groupId>\n    <artifactId>a</artifactId>\n    <version>1</version>\n    <dependencies>\n    </dependencies>\n</project>\n";
        let edit = EditOp::InsertElement {
            parent: Selector::path(&["project", "modules"]),
            name: "module".to_string(),
            text: "core".to_string(),
        };
        let updated = apply_edits(original, &[edit], SelfClosingStyle::default(), "pom.xml")
            .unwrap()
            .unwrap();
        let expected = "<project>\n    <groupId>g</groupId>\n    <artifactId>a</artifactId>\n    <version>1</version>\n\n    <modules>\n        <module>core</module>\n    </modules>\n    <dependencies>\n    </dependencies>\n</project>\n";
        assert_eq!(updated, expected);
    }

    #[test]
    fn test_comment_out_and_restore_round_trip() {
        let original = "<project>\n  <modules>\n    <module>a</module>\n    <module>b</module>\n  </modules>\n</project>\n";
        let prune = EditOp::CommentOut {
            selector: Selector::path(&["project", "modules"])
                .then_step(xmlgrove::Step::named("module").with_text("b")),
            tag: "pruned".to_string(),
        };
        let pruned = apply_edits(original, &[prune], SelfClosingStyle::default(), "pom.xml")
            .unwrap()
            .unwrap();
        assert_eq!(
            pruned,
            "<project>\n  <modules>\n    <module>a</module>\n    <!-- <module>b</module> pruned -->\n  </modules>\n</project>\n"
        );

        let restore = EditOp::UncommentLinks {
            tag: "pruned".to_string(),
        };
        let restored = apply_edits(&pruned, &[restore], SelfClosingStyle::default(), "pom.xml")
            .unwrap()
            .unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_restore_is_idempotent() {
        let original = "<project>\n  <modules>\n    <module>a</module>\n  </modules>\n</project>\n";
        let restore = EditOp::UncommentLinks {
            tag: "pruned".to_string(),
        };
        // nothing tagged: applying the restore changes nothing
        assert!(
            apply_edits(original, &[restore], SelfClosingStyle::default(), "pom.xml")
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_remove_element_consumes_its_line() {
        let original = "<project>\n  <modules>\n    <module>a</module>\n    <module>b</module>\n  </modules>\n</project>\n";
        let remove = EditOp::RemoveElement {
            selector: Selector::path(&["project", "modules"])
                .then_step(xmlgrove::Step::named("module").with_text("b")),
        };
        let updated = apply_edits(original, &[remove], SelfClosingStyle::default(), "pom.xml")
            .unwrap()
            .unwrap();
        assert_eq!(
            updated,
            "<project>\n  <modules>\n    <module>a</module>\n  </modules>\n</project>\n"
        );
    }

    #[test]
    fn test_selector_without_target_is_fatal() {
        let original = "<project><artifactId>a</artifactId></project>";
        let err = apply_edits(
            original,
            &[set_version("2")],
            SelfClosingStyle::default(),
            "pom.xml",
        )
        .unwrap_err();
        assert!(matches!(err, PomforgeError::SelectorNoMatch { .. }));
    }

    #[test]
    fn test_unknown_container_name_is_fatal() {
        let original = "<project><artifactId>a</artifactId></project>";
        let edit = EditOp::InsertElement {
            parent: Selector::path(&["project", "banana"]),
            name: "module".to_string(),
            text: "x".to_string(),
        };
        let err =
            apply_edits(original, &[edit], SelfClosingStyle::default(), "pom.xml").unwrap_err();
        assert!(matches!(err, PomforgeError::UnknownElement(_)));
    }

    #[test]
    fn test_self_closing_style_detection() {
        assert_eq!(
            resolve_empty_style(SelfClosingStyle::AutoPreferSpace, "<a><b /></a>"),
            EmptyElementStyle::Spaced
        );
        assert_eq!(
            resolve_empty_style(SelfClosingStyle::AutoPreferSpace, "<a><b/></a>"),
            EmptyElementStyle::Compact
        );
        assert_eq!(
            resolve_empty_style(SelfClosingStyle::AutoPreferSpace, "<a></a>"),
            EmptyElementStyle::Spaced
        );
        assert_eq!(
            resolve_empty_style(SelfClosingStyle::AlwaysEmpty, "<a><b /></a>"),
            EmptyElementStyle::Compact
        );
    }

    #[test]
    fn test_doctype_and_prolog_survive() {
        let original = "<?xml version=\"1.0\"?>\n<!DOCTYPE project>\n<!-- header -->\n<project>\n  <version>1</version>\n</project>\n<!-- trailer -->\n";
        let updated = apply_edits(
            original,
            &[set_version("2")],
            SelfClosingStyle::default(),
            "pom.xml",
        )
        .unwrap()
        .unwrap();
        assert!(updated.starts_with("<?xml version=\"1.0\"?>\n<!DOCTYPE project>\n<!-- header -->\n"));
        assert!(updated.ends_with("</project>\n<!-- trailer -->\n"));
        assert!(updated.contains("<version>2</version>"));
    }
}
