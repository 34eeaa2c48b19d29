//! Comment- and whitespace-preserving XML tree for manifest editing.
//!
//! A deliberately small DOM built on `quick-xml` streaming events. Unlike a
//! general-purpose XML library, this one keeps everything a manifest editor
//! needs to reproduce source text: comments, CDATA, processing instructions,
//! raw (still-escaped) text spans including their whitespace, attribute
//! order, and whether an empty element was written self-closing.
//!
//! The serializer in [`write`] is intentionally ordinary: it normalizes the
//! XML declaration and always quotes attributes with `"`. Callers that need
//! byte fidelity around the document prolog or the root tag are expected to
//! splice those spans back from their original text.
//!
//! # Example
//!
//! ```
//! use xmlgrove::{Document, Selector};
//!
//! let doc = Document::parse("<project><version>1.0</version></project>").unwrap();
//! let sel = Selector::path(&["project", "version"]);
//! let hits = doc.select(&sel);
//! assert_eq!(doc.element_at(&hits[0]).unwrap().text(), "1.0");
//! ```

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

mod select;
mod write;

pub use select::{Predicate, Selector, Step};
pub use write::{write_document, write_element, EmptyElementStyle};

/// Errors from parsing or querying a document
#[derive(Error, Debug)]
pub enum XmlError {
    #[error("XML parse error at byte {position}: {message}")]
    Parse { position: u64, message: String },

    #[error("Document has no root element")]
    NoRoot,

    #[error("Trailing content after root element: {0}")]
    TrailingContent(String),

    #[error("Malformed selector: {0}")]
    SelectorSyntax(String),
}

/// Result type for xmlgrove operations
pub type Result<T> = std::result::Result<T, XmlError>;

/// A single node in the tree.
///
/// Text, comment, and CDATA content is stored raw, exactly as it appeared
/// between the markup of the source document (entities are not expanded).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Raw character data, still escaped
    Text(String),
    /// Content between `<!--` and `-->`
    Comment(String),
    /// Content between `<![CDATA[` and `]]>`
    CData(String),
    /// Content between `<?` and `?>` (target included)
    ProcessingInstruction(String),
    /// Content between `<!DOCTYPE` and `>`
    DocType(String),
    /// Reconstructed content of the XML declaration
    Decl(String),
}

impl Node {
    /// True for a text node that is entirely XML whitespace
    pub fn is_whitespace(&self) -> bool {
        match self {
            Node::Text(t) => t.chars().all(|c| matches!(c, ' ' | '\t' | '\r' | '\n')),
            _ => false,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }
}

/// An element with its attributes and child nodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Qualified name exactly as written (`ns:name` or `name`)
    pub name: String,

    /// Attributes in source order; values raw (still escaped)
    pub attributes: Vec<(String, String)>,

    pub children: Vec<Node>,

    /// True when the source used an empty-element tag (`<a/>`)
    pub self_closing: bool,
}

impl Element {
    /// Create an empty element with no attributes
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            self_closing: false,
        }
    }

    /// Element name with any namespace prefix stripped
    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// Concatenated, unescaped, trimmed text of direct text/CDATA children
    pub fn text(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            match child {
                Node::Text(t) => out.push_str(&unescape_text(t)),
                Node::CData(t) => out.push_str(t),
                _ => {}
            }
        }
        out.trim().to_string()
    }

    /// First direct child element with the given local name
    pub fn child(&self, local: &str) -> Option<&Element> {
        self.children
            .iter()
            .filter_map(Node::as_element)
            .find(|e| e.local_name() == local)
    }

    /// All direct child elements with the given local name
    pub fn children_named<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children
            .iter()
            .filter_map(Node::as_element)
            .filter(move |e| e.local_name() == local)
    }

    /// Node indices of direct element children
    pub fn element_indices(&self) -> Vec<usize> {
        self.children
            .iter()
            .enumerate()
            .filter(|(_, n)| matches!(n, Node::Element(_)))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Path of child-node indices from the document root element.
///
/// The empty path addresses the root itself; `[3, 1]` addresses child node 1
/// of child node 3 of the root. Indices count all nodes, including text and
/// comments, so callers can reason about adjacent whitespace.
pub type NodePath = Vec<usize>;

/// A parsed document: the root element plus everything around it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Declaration, doctype, comments, and whitespace before the root
    pub before_root: Vec<Node>,
    pub root: Element,
    /// Comments and whitespace after the root element
    pub after_root: Vec<Node>,
}

impl Document {
    /// Parse a document, preserving comments and raw text spans.
    ///
    /// # Errors
    /// Fails on malformed XML or a document with no root element.
    pub fn parse(text: &str) -> Result<Self> {
        let mut reader = Reader::from_str(text);

        let mut before_root: Vec<Node> = Vec::new();
        let mut after_root: Vec<Node> = Vec::new();
        let mut root: Option<Element> = None;
        // Open elements; last is the innermost
        let mut stack: Vec<Element> = Vec::new();

        loop {
            let event = reader.read_event().map_err(|e| XmlError::Parse {
                position: reader.buffer_position(),
                message: e.to_string(),
            })?;
            match event {
                Event::Decl(d) => {
                    let version = d
                        .version()
                        .map(|v| String::from_utf8_lossy(&v).into_owned())
                        .unwrap_or_else(|_| "1.0".to_string());
                    let mut content = format!("xml version=\"{}\"", version);
                    if let Some(Ok(enc)) = d.encoding() {
                        content.push_str(&format!(
                            " encoding=\"{}\"",
                            String::from_utf8_lossy(&enc)
                        ));
                    }
                    if let Some(Ok(sa)) = d.standalone() {
                        content.push_str(&format!(
                            " standalone=\"{}\"",
                            String::from_utf8_lossy(&sa)
                        ));
                    }
                    push_node(&mut stack, &mut before_root, &mut after_root, &root, Node::Decl(content));
                }
                Event::Start(e) => {
                    let elem = start_element(&e, &reader, false)?;
                    stack.push(elem);
                }
                Event::Empty(e) => {
                    let elem = start_element(&e, &reader, true)?;
                    push_node(
                        &mut stack,
                        &mut before_root,
                        &mut after_root,
                        &root,
                        Node::Element(elem),
                    );
                    if stack.is_empty() && root.is_none() {
                        // Self-closing root: reclaim it from before_root
                        if let Some(Node::Element(e)) = before_root.pop() {
                            root = Some(e);
                        }
                    }
                }
                Event::End(_) => {
                    let elem = stack.pop().ok_or(XmlError::Parse {
                        position: reader.buffer_position(),
                        message: "unexpected closing tag".to_string(),
                    })?;
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(Node::Element(elem));
                    } else if root.is_none() {
                        root = Some(elem);
                    } else {
                        return Err(XmlError::TrailingContent(elem.name));
                    }
                }
                Event::Text(t) => {
                    let raw = String::from_utf8_lossy(&t).into_owned();
                    push_node(&mut stack, &mut before_root, &mut after_root, &root, Node::Text(raw));
                }
                Event::CData(t) => {
                    let raw = String::from_utf8_lossy(&t).into_owned();
                    push_node(&mut stack, &mut before_root, &mut after_root, &root, Node::CData(raw));
                }
                Event::Comment(t) => {
                    let raw = String::from_utf8_lossy(&t).into_owned();
                    push_node(&mut stack, &mut before_root, &mut after_root, &root, Node::Comment(raw));
                }
                Event::GeneralRef(t) => {
                    // keep entity references raw, as their source text
                    let raw = format!("&{};", String::from_utf8_lossy(&t));
                    push_node(&mut stack, &mut before_root, &mut after_root, &root, Node::Text(raw));
                }
                Event::DocType(t) => {
                    let raw = String::from_utf8_lossy(&t).trim().to_string();
                    push_node(&mut stack, &mut before_root, &mut after_root, &root, Node::DocType(raw));
                }
                Event::PI(t) => {
                    let raw = String::from_utf8_lossy(&t).into_owned();
                    push_node(
                        &mut stack,
                        &mut before_root,
                        &mut after_root,
                        &root,
                        Node::ProcessingInstruction(raw),
                    );
                }
                Event::Eof => break,
            }
        }

        let root = root.ok_or(XmlError::NoRoot)?;
        Ok(Document {
            before_root,
            root,
            after_root,
        })
    }

    /// Evaluate a selector against the document, returning node paths
    pub fn select(&self, selector: &Selector) -> Vec<NodePath> {
        select::evaluate(self, selector)
    }

    /// First match of a selector, if any
    pub fn select_first(&self, selector: &Selector) -> Option<NodePath> {
        self.select(selector).into_iter().next()
    }

    /// Element at a node path
    pub fn element_at(&self, path: &[usize]) -> Option<&Element> {
        let mut current = &self.root;
        for &idx in path {
            current = match current.children.get(idx) {
                Some(Node::Element(e)) => e,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Mutable element at a node path
    pub fn element_at_mut(&mut self, path: &[usize]) -> Option<&mut Element> {
        let mut current = &mut self.root;
        for &idx in path {
            current = match current.children.get_mut(idx) {
                Some(Node::Element(e)) => e,
                _ => return None,
            };
        }
        Some(current)
    }
}

fn start_element(
    e: &quick_xml::events::BytesStart<'_>,
    reader: &Reader<&[u8]>,
    self_closing: bool,
) -> Result<Element> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| XmlError::Parse {
            position: reader.buffer_position(),
            message: err.to_string(),
        })?;
        attributes.push((
            String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
            String::from_utf8_lossy(&attr.value).into_owned(),
        ));
    }
    Ok(Element {
        name,
        attributes,
        children: Vec::new(),
        self_closing,
    })
}

fn push_node(
    stack: &mut [Element],
    before_root: &mut Vec<Node>,
    after_root: &mut Vec<Node>,
    root: &Option<Element>,
    node: Node,
) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    } else if root.is_none() {
        before_root.push(node);
    } else {
        after_root.push(node);
    }
}

/// Local part of a possibly-prefixed name
pub fn local_name(name: &str) -> &str {
    match name.rfind(':') {
        Some(idx) => &name[idx + 1..],
        None => name,
    }
}

/// Escape text content for embedding in markup
pub fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Expand the predefined entities and numeric character references
pub fn unescape_text(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        let end = match rest.find(';') {
            Some(e) => e,
            None => {
                out.push_str(rest);
                return out;
            }
        };
        let entity = &rest[1..end];
        match entity {
            "amp" => out.push('&'),
            "lt" => out.push('<'),
            "gt" => out.push('>'),
            "quot" => out.push('"'),
            "apos" => out.push('\''),
            _ => {
                let parsed = entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|h| u32::from_str_radix(h, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                    .and_then(char::from_u32);
                match parsed {
                    Some(c) => out.push(c),
                    None => out.push_str(&rest[..=end]),
                }
            }
        }
        rest = &rest[end + 1..];
    }
    out.push_str(rest);
    out
}
