//! The generic serializer.
//!
//! Writes a [`Document`] back to text. Raw text, comments, and CDATA are
//! emitted verbatim, so well-formed content round-trips. What does NOT
//! round-trip, on purpose: the XML declaration is rewritten in canonical
//! form and attributes are always double-quoted. Callers that need those
//! spans byte-exact splice them back from the original text.

use crate::{Document, Element, Node};

/// How to close an element with no children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyElementStyle {
    /// `<name/>`
    Compact,
    /// `<name />`
    Spaced,
}

/// Serialize a whole document
pub fn write_document(doc: &Document, style: EmptyElementStyle) -> String {
    let mut out = String::new();
    for node in &doc.before_root {
        write_node(&mut out, node, style);
    }
    write_element_into(&mut out, &doc.root, style);
    for node in &doc.after_root {
        write_node(&mut out, node, style);
    }
    out
}

/// Serialize a single element, markup only
pub fn write_element(element: &Element, style: EmptyElementStyle) -> String {
    let mut out = String::new();
    write_element_into(&mut out, element, style);
    out
}

fn write_node(out: &mut String, node: &Node, style: EmptyElementStyle) {
    match node {
        Node::Element(e) => write_element_into(out, e, style),
        Node::Text(t) => out.push_str(t),
        Node::Comment(t) => {
            out.push_str("<!--");
            out.push_str(t);
            out.push_str("-->");
        }
        Node::CData(t) => {
            out.push_str("<![CDATA[");
            out.push_str(t);
            out.push_str("]]>");
        }
        Node::ProcessingInstruction(t) => {
            out.push_str("<?");
            out.push_str(t);
            out.push_str("?>");
        }
        Node::DocType(t) => {
            out.push_str("<!DOCTYPE ");
            out.push_str(t);
            out.push('>');
        }
        Node::Decl(t) => {
            out.push_str("<?");
            out.push_str(t);
            out.push_str("?>");
        }
    }
}

fn write_element_into(out: &mut String, element: &Element, style: EmptyElementStyle) {
    out.push('<');
    out.push_str(&element.name);
    for (key, value) in &element.attributes {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(value);
        out.push('"');
    }
    if element.children.is_empty() && element.self_closing {
        match style {
            EmptyElementStyle::Compact => out.push_str("/>"),
            EmptyElementStyle::Spaced => out.push_str(" />"),
        }
        return;
    }
    out.push('>');
    for child in &element.children {
        write_node(out, child, style);
    }
    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}
