//! XHTML serialization of arena subtrees.
//!
//! Output must survive a strict XML parser inside the EPUB container, so void
//! elements are self-closed, text and attribute values are escaped, and anything
//! XML cannot express (comments with `--`, doctypes, attribute names such as
//! `@click`) is dropped.

use html5ever::{Namespace, ns};

use super::arena::{Dom, NodeData, NodeId};

/// HTML void elements: written as `<name .../>`.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose first newline the HTML parser swallows.
const NEWLINE_EATING_ELEMENTS: &[&str] = &["pre", "textarea", "listing"];

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

impl Dom {
    /// Serialize a node including its own tag.
    pub fn outer_xhtml(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    /// Serialize the children of a node.
    pub fn inner_xhtml(&self, id: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(id) {
            self.write_node(child, &mut out);
        }
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.get(id) else {
            return;
        };

        match &node.data {
            NodeData::Text(text) => out.push_str(&escape_text(text)),
            NodeData::Element { name, attrs } => {
                let tag = name.local.as_ref();
                out.push('<');
                out.push_str(tag);

                if name.ns != ns!(html) && self.parent_namespace(id) != Some(&name.ns) {
                    out.push_str(" xmlns=\"");
                    out.push_str(&escape_attr(name.ns.as_ref()));
                    out.push('"');
                    if name.ns == ns!(svg) {
                        out.push_str(" xmlns:xlink=\"http://www.w3.org/1999/xlink\"");
                    }
                }

                let mut seen: Vec<&str> = Vec::with_capacity(attrs.len());
                for attr in attrs {
                    let attr_name = attr.name.local.as_ref();
                    if !is_xml_name(attr_name)
                        || attr_name == "xmlns"
                        || attr.name.ns == ns!(xmlns)
                        || seen.contains(&attr_name)
                    {
                        continue;
                    }
                    seen.push(attr_name);
                    out.push(' ');
                    if attr.name.ns == ns!(xml) {
                        out.push_str("xml:");
                    } else if attr.name.ns == ns!(xlink) {
                        out.push_str("xlink:");
                    }
                    out.push_str(attr_name);
                    out.push_str("=\"");
                    out.push_str(&escape_attr(&attr.value));
                    out.push('"');
                }

                if name.ns == ns!(html) && is_void_element(tag) {
                    out.push_str("/>");
                    return;
                }

                out.push('>');
                if name.ns == ns!(html)
                    && NEWLINE_EATING_ELEMENTS.contains(&tag)
                    && self.leading_text(id).is_some_and(|t| t.starts_with('\n'))
                {
                    out.push('\n');
                }
                for child in self.children(id) {
                    self.write_node(child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
            NodeData::Document => {
                for child in self.children(id) {
                    self.write_node(child, out);
                }
            }
            NodeData::Comment(_) | NodeData::Doctype { .. } => {}
        }
    }

    fn leading_text(&self, id: NodeId) -> Option<&str> {
        let first = self.children(id).next()?;
        self.text_content(first)
    }

    fn parent_namespace(&self, id: NodeId) -> Option<&Namespace> {
        let parent = self.parent(id)?;
        self.qual_name(parent).map(|q| &q.ns)
    }
}

/// Escape character data. Characters XML 1.0 cannot carry are dropped.
pub fn escape_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars().filter(|&c| is_xml_char(c)) {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            _ => result.push(c),
        }
    }
    result
}

/// Escape an attribute value for double-quoted output.
pub fn escape_attr(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars().filter(|&c| is_xml_char(c)) {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            _ => result.push(c),
        }
    }
    result
}

/// The XML 1.0 `Char` production.
fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..
    )
}

/// Conservative XML `Name` check (ASCII letters, digits, `-`, `_`, `.`).
fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
