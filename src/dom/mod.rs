//! HTML parsing into a queryable, mutable arena tree.
//!
//! ```
//! use ebangla_epub::dom::parse_fragment;
//!
//! let dom = parse_fragment("<p>Hello<br>World</p>");
//! let body = dom.body().unwrap();
//! assert_eq!(dom.inner_xhtml(body), "<p>Hello<br/>World</p>");
//! ```

mod arena;
mod serialize;
mod tree_sink;

pub use arena::{Attribute, Children, Descendants, Dom, Node, NodeData, NodeId};
pub use serialize::{escape_attr, escape_text, is_void_element};

use html5ever::driver::ParseOpts;
use html5ever::parse_document as html5ever_parse_document;
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;

use tree_sink::DomSink;

/// Parse a complete HTML page.
pub fn parse_document(html: &str) -> Dom {
    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            // Lazy-loading themes put the real <img> inside <noscript>; parse it as markup.
            scripting_enabled: false,
            ..Default::default()
        },
        ..Default::default()
    };

    html5ever_parse_document(DomSink::new(), opts)
        .from_utf8()
        .one(html.as_bytes())
        .into_dom()
}

/// Parse a fragment of HTML; its nodes end up as the children of [`Dom::body`].
pub fn parse_fragment(html: &str) -> Dom {
    let wrapped = format!("<!DOCTYPE html><html><head></head><body>{html}</body></html>");
    parse_document(&wrapped)
}
