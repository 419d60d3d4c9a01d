//! Chapter bodies for the linked layout.

use tracing::{debug, warn};

use crate::dom::{Dom, NodeId, parse_document, parse_fragment};
use crate::fetch::Fetch;
use crate::sanitize::{TOC_CONTAINER_ID, sanitize_node};

const POST_CONTENT_CLASS: &str = "post-content";
const TAB_CONTENT_CLASS: &str = "ld-tab-content";
const ENTRY_CONTENT_CLASS: &str = "entry-content";

/// Fetch a chapter page and extract its sanitized body.
///
/// Transport failures and pages without a content container both yield `None`
/// after a warning; the caller skips the chapter.
pub fn fetch_chapter_body(fetcher: &dyn Fetch, url: &str) -> Option<String> {
    debug!(url, "fetching chapter");
    let html = match fetcher.fetch_text(url) {
        Ok(html) => html,
        Err(e) => {
            warn!(url, error = %e, "chapter fetch failed");
            return None;
        }
    };
    let body = extract_chapter_body(&parse_document(&html));
    if body.is_none() {
        warn!(url, "no content container on chapter page");
    }
    body
}

/// Sanitized outer markup of the chapter's content container.
///
/// Containers are tried in order: in-page TOC plus post content, post content,
/// `ld-tab-content entry-content`, `entry-content`, then anything whose class
/// mentions `ld-tab-content`. A candidate left with neither text nor an image
/// once sanitized is passed over.
pub fn extract_chapter_body(page: &Dom) -> Option<String> {
    let root = page.document();
    let post = page
        .find_all(root, |dom, id| dom.has_class(id, POST_CONTENT_CLASS))
        .into_iter()
        .find_map(|id| cleaned(page, id).map(|markup| (id, markup)));

    if let Some((post, markup)) = post {
        let toc = page
            .find(root, |dom, id| dom.element_id(id) == Some(TOC_CONTAINER_ID))
            .filter(|&toc| !page.ancestors(toc).any(|a| a == post))
            .and_then(|toc| cleaned(page, toc));
        return Some(match toc {
            Some(toc) => format!("{toc}\n{markup}"),
            None => markup,
        });
    }

    let candidates: [fn(&Dom, NodeId) -> bool; 3] =
        [is_tab_entry_content, is_entry_content, mentions_tab_content];

    candidates.into_iter().find_map(|matches| {
        page.find_all(root, matches)
            .into_iter()
            .find_map(|id| cleaned(page, id))
    })
}

/// Sanitized outer markup of `id`, or `None` if nothing visible survives.
fn cleaned(page: &Dom, id: NodeId) -> Option<String> {
    let mut fragment = parse_fragment(&page.outer_xhtml(id));
    let body = fragment.body()?;
    sanitize_node(&mut fragment, body);
    fragment
        .has_visible_content(body)
        .then(|| fragment.inner_xhtml(body))
}

fn is_tab_entry_content(dom: &Dom, id: NodeId) -> bool {
    dom.has_class(id, TAB_CONTENT_CLASS) && dom.has_class(id, ENTRY_CONTENT_CLASS)
}

fn is_entry_content(dom: &Dom, id: NodeId) -> bool {
    dom.has_class(id, ENTRY_CONTENT_CLASS)
}

fn mentions_tab_content(dom: &Dom, id: NodeId) -> bool {
    dom.attr(id, "class")
        .is_some_and(|c| c.contains(TAB_CONTENT_CLASS))
}
