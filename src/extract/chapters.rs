//! Chapter discovery on the landing page.
//!
//! The site serves two templates. Newer books inline every chapter under
//! `<h2>` markers inside the `<article>` ([`Layout::Direct`]); older ones are
//! LearnDash courses whose lessons and topics are separate pages
//! ([`Layout::Linked`]). Direct is tried first; Linked is the fallback.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::dom::{Dom, NodeId};
use crate::model::ChapterDescriptor;
use crate::sanitize::sanitize;
use crate::util::resolve_url;

/// Page template in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Chapter text is inline under heading markers.
    Direct,
    /// Chapters are separate lesson/topic pages.
    Linked,
}

/// "Chapter" in Bengali, decomposed and precomposed spellings.
const CHAPTER_MARKERS: &[&str] = &[
    "\u{0985}\u{09A7}\u{09CD}\u{09AF}\u{09BE}\u{09AF}\u{09BC}",
    "\u{0985}\u{09A7}\u{09CD}\u{09AF}\u{09BE}\u{09DF}",
];

/// Headings inside the article that never start a chapter.
const SKIPPED_HEADINGS: &[&str] = &["Book Information", "সারাংশ", "Reader Interactions"];

const LESSON_ITEM_CLASS: &str = "ld-item-list-item";
const EXPANDABLE_CLASS: &str = "ld-expandable";
const ITEM_NAME_CLASS: &str = "ld-item-name";
const LESSON_PATH: &str = "/lessons/";
const TOPIC_PATH: &str = "/topics/";

static POST_CONTAINER_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^learndash_post_\d+$").expect("POST_CONTAINER_ID: hardcoded regex is valid")
});

static TOPIC_COUNTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*\d+\s*Topics?\s*$").expect("TOPIC_COUNTER: hardcoded regex is valid")
});

/// Decide which template the page uses.
///
/// Direct only when the article has a chapter-marker heading that actually
/// carries paragraphs; anything else is treated as Linked.
pub fn detect_layout(page: &Dom) -> Layout {
    if direct_sections(page).is_empty() {
        Layout::Linked
    } else {
        Layout::Direct
    }
}

/// Ordered chapter descriptors for the landing page, in document order.
///
/// Returns the layout that produced them alongside. An empty list means
/// neither template matched.
pub fn locate_chapters(page: &Dom, base_url: &str) -> (Layout, Vec<ChapterDescriptor>) {
    let direct = direct_chapters(page);
    if !direct.is_empty() {
        debug!(count = direct.len(), "direct layout");
        return (Layout::Direct, direct);
    }
    let linked = linked_chapters(page, base_url);
    debug!(count = linked.len(), "linked layout");
    (Layout::Linked, linked)
}

/// Whether a heading text marks a chapter.
fn is_chapter_heading(text: &str) -> bool {
    CHAPTER_MARKERS.iter().any(|m| text.contains(m)) || text.starts_with("Chapter")
}

/// `(title, paragraphs)` per inline chapter. Empty unless the article has at
/// least one chapter-marker heading.
fn direct_sections(page: &Dom) -> Vec<(String, Vec<NodeId>)> {
    let Some(article) = page.find_by_tag(page.document(), "article") else {
        return Vec::new();
    };
    let headings: Vec<(NodeId, String)> = page
        .find_all_by_tag(article, "h2")
        .into_iter()
        .map(|h| (h, page.collapsed_text(h)))
        .collect();

    if !headings.iter().any(|(_, text)| is_chapter_heading(text)) {
        return Vec::new();
    }

    headings
        .into_iter()
        .filter(|(_, title)| !title.is_empty() && !SKIPPED_HEADINGS.contains(&title.as_str()))
        .filter_map(|(heading, title)| {
            let paragraphs = section_paragraphs(page, heading);
            (!paragraphs.is_empty()).then_some((title, paragraphs))
        })
        .collect()
}

/// `<p>` siblings following `heading` up to the next `<h2>`.
fn section_paragraphs(page: &Dom, heading: NodeId) -> Vec<NodeId> {
    let mut paragraphs = Vec::new();
    let mut current = page.next_element_sibling(heading);
    while let Some(node) = current {
        if page.is_tag(node, "h2") {
            break;
        }
        if page.is_tag(node, "p") {
            paragraphs.push(node);
        }
        current = page.next_element_sibling(node);
    }
    paragraphs
}

fn direct_chapters(page: &Dom) -> Vec<ChapterDescriptor> {
    direct_sections(page)
        .into_iter()
        .map(|(title, paragraphs)| {
            let raw = paragraphs
                .iter()
                .map(|&p| page.outer_xhtml(p))
                .collect::<Vec<_>>()
                .join("\n");
            ChapterDescriptor::direct(title, sanitize(&raw))
        })
        .collect()
}

/// Linked descriptors, deduplicated by absolute URL in insertion order.
struct LinkCollector<'a> {
    base_url: &'a str,
    seen: HashSet<String>,
    chapters: Vec<ChapterDescriptor>,
}

impl<'a> LinkCollector<'a> {
    fn new(base_url: &'a str) -> Self {
        Self {
            base_url,
            seen: HashSet::new(),
            chapters: Vec::new(),
        }
    }

    /// Add an anchor; empty titles, missing hrefs and repeats are ignored.
    fn push(&mut self, title: &str, href: Option<&str>) {
        let Some(href) = href else { return };
        if title.is_empty() {
            return;
        }
        let Some(url) = resolve_url(self.base_url, href) else {
            return;
        };
        if self.seen.insert(url.clone()) {
            self.chapters.push(ChapterDescriptor::linked(title, url));
        }
    }

    fn push_anchor(&mut self, page: &Dom, anchor: NodeId) {
        self.push(&page.collapsed_text(anchor), page.attr(anchor, "href"));
    }
}

fn linked_chapters(page: &Dom, base_url: &str) -> Vec<ChapterDescriptor> {
    let Some(container) = page.find(page.document(), |dom, id| {
        dom.element_id(id).is_some_and(|v| POST_CONTAINER_ID.is_match(v))
    }) else {
        return Vec::new();
    };

    let structured = lesson_list_chapters(page, container, base_url);
    if !structured.is_empty() {
        return structured;
    }

    let mut links = LinkCollector::new(base_url);
    for anchor in anchors(page, container) {
        if href_contains(page, anchor, TOPIC_PATH) || href_contains(page, anchor, LESSON_PATH) {
            links.push_anchor(page, anchor);
        }
    }
    if !links.chapters.is_empty() {
        return links.chapters;
    }

    for anchor in anchors(page, container) {
        if page.classes(anchor).any(|c| c.contains(ITEM_NAME_CLASS)) {
            links.push_anchor(page, anchor);
        }
    }
    links.chapters
}

/// Walk the LearnDash lesson list: each lesson, then its topics when expandable.
fn lesson_list_chapters(page: &Dom, container: NodeId, base_url: &str) -> Vec<ChapterDescriptor> {
    let mut links = LinkCollector::new(base_url);

    for item in page.find_all(container, |dom, id| dom.has_class(id, LESSON_ITEM_CLASS)) {
        let lesson = anchors(page, item)
            .into_iter()
            .find(|&a| href_contains(page, a, LESSON_PATH));

        if !page.has_class(item, EXPANDABLE_CLASS) {
            if let Some(anchor) = lesson {
                links.push_anchor(page, anchor);
            }
            continue;
        }

        if let Some(anchor) = lesson {
            let label = page.collapsed_text(anchor);
            let title = TOPIC_COUNTER.replace(&label, "");
            links.push(title.trim(), page.attr(anchor, "href"));
        }
        for topic in anchors(page, item) {
            if href_contains(page, topic, TOPIC_PATH) {
                links.push_anchor(page, topic);
            }
        }
    }

    links.chapters
}

fn anchors(page: &Dom, root: NodeId) -> Vec<NodeId> {
    page.find_all(root, |dom, id| dom.is_tag(id, "a") && dom.attr(id, "href").is_some())
}

fn href_contains(page: &Dom, anchor: NodeId, needle: &str) -> bool {
    page.attr(anchor, "href").is_some_and(|h| h.contains(needle))
}
