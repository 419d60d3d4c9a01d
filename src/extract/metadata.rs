//! Book metadata from the landing page.
//!
//! The site has no structured metadata, so this is line-position text mining
//! over the "Book Information" tab: first line is the title, second the
//! subtitle, and marker words identify the editor and acknowledgment lines.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::dom::{Dom, NodeId, parse_fragment};
use crate::model::{BookMetadata, UNKNOWN_TITLE};
use crate::sanitize::sanitize;
use crate::util::resolve_url;

/// Markers of an "edited by" / "compiled by" line.
const EDITOR_MARKERS: &[&str] = &["সম্পাদনা", "সঙ্কলন"];

/// Marker of an acknowledgments line.
const ACKNOWLEDGMENT_MARKER: &str = "কৃতজ্ঞতা";

/// Class of the featured image element.
const COVER_CLASS: &str = "entry-image";

static TAB_CONTENT_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ld-tab-content-\d+$").expect("TAB_CONTENT_ID: hardcoded regex is valid")
});

/// Extract [`BookMetadata`] from a parsed landing page.
///
/// Never fails: missing pieces stay `None` and the title falls back to the
/// first `<h1>`, then the page `<title>`, then [`UNKNOWN_TITLE`].
pub fn extract_metadata(page: &Dom, source_url: &str) -> BookMetadata {
    let root = page.document();
    let page_title = page
        .find_by_tag(root, "title")
        .map(|id| page.text(id).trim().to_string())
        .filter(|t| !t.is_empty());

    let mut meta = BookMetadata::new(String::new(), source_url);
    meta.filename_title = page_title.clone();

    if let Some(container) = find_metadata_container(page) {
        read_info_block(page, container, &mut meta);
    }

    if meta.title.is_empty() {
        meta.title = page
            .find_by_tag(root, "h1")
            .map(|h1| page.collapsed_text(h1))
            .filter(|t| !t.is_empty())
            .or(page_title)
            .unwrap_or_else(|| UNKNOWN_TITLE.to_string());
    }

    meta.cover_image_url = find_cover_url(page, source_url);

    debug!(title = %meta.title, cover = ?meta.cover_image_url, "extracted metadata");
    meta
}

fn find_metadata_container(page: &Dom) -> Option<NodeId> {
    page.find(page.document(), |dom, id| {
        dom.element_id(id).is_some_and(|v| TAB_CONTENT_ID.is_match(v))
    })
}

/// Fill title, subtitle, editors, acknowledgments and the intro markup from the
/// metadata container.
fn read_info_block(page: &Dom, container: NodeId, meta: &mut BookMetadata) {
    let cleaned = sanitize(&page.inner_xhtml(container));
    let fragment = parse_fragment(&cleaned);
    let lines = fragment
        .body()
        .map(|body| fragment.text_lines(body))
        .unwrap_or_default();

    if !cleaned.trim().is_empty() {
        meta.intro_body_markup = Some(cleaned);
    }

    apply_info_lines(&lines, meta);
}

/// Apply the line rules. Later marker lines overwrite earlier ones.
fn apply_info_lines(lines: &[String], meta: &mut BookMetadata) {
    if let Some(first) = lines.first() {
        meta.title = first.clone();
    }
    if let Some(second) = lines.get(1) {
        meta.subtitle = Some(second.clone());
    }
    for line in lines {
        if EDITOR_MARKERS.iter().any(|m| line.contains(m)) {
            meta.editors = Some(line.clone());
        }
        if line.contains(ACKNOWLEDGMENT_MARKER) {
            meta.acknowledgments = Some(line.clone());
        }
    }
}

fn find_cover_url(page: &Dom, source_url: &str) -> Option<String> {
    let image = page.find(page.document(), |dom, id| {
        dom.is_tag(id, "img") && dom.has_class(id, COVER_CLASS)
    })?;
    let raw = page
        .attr(image, "data-src")
        .filter(|v| !v.trim().is_empty())
        .or_else(|| page.attr(image, "src"))?;
    resolve_url(source_url, raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_document;

    const URL: &str = "https://www.ebanglalibrary.com/books/agami/";

    fn extract(html: &str) -> BookMetadata {
        extract_metadata(&parse_document(html), URL)
    }

    #[test]
    fn test_reads_info_lines() {
        let meta = extract(
            r#"<html><head><title>আগামী রাত্রির উপাখ্যান – eBangla Library</title></head><body>
            <div id="ld-tab-content-1234" class="ld-tab-content">
              <p>আগামী রাত্রির উপাখ্যান</p>
              <p>বিজ্ঞান কল্পকাহিনী</p>
              <p>সম্পাদনা : রহিম</p>
              <p>কৃতজ্ঞতা : করিম</p>
              <button class="simplefavorite-button">Favorite</button>
            </div></body></html>"#,
        );
        assert_eq!(meta.title, "আগামী রাত্রির উপাখ্যান");
        assert_eq!(meta.subtitle.as_deref(), Some("বিজ্ঞান কল্পকাহিনী"));
        assert_eq!(meta.editors.as_deref(), Some("সম্পাদনা : রহিম"));
        assert_eq!(meta.acknowledgments.as_deref(), Some("কৃতজ্ঞতা : করিম"));
        assert_eq!(
            meta.filename_title.as_deref(),
            Some("আগামী রাত্রির উপাখ্যান – eBangla Library")
        );
        let intro = meta.intro_body_markup.unwrap();
        assert!(intro.contains("<p>বিজ্ঞান কল্পকাহিনী</p>"));
        assert!(!intro.contains("Favorite"));
        assert_eq!(meta.source_url, URL);
    }

    #[test]
    fn test_compiled_by_marker_and_last_match_wins() {
        let meta = extract(
            r#"<div id="ld-tab-content-7"><p>Title</p><p>সম্পাদনা ১</p><p>সঙ্কলন ২</p></div>"#,
        );
        assert_eq!(meta.subtitle.as_deref(), Some("সম্পাদনা ১"));
        assert_eq!(meta.editors.as_deref(), Some("সঙ্কলন ২"));
    }

    #[test]
    fn test_lines_split_on_newlines_within_text() {
        let meta = extract("<div id=\"ld-tab-content-1\">  Title\n\n  Sub  <br>Third</div>");
        assert_eq!(meta.title, "Title");
        assert_eq!(meta.subtitle.as_deref(), Some("Sub"));
    }

    #[test]
    fn test_container_id_must_be_numbered() {
        let meta = extract(r#"<div id="ld-tab-content-x"><p>Nope</p></div><h1>Fallback</h1>"#);
        assert_eq!(meta.title, "Fallback");
        assert_eq!(meta.intro_body_markup, None);
    }

    #[test]
    fn test_falls_back_to_h1() {
        let meta = extract("<html><body><h1>Boier Naam</h1><p>x</p></body></html>");
        assert_eq!(meta.title, "Boier Naam");
        assert_eq!(meta.subtitle, None);
        assert_eq!(meta.editors, None);
        assert_eq!(meta.acknowledgments, None);
        assert_eq!(meta.filename_title, None);
    }

    #[test]
    fn test_falls_back_to_page_title_then_unknown() {
        let meta = extract("<html><head><title> Page Title </title></head><body></body></html>");
        assert_eq!(meta.title, "Page Title");
        assert_eq!(extract("<p>nothing</p>").title, UNKNOWN_TITLE);
    }

    #[test]
    fn test_cover_prefers_data_src_and_resolves() {
        let meta = extract(
            r#"<img class="attachment-post-thumbnail entry-image" src="data:image/gif;base64,R0lG" data-src="/wp-content/uploads/cover.webp">"#,
        );
        assert_eq!(
            meta.cover_image_url.as_deref(),
            Some("https://www.ebanglalibrary.com/wp-content/uploads/cover.webp")
        );

        let meta = extract(r#"<img class="entry-image" src="https://cdn.example/c.jpg">"#);
        assert_eq!(meta.cover_image_url.as_deref(), Some("https://cdn.example/c.jpg"));
        assert_eq!(extract("<img src=\"x.jpg\">").cover_image_url, None);
    }

    #[test]
    fn test_cover_skips_wrapper_carrying_the_class() {
        let meta = extract(
            r#"<div class="post-thumbnail entry-image"><img class="entry-image" src="/c.jpg"></div>"#,
        );
        assert_eq!(
            meta.cover_image_url.as_deref(),
            Some("https://www.ebanglalibrary.com/c.jpg")
        );
    }
}
