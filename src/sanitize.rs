//! Markup sanitizer.
//!
//! Strips the parts of a scraped fragment that are not book content (scripts,
//! styles, ad slots, LearnDash course chrome, the favourite button) and the
//! ARIA references that would dangle once the fragment is cut out of its page.
//! Everything else, images included, passes through. The result is XHTML, so
//! void elements come out self-closed, and raw-text elements are reduced to
//! something that parses back to the same tree.

use std::sync::LazyLock;

use regex::Regex;

use crate::dom::{Dom, NodeId, parse_fragment};

/// Elements dropped wholesale, contents included.
const REMOVED_TAGS: &[&str] = &["script", "style", "ins", "button"];

/// The "add to favourites" button injected next to every book.
const FAVORITE_BUTTON_CLASS: &str = "simplefavorite-button";

/// Raw-text elements whose text browsers never render; the text is dropped.
const UNRENDERED_TEXT_TAGS: &[&str] = &["iframe", "noembed", "noframes"];

/// Raw-text elements rendered as preformatted text; renamed to `<pre>`.
const LEGACY_PRE_TAGS: &[&str] = &["xmp", "plaintext"];

/// Attributes that reference ids elsewhere on the original page.
const ARIA_REFERENCE_ATTRS: &[&str] = &[
    "aria-labelledby",
    "aria-describedby",
    "aria-controls",
    "aria-owns",
];

/// Id of the table-of-contents widget whose `<nav>` holds in-page chapter links.
pub(crate) const TOC_CONTAINER_ID: &str = "ez-toc-container";

static AD_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:adsbygoogle|google-auto-placed|ap_container|code-block(?:-\d+)?|ai-viewport(?:-\d+)?|ai-attributes|ad-container|advertisement|quads-location)$",
    )
    .expect("AD_CLASS: hardcoded regex is valid")
});

static COURSE_UI_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^ld-(?:progress.*|tabs-navigation|tab-bar|status.*|course-status.*|expand-button|breadcrumbs.*|content-actions|navigation.*|course-navigation.*|item-list-actions|lesson-status)$",
    )
    .expect("COURSE_UI_CLASS: hardcoded regex is valid")
});

/// Sanitize a markup fragment and return it as XHTML.
///
/// Pure and idempotent: `sanitize(&sanitize(x)) == sanitize(x)`.
///
/// ```
/// use ebangla_epub::sanitize::sanitize;
///
/// let out = sanitize(r#"<p>Text<br><script>track()</script></p><div class="adsbygoogle">ad</div>"#);
/// assert_eq!(out, "<p>Text<br/></p>");
/// ```
pub fn sanitize(markup: &str) -> String {
    let mut dom = parse_fragment(markup);
    let Some(body) = dom.body() else {
        return markup.to_string();
    };
    sanitize_node(&mut dom, body);
    dom.inner_xhtml(body)
}

/// Sanitize the subtree below `root` in place. `root` itself is never removed.
pub fn sanitize_node(dom: &mut Dom, root: NodeId) {
    let doomed: Vec<NodeId> = dom
        .descendants(root)
        .filter(|&id| dom.is_element(id) && is_chrome(dom, id))
        .collect();
    for id in doomed {
        dom.detach(id);
    }

    let mut elements: Vec<NodeId> = dom
        .descendants(root)
        .filter(|&id| dom.is_element(id))
        .collect();
    elements.push(root);
    for id in elements {
        for attr in ARIA_REFERENCE_ATTRS {
            dom.remove_attr(id, attr);
        }
        normalize_raw_text(dom, id);
    }
}

/// Raw-text element content is serialized escaped, which a reparse would read back
/// as different text. Make those elements read back the same.
fn normalize_raw_text(dom: &mut Dom, id: NodeId) {
    let Some(tag) = dom.element_name(id).map(|t| t.to_string()) else {
        return;
    };
    if UNRENDERED_TEXT_TAGS.contains(&tag.as_str()) {
        let children: Vec<NodeId> = dom.children(id).collect();
        for child in children {
            dom.detach(child);
        }
    } else if LEGACY_PRE_TAGS.contains(&tag.as_str()) {
        dom.rename_element(id, "pre");
    }
}

/// Whether an element is non-content markup.
fn is_chrome(dom: &Dom, id: NodeId) -> bool {
    let Some(tag) = dom.element_name(id) else {
        return false;
    };
    let tag = tag.as_ref();

    if REMOVED_TAGS.contains(&tag) {
        return true;
    }
    if tag == "nav" && !is_toc_nav(dom, id) {
        return true;
    }
    dom.classes(id).any(|class| {
        class == FAVORITE_BUTTON_CLASS || AD_CLASS.is_match(class) || COURSE_UI_CLASS.is_match(class)
    })
}

/// A `<nav>` belonging to the in-page table of contents.
fn is_toc_nav(dom: &Dom, nav: NodeId) -> bool {
    std::iter::once(nav)
        .chain(dom.ancestors(nav))
        .any(|id| dom.element_id(id) == Some(TOC_CONTAINER_ID) || dom.classes(id).any(|c| c.starts_with("ez-toc")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_removes_scripts_styles_buttons_and_ins() {
        let input = r#"<p>one</p><script>var a = "<p>";</script><style>p{}</style><button>Go</button><ins class="x">ad</ins><p>two</p>"#;
        assert_eq!(sanitize(input), "<p>one</p><p>two</p>");
    }

    #[test]
    fn test_normalizes_void_elements() {
        assert_eq!(
            sanitize(r#"<p>a<br>b</p><hr><img src="a.jpg">"#),
            r#"<p>a<br/>b</p><hr/><img src="a.jpg"/>"#
        );
    }

    #[test]
    fn test_removes_favorite_button_wrapper() {
        let input = r#"<div><span class="simplefavorite-button active">Favorite</span><p>Body</p></div>"#;
        assert_eq!(sanitize(input), "<div><p>Body</p></div>");
    }

    #[test]
    fn test_keeps_toc_nav_only() {
        let input = concat!(
            r#"<nav class="site-nav"><a href="/">Home</a></nav>"#,
            r##"<div id="ez-toc-container"><nav><ul><li><a href="#ch1">Ch 1</a></li></ul></nav></div>"##,
        );
        let out = sanitize(input);
        assert!(!out.contains("Home"));
        assert!(out.contains(r##"<a href="#ch1">Ch 1</a>"##));
    }

    #[test]
    fn test_removes_ads_and_course_ui() {
        let input = concat!(
            r#"<div class="code-block code-block-3"><p>sponsored</p></div>"#,
            r#"<div class="google-auto-placed ap_container">auto</div>"#,
            r#"<div class="ld-progress ld-progress-inline">50%</div>"#,
            r#"<div class="ld-tabs-navigation">tabs</div>"#,
            r#"<span class="ld-status-icon ld-status-complete"></span>"#,
            r#"<p class="lead">kept</p>"#,
        );
        assert_eq!(sanitize(input), r#"<p class="lead">kept</p>"#);
    }

    #[test]
    fn test_ld_content_classes_survive() {
        let input = r#"<div class="ld-tab-content entry-content"><p>text</p></div>"#;
        assert_eq!(sanitize(input), input);
    }

    #[test]
    fn test_strips_aria_references() {
        let input = r#"<div role="tabpanel" aria-labelledby="tab-1" aria-controls="x" aria-label="Intro"><p aria-describedby="d" aria-owns="o">t</p></div>"#;
        assert_eq!(
            sanitize(input),
            r#"<div role="tabpanel" aria-label="Intro"><p>t</p></div>"#
        );
    }

    #[test]
    fn test_keeps_images_and_text() {
        let input = r#"<figure><img data-src="https://x/a.jpg" alt="a"><figcaption>cap</figcaption></figure>"#;
        assert_eq!(
            sanitize(input),
            r#"<figure><img data-src="https://x/a.jpg" alt="a"/><figcaption>cap</figcaption></figure>"#
        );
    }

    #[test]
    fn test_absent_targets_are_a_no_op() {
        let input = "<p>নিরাপদ লেখা</p>";
        assert_eq!(sanitize(input), input);
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn test_idempotent_on_messy_input() {
        let input = r#"<p>a<b>b<i>c</b>d</i><br><table>x<tr><td>1<script>y</script></table><nav>n</nav>"#;
        let once = sanitize(input);
        assert_eq!(sanitize(&once), once);
    }

    #[test]
    fn test_unrendered_raw_text_is_dropped() {
        for (input, expected) in [
            ("<iframe>a&amp;b</iframe>", "<iframe></iframe>"),
            (r#"<iframe src="https://v.example/e">x</iframe>"#, r#"<iframe src="https://v.example/e"></iframe>"#),
            ("<noembed>x&lt;y</noembed>", "<noembed></noembed>"),
            ("<noframes><p>f</p></noframes>", "<noframes></noframes>"),
        ] {
            let once = sanitize(input);
            assert_eq!(once, expected);
            assert_eq!(sanitize(&once), once);
        }
    }

    #[test]
    fn test_xmp_becomes_pre() {
        let once = sanitize("<xmp><b>bold</b> & co</xmp>");
        assert_eq!(once, "<pre>&lt;b&gt;bold&lt;/b&gt; &amp; co</pre>");
        assert_eq!(sanitize(&once), once);
    }

    #[test]
    fn test_preformatted_leading_newline_is_stable() {
        let once = sanitize("<pre>\n\nline</pre>");
        assert_eq!(once, "<pre>\n\nline</pre>");
        assert_eq!(sanitize(&once), once);
    }

    #[test]
    fn test_sanitize_node_keeps_root() {
        let mut dom = parse_fragment(r#"<nav class="menu"><p>inside</p><script>x</script></nav>"#);
        let nav = dom.find_by_tag(dom.document(), "nav").unwrap();
        sanitize_node(&mut dom, nav);
        assert_eq!(dom.outer_xhtml(nav), r#"<nav class="menu"><p>inside</p></nav>"#);
    }

    fn fragment() -> impl Strategy<Value = String> {
        let tags = vec![
            "p", "div", "span", "b", "i", "em", "a", "h2", "ul", "li", "nav", "script", "style",
            "button", "ins", "table", "tr", "td", "blockquote", "figure", "pre",
        ];
        let attrs = vec![
            "",
            " class=\"adsbygoogle\"",
            " class=\"ld-progress-bar x\"",
            " class=\"entry-content\"",
            " id=\"ez-toc-container\"",
            " aria-controls=\"tab-1\"",
            " class=\"simplefavorite-button\"",
        ];
        let piece = prop_oneof![
            (prop::sample::select(tags.clone()), prop::sample::select(attrs))
                .prop_map(|(t, a)| format!("<{t}{a}>")),
            prop::sample::select(tags).prop_map(|t| format!("</{t}>")),
            prop::sample::select(vec!["<br>", "<hr>", "<img src=\"a.jpg\">"]).prop_map(str::to_string),
            "[a-z অআ১&> \n]{0,8}",
        ];
        prop::collection::vec(piece, 0..24).prop_map(|pieces| pieces.concat())
    }

    proptest! {
        #[test]
        fn prop_sanitize_is_idempotent(input in fragment()) {
            let once = sanitize(&input);
            prop_assert_eq!(sanitize(&once), once);
        }

        #[test]
        fn prop_removed_elements_never_survive(input in fragment()) {
            let out = sanitize(&input);
            for needle in ["<script", "<style", "<button", "<ins", "adsbygoogle", "aria-controls", "ld-progress"] {
                prop_assert!(!out.contains(needle), "{} survived in {}", needle, out);
            }
        }
    }
}
