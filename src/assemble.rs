//! Document assembly: metadata, cover, intro page and chapters into a [`Book`].

use tracing::{info, warn};

use crate::book::{Book, CSS_MEDIA_TYPE, Metadata};
use crate::config::ConvertConfig;
use crate::dom::{escape_attr, escape_text, parse_fragment};
use crate::extract::fetch_chapter_body;
use crate::fetch::Fetch;
use crate::images::resolve_image;
use crate::model::{BookMetadata, ChapterDescriptor, ChapterSource, EmbeddedAsset, OutputChapter};
use crate::util::resolve_url;

pub const STYLESHEET_HREF: &str = "style.css";
pub const INTRO_HREF: &str = "intro.xhtml";
pub const INTRO_TITLE: &str = "Book Information";

const PROJECT_NAME: &str = "eBangla Library to EPUB Converter";
const PROJECT_URL: &str = "https://github.com/hackerslash/ebanglalibrary_to_epub";

/// Attributes a lazy-loading theme may put the real image URL in, best first.
const LAZY_SRC_ATTRS: &[&str] = &["data-src", "data-lazy-src", "data-original"];

/// Responsive/lazy attributes that would point readers back at the website.
const STRIPPED_IMAGE_ATTRS: &[&str] = &[
    "data-src",
    "data-lazy-src",
    "data-original",
    "srcset",
    "data-srcset",
    "data-lazy-srcset",
    "sizes",
    "data-sizes",
    "loading",
];

const STYLESHEET: &str = r#"body {
    font-family: 'Noto Sans Bengali', 'Kalpurush', 'SolaimanLipi', sans-serif;
    line-height: 1.6;
    margin: 2em;
}
h1, h2, h3 {
    text-align: center;
    margin-bottom: 1em;
}
p {
    text-align: justify;
    margin-bottom: 0.5em;
}
img {
    max-width: 100%;
    height: auto;
}
.attribution {
    text-align: center;
    font-size: 0.9em;
    margin-top: 2em;
}
"#;

/// Builds the [`Book`] for one run. Holds no state between calls.
pub struct Assembler<'a> {
    fetcher: &'a dyn Fetch,
    language: String,
}

impl<'a> Assembler<'a> {
    pub fn new(fetcher: &'a dyn Fetch, config: &ConvertConfig) -> Self {
        Self {
            fetcher,
            language: config.language.clone(),
        }
    }

    /// Assemble the package: cover, "Book Information", then every chapter
    /// whose body turned out non-empty.
    ///
    /// Image and chapter failures are logged and skipped; this never fails.
    pub fn assemble(&self, metadata: &BookMetadata, chapters: &[ChapterDescriptor]) -> Book {
        let mut package = Metadata::new(&metadata.title)
            .with_identifier(&metadata.source_url)
            .with_language(&self.language);
        if let Some(editors) = &metadata.editors {
            package = package.with_author(editors);
        }
        let mut book = Book::new(package);

        book.add_resource(STYLESHEET_HREF, STYLESHEET.as_bytes().to_vec(), CSS_MEDIA_TYPE);

        if let Some(cover) = self.cover(metadata) {
            book.set_cover(cover.filename, cover.bytes, cover.media_type);
        }

        let (intro, assets) = self.intro_page(metadata);
        for asset in assets {
            book.add_resource(asset.filename, asset.bytes, asset.media_type);
        }
        book.add_page(INTRO_TITLE, INTRO_HREF, intro);

        for chapter in self.chapters(chapters) {
            book.add_page(chapter.title, chapter.filename, chapter.html_body);
        }

        book
    }

    fn cover(&self, metadata: &BookMetadata) -> Option<EmbeddedAsset> {
        let url = metadata.cover_image_url.as_deref()?;
        info!(url, "downloading cover image");
        match resolve_image(self.fetcher, url) {
            Ok(image) => Some(EmbeddedAsset {
                filename: format!("cover.{}", image.extension),
                bytes: image.bytes,
                media_type: image.media_type.to_string(),
            }),
            Err(e) => {
                warn!(url, error = %e, "cover image skipped");
                None
            }
        }
    }

    /// The "Book Information" page and the images it embeds.
    fn intro_page(&self, metadata: &BookMetadata) -> (String, Vec<EmbeddedAsset>) {
        let (mut body, assets) = match metadata
            .intro_body_markup
            .as_deref()
            .filter(|m| !m.trim().is_empty())
        {
            Some(markup) => self.embed_intro_images(markup, &metadata.source_url),
            None => (synthesize_intro(metadata), Vec::new()),
        };
        body.push_str(&attribution_footer());
        (xhtml_page(&metadata.title, &body, &self.language), assets)
    }

    /// Download every image in the intro markup and point it at the packaged
    /// copy. Images that cannot be resolved are removed.
    fn embed_intro_images(&self, markup: &str, base_url: &str) -> (String, Vec<EmbeddedAsset>) {
        let mut dom = parse_fragment(markup);
        let Some(body) = dom.body() else {
            return (markup.to_string(), Vec::new());
        };

        let mut assets = Vec::new();
        for img in dom.find_all_by_tag(body, "img") {
            let source = LAZY_SRC_ATTRS
                .iter()
                .chain(std::iter::once(&"src"))
                .filter_map(|attr| dom.attr(img, attr))
                .find(|v| !v.trim().is_empty())
                .and_then(|v| resolve_url(base_url, v));

            let Some(url) = source else {
                warn!("intro image without a source dropped");
                dom.detach(img);
                continue;
            };

            match resolve_image(self.fetcher, &url) {
                Ok(image) => {
                    let filename = format!("intro_image_{}.{}", assets.len() + 1, image.extension);
                    dom.set_attr(img, "src", &filename);
                    for attr in STRIPPED_IMAGE_ATTRS {
                        dom.remove_attr(img, attr);
                    }
                    if dom.attr(img, "alt").is_none() {
                        dom.set_attr(img, "alt", "");
                    }
                    assets.push(EmbeddedAsset {
                        filename,
                        bytes: image.bytes,
                        media_type: image.media_type.to_string(),
                    });
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "intro image dropped");
                    dom.detach(img);
                }
            }
        }

        (dom.inner_xhtml(body), assets)
    }

    /// Resolve chapter bodies in order. Chapter `n` keeps the 1-based index of
    /// its descriptor, so skipped chapters leave gaps rather than renumbering.
    fn chapters(&self, chapters: &[ChapterDescriptor]) -> Vec<OutputChapter> {
        let total = chapters.len();
        let mut out = Vec::with_capacity(total);

        for (i, chapter) in chapters.iter().enumerate() {
            let number = i + 1;
            info!("Processing chapter {number}/{total}: {}", chapter.title);

            let body = match &chapter.source {
                ChapterSource::Direct { body } => Some(body.clone()),
                ChapterSource::Linked { url } => fetch_chapter_body(self.fetcher, url),
            };

            match body.filter(|b| !b.trim().is_empty()) {
                Some(body) => {
                    let content = format!("<h1>{}</h1>\n{}", escape_text(&chapter.title), body);
                    out.push(OutputChapter {
                        title: chapter.title.clone(),
                        filename: format!("chapter_{number}.xhtml"),
                        html_body: xhtml_page(&chapter.title, &content, &self.language),
                    });
                }
                None => warn!(chapter = number, title = %chapter.title, "no content, chapter skipped"),
            }
        }

        out
    }
}

/// Intro body built from the individual metadata fields.
fn synthesize_intro(metadata: &BookMetadata) -> String {
    let mut body = format!("<h1>{}</h1>\n", escape_text(&metadata.title));
    if let Some(subtitle) = &metadata.subtitle {
        body.push_str(&format!("<h2>{}</h2>\n", escape_text(subtitle)));
    }
    for line in [&metadata.editors, &metadata.acknowledgments].into_iter().flatten() {
        body.push_str(&format!("<p>{}</p>\n", escape_text(line)));
    }
    body
}

fn attribution_footer() -> String {
    format!(
        "\n<hr/>\n<p class=\"attribution\"><em>This EPUB was created using <a href=\"{PROJECT_URL}\">{PROJECT_NAME}</a></em></p>"
    )
}

/// Wrap body markup in a standalone XHTML document.
pub fn xhtml_page(title: &str, body: &str, language: &str) -> String {
    let lang = escape_attr(language);
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" lang="{lang}" xml:lang="{lang}">
<head>
  <title>{title}</title>
  <link rel="stylesheet" type="text/css" href="{STYLESHEET_HREF}"/>
</head>
<body>
{body}
</body>
</html>
"#,
        title = escape_text(title),
    )
}
