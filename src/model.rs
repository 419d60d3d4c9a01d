//! Data carried between the pipeline stages.

use serde::Serialize;

/// Title used when the landing page offers nothing better.
pub const UNKNOWN_TITLE: &str = "Unknown Book";

/// Book-level metadata scraped from the landing page.
///
/// Built once by [`extract_metadata`](crate::extract::extract_metadata) and
/// only read afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookMetadata {
    /// Display title; never empty.
    pub title: String,
    pub subtitle: Option<String>,
    pub editors: Option<String>,
    pub acknowledgments: Option<String>,
    /// Sanitized inner markup of the metadata block.
    pub intro_body_markup: Option<String>,
    /// Absolute URL of the cover image.
    pub cover_image_url: Option<String>,
    pub source_url: String,
    /// Raw page `<title>`; only used to name the output file.
    pub filename_title: Option<String>,
}

impl BookMetadata {
    /// Metadata holding only a title and the source URL.
    pub fn new(title: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: None,
            editors: None,
            acknowledgments: None,
            intro_body_markup: None,
            cover_image_url: None,
            source_url: source_url.into(),
            filename_title: None,
        }
    }

    /// The string the output file name is derived from.
    pub fn file_stem_source(&self) -> &str {
        self.filename_title.as_deref().unwrap_or(&self.title)
    }
}

/// Where a chapter's body comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ChapterSource {
    /// Body was inline on the landing page (already sanitized).
    Direct { body: String },
    /// Body lives on its own page.
    Linked { url: String },
}

/// One chapter before its body has necessarily been fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChapterDescriptor {
    pub title: String,
    #[serde(flatten)]
    pub source: ChapterSource,
}

impl ChapterDescriptor {
    pub fn direct(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            source: ChapterSource::Direct { body: body.into() },
        }
    }

    pub fn linked(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            source: ChapterSource::Linked { url: url.into() },
        }
    }

    /// URL of a linked chapter.
    pub fn url(&self) -> Option<&str> {
        match &self.source {
            ChapterSource::Linked { url } => Some(url),
            ChapterSource::Direct { .. } => None,
        }
    }
}

/// A binary resource packaged into the EPUB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedAsset {
    /// Name inside the container, unique per book (`cover.jpg`, `intro_image_1.jpg`, ...).
    pub filename: String,
    pub bytes: Vec<u8>,
    pub media_type: String,
}

/// A page of the finished book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputChapter {
    pub title: String,
    pub filename: String,
    /// Complete XHTML document.
    pub html_body: String,
}
