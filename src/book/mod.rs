//! In-memory EPUB package: metadata, reading order, navigation and files.
//!
//! [`Assembler`](crate::assemble::Assembler) fills one of these and
//! [`EpubWriter`](crate::epub::EpubWriter) serializes it. Hrefs are relative to
//! the package directory (`OEBPS/`).

/// Media type of XHTML content documents.
pub const XHTML_MEDIA_TYPE: &str = "application/xhtml+xml";

/// Media type of stylesheets.
pub const CSS_MEDIA_TYPE: &str = "text/css";

/// A book ready to be packaged.
#[derive(Debug, Clone, Default)]
pub struct Book {
    pub metadata: Metadata,
    /// Reading order after the navigation document.
    pub spine: Vec<SpineItem>,
    pub toc: Vec<TocEntry>,
    /// Packaged files in manifest order.
    pub resources: Vec<Resource>,
}

/// Package metadata (Dublin Core subset).
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub title: String,
    pub authors: Vec<String>,
    pub language: String,
    pub identifier: String,
    /// `dcterms:modified` value; the write time is used when unset.
    pub modified: Option<String>,
    /// Href of the cover image resource.
    pub cover_image: Option<String>,
}

/// An entry in the reading order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpineItem {
    pub href: String,
}

/// A table of contents entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub title: String,
    pub href: String,
}

/// A packaged file (content document, image, stylesheet).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub href: String,
    pub data: Vec<u8>,
    pub media_type: String,
}

impl Book {
    pub fn new(metadata: Metadata) -> Self {
        Self {
            metadata,
            ..Default::default()
        }
    }

    /// Add a resource, replacing any existing one with the same href.
    pub fn add_resource(
        &mut self,
        href: impl Into<String>,
        data: Vec<u8>,
        media_type: impl Into<String>,
    ) {
        let href = href.into();
        let resource = Resource {
            href,
            data,
            media_type: media_type.into(),
        };
        match self.resources.iter_mut().find(|r| r.href == resource.href) {
            Some(existing) => *existing = resource,
            None => self.resources.push(resource),
        }
    }

    /// Get a resource by href
    pub fn get_resource(&self, href: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.href == href)
    }

    /// Add an XHTML page as a resource, a spine item and a TOC entry.
    pub fn add_page(&mut self, title: impl Into<String>, href: impl Into<String>, xhtml: String) {
        let href = href.into();
        self.add_resource(href.clone(), xhtml.into_bytes(), XHTML_MEDIA_TYPE);
        self.spine.push(SpineItem { href: href.clone() });
        self.toc.push(TocEntry {
            title: title.into(),
            href,
        });
    }

    /// Set the cover image; the resource is registered under `href`.
    pub fn set_cover(&mut self, href: impl Into<String>, data: Vec<u8>, media_type: impl Into<String>) {
        let href = href.into();
        self.add_resource(href.clone(), data, media_type);
        self.metadata.cover_image = Some(href);
    }
}

impl Metadata {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.authors.push(author.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }

    pub fn with_modified(mut self, modified: impl Into<String>) -> Self {
        self.modified = Some(modified.into());
        self
    }
}
