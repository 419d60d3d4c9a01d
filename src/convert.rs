//! End-to-end conversion: landing URL in, EPUB file out.

use std::path::{Path, PathBuf};

use reqwest::Url;
use serde::Serialize;
use tracing::info;

use crate::assemble::Assembler;
use crate::book::Book;
use crate::config::ConvertConfig;
use crate::dom::parse_document;
use crate::epub::EpubWriter;
use crate::error::{Error, Result};
use crate::extract::{Layout, extract_metadata, locate_chapters};
use crate::fetch::{Fetch, HttpFetcher};
use crate::model::{BookMetadata, ChapterDescriptor};
use crate::util::sanitize_filename;

/// File stem used when the title sanitizes to nothing.
const FALLBACK_STEM: &str = "book";

/// What the landing page says about a book, before any chapter is fetched.
#[derive(Debug, Clone, Serialize)]
pub struct Inspection {
    pub metadata: BookMetadata,
    pub layout: Layout,
    pub chapters: Vec<ChapterDescriptor>,
}

/// Runs the pipeline for one book at a time.
///
/// ```no_run
/// use ebangla_epub::{ConvertConfig, Converter};
///
/// let converter = Converter::new(ConvertConfig::default())?;
/// let path = converter.convert("https://www.ebanglalibrary.com/books/some-book/", None)?;
/// println!("{}", path.display());
/// # Ok::<(), ebangla_epub::Error>(())
/// ```
pub struct Converter {
    config: ConvertConfig,
    fetcher: Box<dyn Fetch>,
}

impl Converter {
    /// Converter that fetches over HTTP.
    pub fn new(config: ConvertConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config)?;
        Ok(Self::with_fetcher(config, fetcher))
    }

    /// Converter over any [`Fetch`] implementation.
    pub fn with_fetcher(config: ConvertConfig, fetcher: impl Fetch + 'static) -> Self {
        Self {
            config,
            fetcher: Box::new(fetcher),
        }
    }

    /// Fetch and analyse the landing page without downloading chapters.
    ///
    /// Fails on a foreign URL, a failed landing-page fetch, or when neither
    /// layout yields a chapter.
    pub fn inspect(&self, url: &str) -> Result<Inspection> {
        validate_url(url, &self.config.site_domain)?;

        info!(url, "fetching book page");
        let html = self.fetcher.fetch_text(url)?;
        let page = parse_document(&html);

        let metadata = extract_metadata(&page, url);
        info!(title = %metadata.title, "extracted metadata");
        if let Some(subtitle) = &metadata.subtitle {
            info!(%subtitle, "subtitle");
        }
        if let Some(editors) = &metadata.editors {
            info!(%editors, "editors");
        }

        let (layout, chapters) = locate_chapters(&page, url);
        if chapters.is_empty() {
            return Err(Error::NoChapters {
                url: url.to_string(),
            });
        }
        info!(?layout, count = chapters.len(), "found chapters");

        Ok(Inspection {
            metadata,
            layout,
            chapters,
        })
    }

    /// Build the [`Book`] for `url` without writing it.
    pub fn build(&self, url: &str) -> Result<(Inspection, Book)> {
        let inspection = self.inspect(url)?;
        let book = Assembler::new(self.fetcher.as_ref(), &self.config)
            .assemble(&inspection.metadata, &inspection.chapters);
        Ok((inspection, book))
    }

    /// Convert the book at `url` and write it to `output`, or to a file named
    /// after the book in the working directory. Returns the path written.
    pub fn convert(&self, url: &str, output: Option<&Path>) -> Result<PathBuf> {
        let (inspection, book) = self.build(url)?;
        let path = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| default_output_path(&inspection.metadata));

        info!(path = %path.display(), "writing EPUB");
        EpubWriter::new()
            .with_compression_level(self.config.compression_level)
            .write(&book, &path)?;
        Ok(path)
    }
}

/// Check that `url` is an http(s) URL whose host contains `site_domain`.
pub fn validate_url(url: &str, site_domain: &str) -> Result<Url> {
    let parsed = Url::parse(url).map_err(|e| Error::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme {:?}", parsed.scheme()),
        });
    }
    let host = parsed.host_str().unwrap_or_default();
    if !host.contains(site_domain) {
        return Err(Error::ForeignDomain {
            host: host.to_string(),
            expected: site_domain.to_string(),
        });
    }
    Ok(parsed)
}

/// `<sanitized title>.epub`, preferring the page title over the display title.
pub fn default_output_path(metadata: &BookMetadata) -> PathBuf {
    let stem = sanitize_filename(metadata.file_stem_source());
    let stem = stem.trim();
    let stem = if stem.is_empty() { FALLBACK_STEM } else { stem };
    PathBuf::from(format!("{stem}.epub"))
}
