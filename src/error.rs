//! Error types for ebangla-epub operations.

use thiserror::Error;

/// Errors that can occur while fetching a book or writing its EPUB.
///
/// Only some of these end a run: a bad landing URL, a failed landing-page
/// fetch or an empty chapter list. The rest are logged where they happen and
/// the affected chapter or image is skipped.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("URL host {host:?} is not on {expected}")]
    ForeignDomain { host: String, expected: String },

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("{url} returned {len} bytes, too few to be an image")]
    EmptyBody { url: String, len: usize },

    #[error("image decoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("re-encoded image is only {len} bytes")]
    ImageTooSmall { len: usize },

    #[error("no chapters found on {url}")]
    NoChapters { url: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
