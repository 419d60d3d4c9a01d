//! # ebangla-epub
//!
//! Converts books published on [eBangla Library](https://www.ebanglalibrary.com)
//! into EPUB files.
//!
//! ## Pipeline
//!
//! 1. Fetch the landing page ([`fetch`]) and parse it ([`dom`]).
//! 2. Pull title, subtitle, editors and cover out of the info tab ([`extract::metadata`]).
//! 3. Detect the page layout and list the chapters ([`extract::chapters`]).
//! 4. Fetch linked chapter pages and clean their markup ([`extract::content`], [`sanitize`]).
//! 5. Re-encode the cover and intro images ([`images`]).
//! 6. Assemble a [`Book`] ([`assemble`]) and write it as EPUB ([`epub`]).
//!
//! ## Quick Start
//!
//! ```no_run
//! use ebangla_epub::{ConvertConfig, Converter};
//!
//! let converter = Converter::new(ConvertConfig::default())?;
//! let path = converter.convert("https://www.ebanglalibrary.com/books/some-book/", None)?;
//! println!("EPUB created: {}", path.display());
//! # Ok::<(), ebangla_epub::Error>(())
//! ```
//!
//! ## Offline use
//!
//! Every stage talks to the network through the [`Fetch`] trait, so saved pages
//! can be converted with a [`StaticFetcher`]:
//!
//! ```
//! use ebangla_epub::{ConvertConfig, Converter, StaticFetcher};
//!
//! let url = "https://www.ebanglalibrary.com/books/demo/";
//! let fetcher = StaticFetcher::new().with(url, "<article><h2>অধ্যায় ১</h2><p>শুরু</p></article>");
//! let converter = Converter::with_fetcher(ConvertConfig::default(), fetcher);
//!
//! let (inspection, book) = converter.build(url)?;
//! assert_eq!(inspection.chapters.len(), 1);
//! assert_eq!(book.spine.len(), 2);
//! # Ok::<(), ebangla_epub::Error>(())
//! ```

pub mod assemble;
pub mod book;
pub mod config;
pub mod convert;
pub mod dom;
pub mod epub;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod images;
pub mod model;
pub mod sanitize;
pub mod util;

pub use assemble::Assembler;
pub use book::{Book, Metadata, Resource, SpineItem, TocEntry};
pub use config::ConvertConfig;
pub use convert::{Converter, Inspection};
pub use epub::{EpubWriter, write_epub_to_writer};
pub use error::{Error, Result};
pub use extract::{Layout, detect_layout, extract_metadata, locate_chapters};
pub use fetch::{Fetch, HttpFetcher, StaticFetcher};
pub use images::{ResolvedImage, resolve_image};
pub use model::{BookMetadata, ChapterDescriptor, ChapterSource, EmbeddedAsset, OutputChapter};
pub use sanitize::sanitize;
