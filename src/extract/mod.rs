//! Scraping of the landing page and chapter pages.
//!
//! - [`metadata`]: title, subtitle, editors and cover from the info tab
//! - [`chapters`]: layout detection and the ordered chapter list
//! - [`content`]: body extraction for linked chapters

pub mod chapters;
pub mod content;
pub mod metadata;

pub use chapters::{Layout, detect_layout, locate_chapters};
pub use content::{extract_chapter_body, fetch_chapter_body};
pub use metadata::extract_metadata;
