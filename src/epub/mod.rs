//! EPUB container serialization.

mod writer;

pub use writer::{EpubWriter, NAV_HREF, NCX_HREF, write_epub_to_writer};
