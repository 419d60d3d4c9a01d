use std::io::{self, Seek, Write};
use std::path::Path;

use chrono::Utc;
use quick_xml::escape::escape as escape_xml;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::book::{Book, XHTML_MEDIA_TYPE};

/// Href of the generated EPUB 3 navigation document.
pub const NAV_HREF: &str = "nav.xhtml";

/// Href of the generated NCX.
pub const NCX_HREF: &str = "toc.ncx";

const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

/// EPUB container writer.
///
/// Produces an EPUB 3 package with an EPUB 2 NCX alongside for older readers.
///
/// # Example
///
/// ```no_run
/// use ebangla_epub::book::{Book, Metadata};
/// use ebangla_epub::epub::EpubWriter;
///
/// let mut book = Book::new(Metadata::new("My Book").with_language("bn"));
/// book.add_page("Start", "start.xhtml", String::from("<html/>"));
/// EpubWriter::new().with_compression_level(9).write(&book, "output.epub")?;
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct EpubWriter {
    compression_level: u32,
}

impl Default for EpubWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl EpubWriter {
    pub fn new() -> Self {
        Self {
            compression_level: 6,
        }
    }

    /// Deflate level (0-9) for everything except `mimetype`.
    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression_level = level.min(9);
        self
    }

    /// Write `book` to a file on disk.
    pub fn write<P: AsRef<Path>>(&self, book: &Book, path: P) -> io::Result<()> {
        let file = std::fs::File::create(path)?;
        self.write_to(book, io::BufWriter::new(file))
    }

    /// Write `book` to any [`Write`] + [`Seek`] destination.
    pub fn write_to<W: Write + Seek>(&self, book: &Book, writer: W) -> io::Result<()> {
        let mut zip = ZipWriter::new(writer);

        let stored =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        let deflated = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .compression_level(Some(i64::from(self.compression_level)));

        // mimetype must be first and uncompressed
        zip.start_file("mimetype", stored)?;
        zip.write_all(b"application/epub+zip")?;

        zip.start_file("META-INF/container.xml", deflated)?;
        zip.write_all(CONTAINER_XML.as_bytes())?;

        let modified = book.metadata.modified.clone().unwrap_or_else(utc_now);

        zip.start_file("OEBPS/content.opf", deflated)?;
        zip.write_all(generate_opf(book, &modified).as_bytes())?;

        zip.start_file(format!("OEBPS/{NCX_HREF}"), deflated)?;
        zip.write_all(generate_ncx(book).as_bytes())?;

        zip.start_file(format!("OEBPS/{NAV_HREF}"), deflated)?;
        zip.write_all(generate_nav(book).as_bytes())?;

        for resource in &book.resources {
            if resource.href == NCX_HREF || resource.href == NAV_HREF {
                continue;
            }
            zip.start_file(format!("OEBPS/{}", resource.href), deflated)?;
            zip.write_all(&resource.data)?;
        }

        let mut inner = zip.finish()?;
        inner.flush()?;
        Ok(())
    }
}

/// Write a [`Book`] to any [`Write`] + [`Seek`] destination with default settings.
pub fn write_epub_to_writer<W: Write + Seek>(book: &Book, writer: W) -> io::Result<()> {
    EpubWriter::new().write_to(book, writer)
}

fn generate_opf(book: &Book, modified: &str) -> String {
    let meta = &book.metadata;
    let mut opf = String::new();

    opf.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="BookId">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:opf="http://www.idpf.org/2007/opf">
"#,
    );

    opf.push_str(&format!(
        "    <dc:identifier id=\"BookId\">{}</dc:identifier>\n",
        escape_xml(&meta.identifier)
    ));
    opf.push_str(&format!(
        "    <dc:title>{}</dc:title>\n",
        escape_xml(&meta.title)
    ));
    opf.push_str(&format!(
        "    <dc:language>{}</dc:language>\n",
        escape_xml(language(book))
    ));
    for author in &meta.authors {
        opf.push_str(&format!(
            "    <dc:creator>{}</dc:creator>\n",
            escape_xml(author)
        ));
    }
    opf.push_str(&format!(
        "    <meta property=\"dcterms:modified\">{}</meta>\n",
        escape_xml(modified)
    ));
    if meta.cover_image.is_some() {
        opf.push_str("    <meta name=\"cover\" content=\"cover-image\"/>\n");
    }

    opf.push_str("  </metadata>\n  <manifest>\n");
    opf.push_str(&format!(
        "    <item id=\"ncx\" href=\"{NCX_HREF}\" media-type=\"application/x-dtbncx+xml\"/>\n"
    ));
    opf.push_str(&format!(
        "    <item id=\"nav\" href=\"{NAV_HREF}\" media-type=\"{XHTML_MEDIA_TYPE}\" properties=\"nav\"/>\n"
    ));

    for resource in &book.resources {
        if resource.href == NCX_HREF || resource.href == NAV_HREF {
            continue;
        }
        let is_cover = meta.cover_image.as_deref() == Some(resource.href.as_str());
        let id = if is_cover {
            "cover-image".to_string()
        } else {
            href_to_id(&resource.href)
        };
        let properties = if is_cover {
            " properties=\"cover-image\""
        } else {
            ""
        };
        opf.push_str(&format!(
            "    <item id=\"{}\" href=\"{}\" media-type=\"{}\"{}/>\n",
            id,
            escape_xml(&resource.href),
            escape_xml(&resource.media_type),
            properties
        ));
    }

    opf.push_str("  </manifest>\n  <spine toc=\"ncx\">\n");
    opf.push_str("    <itemref idref=\"nav\"/>\n");
    for item in &book.spine {
        opf.push_str(&format!(
            "    <itemref idref=\"{}\"/>\n",
            href_to_id(&item.href)
        ));
    }
    opf.push_str("  </spine>\n</package>\n");
    opf
}

fn generate_ncx(book: &Book) -> String {
    let mut ncx = String::new();

    ncx.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head>
    <meta name="dtb:uid" content=""#,
    );
    ncx.push_str(&escape_xml(&book.metadata.identifier));
    ncx.push_str(
        r#""/>
    <meta name="dtb:depth" content="1"/>
    <meta name="dtb:totalPageCount" content="0"/>
    <meta name="dtb:maxPageNumber" content="0"/>
  </head>
  <docTitle>
    <text>"#,
    );
    ncx.push_str(&escape_xml(&book.metadata.title));
    ncx.push_str(
        r#"</text>
  </docTitle>
  <navMap>
"#,
    );

    for (i, entry) in book.toc.iter().enumerate() {
        let order = i + 1;
        ncx.push_str(&format!(
            "    <navPoint id=\"navpoint-{order}\" playOrder=\"{order}\">\n"
        ));
        ncx.push_str(&format!(
            "      <navLabel>\n        <text>{}</text>\n      </navLabel>\n",
            escape_xml(&entry.title)
        ));
        ncx.push_str(&format!(
            "      <content src=\"{}\"/>\n",
            escape_xml(&entry.href)
        ));
        ncx.push_str("    </navPoint>\n");
    }

    ncx.push_str("  </navMap>\n</ncx>\n");
    ncx
}

fn generate_nav(book: &Book) -> String {
    let lang = escape_xml(language(book));
    let title = escape_xml(&book.metadata.title);
    let mut nav = String::new();

    nav.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE html>\n");
    nav.push_str(&format!(
        "<html xmlns=\"http://www.w3.org/1999/xhtml\" xmlns:epub=\"http://www.idpf.org/2007/ops\" lang=\"{lang}\" xml:lang=\"{lang}\">\n"
    ));
    nav.push_str(&format!("<head>\n  <title>{title}</title>\n</head>\n<body>\n"));
    nav.push_str(&format!(
        "  <nav epub:type=\"toc\" id=\"toc\">\n    <h1>{title}</h1>\n    <ol>\n"
    ));
    for entry in &book.toc {
        nav.push_str(&format!(
            "      <li><a href=\"{}\">{}</a></li>\n",
            escape_xml(&entry.href),
            escape_xml(&entry.title)
        ));
    }
    nav.push_str("    </ol>\n  </nav>\n</body>\n</html>\n");
    nav
}

fn language(book: &Book) -> &str {
    if book.metadata.language.is_empty() {
        "en"
    } else {
        &book.metadata.language
    }
}

fn href_to_id(href: &str) -> String {
    href.replace(['/', '.', ' ', '-'], "_")
}

/// Current UTC time as `YYYY-MM-DDThh:mm:ssZ`.
fn utc_now() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
