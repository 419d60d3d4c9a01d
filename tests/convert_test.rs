//! End-to-end conversions against canned landing and chapter pages.
//!
//! Every test runs the real pipeline over a [`StaticFetcher`], writes the EPUB
//! to a temporary directory and reads the archive back.

use std::collections::HashSet;
use std::io::{self, Cursor, Read, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use ebangla_epub::{ConvertConfig, Converter, Error, Layout, StaticFetcher};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tempfile::TempDir;
use zip::ZipArchive;

const BOOK_URL: &str = "https://www.ebanglalibrary.com/books/test-book/";
const COVER_URL: &str = "https://www.ebanglalibrary.com/wp-content/uploads/cover.png";

const DIRECT_PAGE: &str = r#"<!DOCTYPE html>
<html><head><title>পরীক্ষার বই – eBangla Library</title></head>
<body>
<img class="entry-image" data-src="/wp-content/uploads/cover.png" src="data:image/gif;base64,R0lGODlh">
<div id="ld-tab-content-77" class="ld-tab-content">
  <p>পরীক্ষার বই</p>
  <p>একটি উপন্যাস</p>
  <p>সম্পাদনা : রহিম</p>
  <button class="simplefavorite-button">Favorite</button>
</div>
<article class="post">
  <h2>Book Information</h2>
  <p>not a chapter</p>
  <h2>অধ্যায় ১</h2>
  <p>প্রথম অনুচ্ছেদ</p>
  <p>দ্বিতীয় অনুচ্ছেদ<br>লাইন</p>
  <h2>অধ্যায় ২</h2>
  <div class="code-block code-block-2"><p>ad</p></div>
  <p>তৃতীয় অনুচ্ছেদ</p>
  <h2>Reader Interactions</h2>
  <p>comments</p>
</article>
<script>tracker()</script>
</body></html>"#;

const LINKED_PAGE: &str = r#"<html><head><title>Old Book</title></head><body>
<div id="learndash_post_1201">
  <p>Contents</p>
  <a href="/topics/one/">এক</a>
  <a href="/topics/two/">দুই</a>
  <a href="https://www.ebanglalibrary.com/topics/one/">এক (again)</a>
  <a href="/topics/three/">তিন</a>
  <a href="/author/someone/">Author</a>
</div>
</body></html>"#;

fn chapter_page(text: &str) -> String {
    format!(
        r#"<html><body><div class="entry-content"><p>{text}</p><div class="adsbygoogle">ad</div></div></body></html>"#
    )
}

fn cover_png() -> Vec<u8> {
    let image = DynamicImage::ImageRgba8(RgbaImage::from_fn(40, 60, |x, y| {
        Rgba([(x * 6) as u8, (y * 4) as u8, 120, if x < 5 { 0 } else { 255 }])
    }));
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

/// Log output captured from a scoped `tracing` subscriber.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

/// Run `f` with warnings and above written to the returned buffer.
fn capture_warnings<T>(f: impl FnOnce() -> T) -> (T, String) {
    let logs = LogBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();
    let out = tracing::subscriber::with_default(subscriber, f);
    (out, logs.contents())
}

fn converter(fetcher: StaticFetcher) -> Converter {
    Converter::with_fetcher(ConvertConfig::default(), fetcher)
}

/// An unpacked EPUB.
struct Epub {
    archive: ZipArchive<std::fs::File>,
}

impl Epub {
    fn open(path: &Path) -> Self {
        let file = std::fs::File::open(path).unwrap();
        Self {
            archive: ZipArchive::new(file).unwrap(),
        }
    }

    fn names(&self) -> Vec<String> {
        self.archive.file_names().map(str::to_string).collect()
    }

    fn text(&mut self, name: &str) -> String {
        let mut out = String::new();
        self.archive
            .by_name(name)
            .unwrap()
            .read_to_string(&mut out)
            .unwrap();
        out
    }

    fn text_bytes(&mut self, name: &str) -> Vec<u8> {
        let mut out = Vec::new();
        self.archive.by_name(name).unwrap().read_to_end(&mut out).unwrap();
        out
    }

    /// `(manifest (id, href) pairs, spine idrefs)` from the OPF.
    fn package(&mut self) -> (Vec<(String, String)>, Vec<String>) {
        let opf = self.text("OEBPS/content.opf");
        let mut reader = Reader::from_str(&opf);
        let mut manifest = Vec::new();
        let mut spine = Vec::new();
        loop {
            match reader.read_event().unwrap() {
                Event::Start(e) | Event::Empty(e) => match e.name().as_ref() {
                    b"item" => manifest.push((attr(&e, "id"), attr(&e, "href"))),
                    b"itemref" => spine.push(attr(&e, "idref")),
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }
        (manifest, spine)
    }
}

fn attr(e: &BytesStart, name: &str) -> String {
    let value = e.try_get_attribute(name).unwrap().unwrap().value;
    String::from_utf8(value.into_owned()).unwrap()
}

/// Parse a document to the end; quick-xml rejects mismatched end tags.
fn assert_well_formed(name: &str, xml: &str) {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => panic!("{name} is not well-formed: {e}"),
        }
    }
}

#[test]
fn direct_layout_book() {
    let fetcher = StaticFetcher::new()
        .with(BOOK_URL, DIRECT_PAGE)
        .with(COVER_URL, cover_png());
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("direct.epub");

    let written = converter(fetcher).convert(BOOK_URL, Some(&out)).unwrap();
    assert_eq!(written, out);

    let mut epub = Epub::open(&out);
    assert_eq!(epub.names()[0], "mimetype");
    assert_eq!(epub.text("mimetype"), "application/epub+zip");

    let (manifest, spine) = epub.package();
    assert_eq!(spine, ["nav", "intro_xhtml", "chapter_1_xhtml", "chapter_2_xhtml"]);
    assert!(manifest.contains(&("cover-image".to_string(), "cover.jpg".to_string())));

    let opf = epub.text("OEBPS/content.opf");
    assert!(opf.contains("<dc:title>পরীক্ষার বই</dc:title>"));
    assert!(opf.contains("<dc:creator>সম্পাদনা : রহিম</dc:creator>"));
    assert!(opf.contains(&format!("<dc:identifier id=\"BookId\">{BOOK_URL}</dc:identifier>")));
    assert!(opf.contains("<dc:language>bn</dc:language>"));

    let first = epub.text("OEBPS/chapter_1.xhtml");
    assert!(first.contains("<h1>অধ্যায় ১</h1>"));
    assert!(first.contains("<p>প্রথম অনুচ্ছেদ</p>"));
    assert!(first.contains("<p>দ্বিতীয় অনুচ্ছেদ<br/>লাইন</p>"));
    assert!(!first.contains("তৃতীয়"));

    let second = epub.text("OEBPS/chapter_2.xhtml");
    assert!(second.contains("<p>তৃতীয় অনুচ্ছেদ</p>"));
    assert!(!second.contains("ad</p>"));
    assert!(!second.contains("comments"));

    let intro = epub.text("OEBPS/intro.xhtml");
    assert!(intro.contains("<p>একটি উপন্যাস</p>"));
    assert!(!intro.contains("Favorite"));
    assert!(intro.contains("eBangla Library to EPUB Converter"));

    let cover = epub.text_bytes("OEBPS/cover.jpg");
    assert_eq!(&cover[..2], &[0xFF, 0xD8]);

    let nav = epub.text("OEBPS/nav.xhtml");
    let titles: Vec<usize> = ["Book Information", "অধ্যায় ১", "অধ্যায় ২"]
        .iter()
        .map(|t| nav.find(t).unwrap())
        .collect();
    assert!(titles.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn every_document_is_well_formed() {
    let fetcher = StaticFetcher::new()
        .with(BOOK_URL, DIRECT_PAGE)
        .with(COVER_URL, cover_png());
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("wf.epub");
    converter(fetcher).convert(BOOK_URL, Some(&out)).unwrap();

    let mut epub = Epub::open(&out);
    for name in epub.names() {
        if name.ends_with(".xhtml") || name.ends_with(".opf") || name.ends_with(".ncx") || name.ends_with(".xml") {
            let xml = epub.text(&name);
            assert_well_formed(&name, &xml);
        }
    }
}

#[test]
fn linked_layout_fallback_skips_failed_chapter() {
    let fetcher = StaticFetcher::new()
        .with(BOOK_URL, LINKED_PAGE)
        .with("https://www.ebanglalibrary.com/topics/one/", chapter_page("প্রথম"))
        .with("https://www.ebanglalibrary.com/topics/three/", chapter_page("তৃতীয়"));
    let converter = converter(fetcher);

    let inspection = converter.inspect(BOOK_URL).unwrap();
    assert_eq!(inspection.layout, Layout::Linked);
    let urls: Vec<&str> = inspection.chapters.iter().filter_map(|c| c.url()).collect();
    assert_eq!(
        urls,
        [
            "https://www.ebanglalibrary.com/topics/one/",
            "https://www.ebanglalibrary.com/topics/two/",
            "https://www.ebanglalibrary.com/topics/three/",
        ]
    );

    let dir = TempDir::new().unwrap();
    let out = dir.path().join("linked.epub");
    converter.convert(BOOK_URL, Some(&out)).unwrap();

    let mut epub = Epub::open(&out);
    let (manifest, spine) = epub.package();
    assert_eq!(spine, ["nav", "intro_xhtml", "chapter_1_xhtml", "chapter_3_xhtml"]);
    assert!(manifest.iter().all(|(_, href)| href != "chapter_2.xhtml"));
    assert!(!epub.names().iter().any(|n| n.ends_with("chapter_2.xhtml")));

    let third = epub.text("OEBPS/chapter_3.xhtml");
    assert!(third.contains("<h1>তিন</h1>"));
    assert!(third.contains("<p>তৃতীয়</p>"));
    assert!(!third.contains("adsbygoogle"));

    let ncx = epub.text("OEBPS/toc.ncx");
    assert!(!ncx.contains("দুই"));
}

#[test]
fn missing_cover_still_converts() {
    let fetcher = StaticFetcher::new().with(BOOK_URL, DIRECT_PAGE);
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("nocover.epub");
    let (result, logs) = capture_warnings(|| converter(fetcher).convert(BOOK_URL, Some(&out)));
    result.unwrap();

    assert!(logs.contains("WARN"), "no warning in {logs}");
    assert!(logs.contains("cover image skipped"), "no cover warning in {logs}");
    assert!(logs.contains(COVER_URL));

    let mut epub = Epub::open(&out);
    let (manifest, _) = epub.package();
    assert!(manifest.iter().all(|(id, _)| id != "cover-image"));
    assert!(!epub.names().iter().any(|n| n.contains("cover")));
    assert!(!epub.text("OEBPS/content.opf").contains("name=\"cover\""));
}

#[test]
fn chapter_with_only_ads_is_omitted() {
    let ads_only = r#"<html><body><div class="entry-content"><div class="adsbygoogle">Advertisement</div><button>Mark Complete</button></div></body></html>"#;
    let fetcher = StaticFetcher::new()
        .with(BOOK_URL, LINKED_PAGE)
        .with("https://www.ebanglalibrary.com/topics/one/", chapter_page("প্রথম"))
        .with("https://www.ebanglalibrary.com/topics/two/", ads_only)
        .with("https://www.ebanglalibrary.com/topics/three/", chapter_page("তৃতীয়"));
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("ads.epub");

    let (result, logs) = capture_warnings(|| converter(fetcher).convert(BOOK_URL, Some(&out)));
    result.unwrap();
    assert!(logs.contains("https://www.ebanglalibrary.com/topics/two/"), "no warning in {logs}");

    let mut epub = Epub::open(&out);
    let (_, spine) = epub.package();
    assert_eq!(spine, ["nav", "intro_xhtml", "chapter_1_xhtml", "chapter_3_xhtml"]);
    assert!(!epub.names().iter().any(|n| n.ends_with("chapter_2.xhtml")));
}

#[test]
fn filenames_and_ids_are_unique() {
    let fetcher = StaticFetcher::new()
        .with(BOOK_URL, DIRECT_PAGE)
        .with(COVER_URL, cover_png());
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("unique.epub");
    converter(fetcher).convert(BOOK_URL, Some(&out)).unwrap();

    let mut epub = Epub::open(&out);
    let names = epub.names();
    assert_eq!(names.iter().collect::<HashSet<_>>().len(), names.len());

    let (manifest, _) = epub.package();
    let ids: HashSet<_> = manifest.iter().map(|(id, _)| id).collect();
    let hrefs: HashSet<_> = manifest.iter().map(|(_, href)| href).collect();
    assert_eq!(ids.len(), manifest.len());
    assert_eq!(hrefs.len(), manifest.len());
}

#[test]
fn metadata_falls_back_to_h1() {
    let page = r#"<html><body><h1>Boier Naam</h1>
        <article><h2>অধ্যায় ১</h2><p>text</p></article></body></html>"#;
    let inspection = converter(StaticFetcher::new().with(BOOK_URL, page))
        .inspect(BOOK_URL)
        .unwrap();
    let meta = inspection.metadata;
    assert_eq!(meta.title, "Boier Naam");
    assert_eq!(meta.subtitle, None);
    assert_eq!(meta.editors, None);
    assert_eq!(meta.acknowledgments, None);
}

#[test]
fn fatal_errors() {
    let converter = converter(StaticFetcher::new().with(BOOK_URL, "<html><body><p>nothing</p></body></html>"));

    assert!(matches!(
        converter.convert("https://example.com/books/x/", None),
        Err(Error::ForeignDomain { .. })
    ));
    assert!(matches!(
        converter.convert("https://www.ebanglalibrary.com/books/missing/", None),
        Err(Error::HttpStatus { status: 404, .. })
    ));
    assert!(matches!(
        converter.convert(BOOK_URL, None),
        Err(Error::NoChapters { .. })
    ));
}
