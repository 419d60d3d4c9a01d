//! Small helpers shared by the pipeline stages.

use std::borrow::Cow;

use reqwest::Url;

/// Longest file stem [`sanitize_filename`] will produce, in characters.
pub const MAX_FILENAME_CHARS: usize = 200;

/// Decode a response body to a string.
///
/// Tries UTF-8 first (the site serves UTF-8, BOM handled by encoding_rs), then the
/// charset label from the `Content-Type` header if one was given, then Windows-1252.
pub fn decode_text<'a>(bytes: &'a [u8], hint_encoding: Option<&str>) -> Cow<'a, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    if let Some(name) = hint_encoding
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
    {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Make a title usable as a file name: drop `< > : " / \ | ? *` and cap the length.
///
/// ```
/// use ebangla_epub::util::sanitize_filename;
///
/// assert_eq!(sanitize_filename(r#"Book: "Part 1"/2"#), "Book Part 12");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*'))
        .take(MAX_FILENAME_CHARS)
        .collect()
}

/// Resolve `href` against `base`, returning an absolute URL string.
pub fn resolve_url(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    match Url::parse(base) {
        Ok(base) => base.join(href).ok().map(|u| u.to_string()),
        Err(_) => Url::parse(href).ok().map(|u| u.to_string()),
    }
}
