//! Page and image retrieval.
//!
//! The pipeline only ever sees the [`Fetch`] trait, so tests can serve canned
//! pages from memory while the binary uses [`HttpFetcher`].

use std::collections::HashMap;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::config::ConvertConfig;
use crate::error::{Error, Result};
use crate::util::decode_text;

/// A source of bytes addressed by URL.
pub trait Fetch {
    /// Retrieve the body at `url`. Non-success statuses are errors.
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;

    /// Retrieve the body at `url` decoded as text.
    fn fetch_text(&self, url: &str) -> Result<String> {
        let bytes = self.fetch(url)?;
        Ok(decode_text(&bytes, None).into_owned())
    }
}

/// Blocking HTTP fetcher with a fixed per-request timeout and no retries.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &ConvertConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|source| Error::Http {
                url: String::new(),
                source,
            })?;
        Ok(Self { client })
    }

    fn get(&self, url: &str) -> Result<reqwest::blocking::Response> {
        debug!(url, "GET");
        let response = self.client.get(url).send().map_err(|source| Error::Http {
            url: url.to_string(),
            source,
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.get(url)?;
        let bytes = response.bytes().map_err(|source| Error::Http {
            url: url.to_string(),
            source,
        })?;
        Ok(bytes.to_vec())
    }

    fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self.get(url)?;
        let charset = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(charset_from_content_type);
        let bytes = response.bytes().map_err(|source| Error::Http {
            url: url.to_string(),
            source,
        })?;
        Ok(decode_text(&bytes, charset.as_deref()).into_owned())
    }
}

/// Pull the `charset=` parameter out of a Content-Type value.
fn charset_from_content_type(value: &str) -> Option<String> {
    value.split(';').skip(1).find_map(|param| {
        let (key, val) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| val.trim().trim_matches('"').to_string())
    })
}

/// In-memory fetcher: serves registered bodies, answers 404 for everything else.
///
/// Used for offline runs over saved pages and throughout the test suite.
#[derive(Debug, Default, Clone)]
pub struct StaticFetcher {
    bodies: HashMap<String, Vec<u8>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a body for `url`.
    pub fn with(mut self, url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.insert(url, body);
        self
    }

    pub fn insert(&mut self, url: impl Into<String>, body: impl Into<Vec<u8>>) {
        self.bodies.insert(url.into(), body.into());
    }
}

impl Fetch for StaticFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.bodies
            .get(url)
            .cloned()
            .ok_or_else(|| Error::HttpStatus {
                url: url.to_string(),
                status: 404,
            })
    }
}
