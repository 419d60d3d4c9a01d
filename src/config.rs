//! Conversion settings.

use std::time::Duration;

/// Host substring every landing-page URL must contain.
pub const SITE_DOMAIN: &str = "ebanglalibrary.com";

/// Configuration for a conversion run.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use ebangla_epub::ConvertConfig;
///
/// let config = ConvertConfig::default().with_timeout(Duration::from_secs(10));
/// assert_eq!(config.language, "bn");
/// ```
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Per-request timeout; a request that exceeds it counts as a transport failure.
    pub timeout: Duration,
    /// User-Agent header sent with every request.
    pub user_agent: String,
    /// Language tag written to the package and every page.
    pub language: String,
    /// Required host substring for the landing URL.
    pub site_domain: String,
    /// Deflate level for the zip container (0-9).
    pub compression_level: u32,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: concat!("ebangla-epub/", env!("CARGO_PKG_VERSION")).to_string(),
            language: "bn".to_string(),
            site_domain: SITE_DOMAIN.to_string(),
            compression_level: 6,
        }
    }
}

impl ConvertConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_site_domain(mut self, domain: impl Into<String>) -> Self {
        self.site_domain = domain.into();
        self
    }

    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression_level = level.min(9);
        self
    }
}
