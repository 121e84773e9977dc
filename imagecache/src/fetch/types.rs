//! Fetcher types and traits.

use std::time::Duration;

use thiserror::Error;

/// Default request timeout in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Errors that can occur while fetching an image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Transport-level failure (DNS, connect, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Server answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// Resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Body could not be decoded as an image
    #[error("Failed to decode image: {0}")]
    Decode(String),
}

/// Produces image bytes for a resource identifier.
///
/// This is a blocking contract: implementations may take arbitrary time and
/// may fail. The cache only ever calls it from a blocking-capable thread.
///
/// # Example
///
/// ```
/// use imagecache::fetch::{FetchError, ImageFetcher};
///
/// struct Fixed(Vec<u8>);
///
/// impl ImageFetcher for Fixed {
///     fn fetch(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
///         Ok(self.0.clone())
///     }
/// }
///
/// let fetcher = Fixed(vec![1, 2, 3]);
/// assert_eq!(fetcher.fetch("https://x/y.png").unwrap(), vec![1, 2, 3]);
/// ```
pub trait ImageFetcher: Send + Sync {
    /// Fetch the image stored at `url`.
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

impl<F: ImageFetcher + ?Sized> ImageFetcher for std::sync::Arc<F> {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        (**self).fetch(url)
    }
}

/// Configuration for the HTTP fetcher.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Per-request timeout.
    pub timeout: Duration,
    /// User-Agent header sent with every request.
    pub user_agent: String,
    /// Decode fetched bodies and re-encode them as PNG before storing.
    pub normalize_png: bool,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            user_agent: default_user_agent(),
            normalize_png: true,
        }
    }
}

impl FetcherConfig {
    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Enable or disable PNG normalization.
    pub fn with_normalize_png(mut self, enabled: bool) -> Self {
        self.normalize_png = enabled;
        self
    }
}

/// User-Agent used when none is configured.
pub fn default_user_agent() -> String {
    format!("imagecache/{}", crate::VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display() {
        let err = FetchError::Status {
            status: 503,
            url: "https://x/y.png".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 503 from https://x/y.png");

        let err = FetchError::Decode("bad header".to_string());
        assert_eq!(err.to_string(), "Failed to decode image: bad header");
    }

    #[test]
    fn test_fetcher_config_default() {
        let config = FetcherConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("imagecache/"));
        assert!(config.normalize_png);
    }

    #[test]
    fn test_fetcher_config_builder() {
        let config = FetcherConfig::default()
            .with_timeout(Duration::from_secs(5))
            .with_user_agent("test-agent")
            .with_normalize_png(false);

        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.user_agent, "test-agent");
        assert!(!config.normalize_png);
    }
}
