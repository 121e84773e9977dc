//! HTTP fetching for cache fills.

use tracing::{debug, trace};

use super::normalize::normalize_to_png;
use super::types::{FetchError, FetcherConfig, ImageFetcher};

/// Trait for synchronous HTTP client operations.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests.
pub trait HttpClient: Send + Sync {
    /// Performs an HTTP GET request.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to request
    ///
    /// # Returns
    ///
    /// The response body as bytes or an error.
    fn get(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Real HTTP client implementation using reqwest.
///
/// Uses the blocking client: fills already run on blocking threads, and
/// the fetch contract is synchronous.
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Creates a new ReqwestClient from fetcher configuration.
    pub fn new(config: &FetcherConfig) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| FetchError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchError::Http(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| FetchError::Http(format!("Failed to read response: {}", e)))
    }
}

/// Default [`ImageFetcher`]: HTTP GET plus optional PNG normalization.
pub struct HttpImageFetcher<C: HttpClient = ReqwestClient> {
    client: C,
    normalize_png: bool,
}

impl HttpImageFetcher<ReqwestClient> {
    /// Build a fetcher backed by reqwest.
    pub fn new(config: &FetcherConfig) -> Result<Self, FetchError> {
        Ok(Self {
            client: ReqwestClient::new(config)?,
            normalize_png: config.normalize_png,
        })
    }
}

impl<C: HttpClient> HttpImageFetcher<C> {
    /// Build a fetcher around any HTTP client.
    pub fn with_client(client: C, normalize_png: bool) -> Self {
        Self {
            client,
            normalize_png,
        }
    }
}

impl<C: HttpClient> ImageFetcher for HttpImageFetcher<C> {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        trace!(url = %url, "Fetching image");
        let body = self.client.get(url)?;

        if !self.normalize_png {
            return Ok(body);
        }

        let png = normalize_to_png(&body)?;
        debug!(
            url = %url,
            fetched_bytes = body.len(),
            png_bytes = png.len(),
            "Fetched and normalized image"
        );
        Ok(png)
    }
}
