//! Image fetching boundary.
//!
//! The cache consumes a single blocking contract, [`ImageFetcher::fetch`].
//! [`HttpImageFetcher`] is the default implementation: a reqwest GET whose
//! body is optionally decoded and re-encoded as PNG.
//!
//! ```ignore
//! use imagecache::fetch::{FetcherConfig, HttpImageFetcher};
//!
//! let fetcher = HttpImageFetcher::new(&FetcherConfig::default())?;
//! let png = fetcher.fetch("https://example.com/logo.jpg")?;
//! ```

mod http;
mod normalize;
mod types;

pub use http::{HttpClient, HttpImageFetcher, ReqwestClient};
pub use normalize::normalize_to_png;
pub use types::{
    default_user_agent, FetchError, FetcherConfig, ImageFetcher, DEFAULT_FETCH_TIMEOUT_SECS,
};
