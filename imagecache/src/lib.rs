//! imagecache - disk-backed image cache with background fill
//!
//! Lookups resolve an image URL to a local file when one is cached and to
//! the original URL otherwise, scheduling a background download on a miss
//! so the next lookup hits. Bulk inserts also reconcile a namespace against
//! its current working set, removing images nothing references anymore.
//!
//! # High-Level API
//!
//! The [`service`] module provides the facade:
//!
//! ```ignore
//! use imagecache::cache::Namespace;
//! use imagecache::config::ConfigFile;
//! use imagecache::service::ImageCache;
//! use imagecache::tasks::TaskSpawner;
//!
//! let config = ConfigFile::load()?;
//! let cache = ImageCache::with_http(
//!     config.cache_config(),
//!     &config.fetcher_config(),
//!     TaskSpawner::current()?,
//! )?;
//!
//! let location = cache.get_or_populate("https://cdn.example.com/a.png", &Namespace::supplements());
//! ```

pub mod cache;
pub mod config;
pub mod fetch;
pub mod logging;
pub mod records;
pub mod service;
pub mod tasks;

/// Version of the imagecache library and CLI.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
