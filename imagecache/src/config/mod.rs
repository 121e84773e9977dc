//! User configuration for the image cache.
//!
//! Settings are read from `~/.imagecache/config.ini`. A missing file yields
//! defaults; a present file overrides only the keys it sets.
//!
//! # Example
//!
//! ```
//! use imagecache::config::ConfigFile;
//!
//! let config = ConfigFile::default();
//! let cache_config = config.cache_config();
//! let fetcher_config = config.fetcher_config();
//!
//! assert_eq!(fetcher_config.timeout.as_secs(), config.download.timeout);
//! assert_eq!(cache_config.cache_dir, config.cache.directory);
//! ```

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::{
    default_cache_directory, DEFAULT_DOWNLOAD_TIMEOUT_SECS, DEFAULT_LOG_FILE, DEFAULT_NORMALIZE_PNG,
};
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{CacheSettings, ConfigFile, DownloadSettings, LoggingSettings};
