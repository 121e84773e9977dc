//! Default values for all configuration settings.

use std::path::PathBuf;

use super::file::config_directory;
use super::settings::*;
use crate::fetch::DEFAULT_FETCH_TIMEOUT_SECS;

/// Default HTTP timeout in seconds.
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = DEFAULT_FETCH_TIMEOUT_SECS;

/// Images are normalized to PNG unless disabled.
pub const DEFAULT_NORMALIZE_PNG: bool = true;

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "imagecache.log";

/// Platform data directory joined with `imagecache`.
pub fn default_cache_directory() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("imagecache")
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            cache: CacheSettings {
                directory: default_cache_directory(),
                normalize_png: DEFAULT_NORMALIZE_PNG,
            },
            download: DownloadSettings {
                timeout: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
                user_agent: None,
            },
            logging: LoggingSettings {
                directory: config_directory().join("logs"),
                file: DEFAULT_LOG_FILE.to_string(),
            },
        }
    }
}
