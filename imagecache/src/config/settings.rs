//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.

use std::path::PathBuf;
use std::time::Duration;

use crate::cache::CacheConfig;
use crate::fetch::FetcherConfig;

/// Complete configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Cache settings
    pub cache: CacheSettings,
    /// Download settings
    pub download: DownloadSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// `[cache]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    /// Cache root; each namespace is a subdirectory
    pub directory: PathBuf,
    /// Re-encode fetched images as PNG before storing
    pub normalize_png: bool,
}

/// `[download]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadSettings {
    /// Per-request timeout in seconds
    pub timeout: u64,
    /// User-Agent override, `None` for the built-in agent
    pub user_agent: Option<String>,
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Directory holding the log file
    pub directory: PathBuf,
    /// Log file name
    pub file: String,
}

impl ConfigFile {
    /// Cache configuration derived from these settings.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new(self.cache.directory.clone())
    }

    /// Fetcher configuration derived from these settings.
    pub fn fetcher_config(&self) -> FetcherConfig {
        let mut config = FetcherConfig::default()
            .with_timeout(Duration::from_secs(self.download.timeout))
            .with_normalize_png(self.cache.normalize_png);

        if let Some(agent) = &self.download.user_agent {
            config = config.with_user_agent(agent.clone());
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetcher_config_from_settings() {
        let mut config = ConfigFile::default();
        config.download.timeout = 9;
        config.download.user_agent = Some("agent/3".to_string());
        config.cache.normalize_png = false;

        let fetcher = config.fetcher_config();
        assert_eq!(fetcher.timeout, Duration::from_secs(9));
        assert_eq!(fetcher.user_agent, "agent/3");
        assert!(!fetcher.normalize_png);
    }

    #[test]
    fn test_fetcher_config_keeps_default_agent() {
        let fetcher = ConfigFile::default().fetcher_config();
        assert_eq!(fetcher.user_agent, crate::fetch::default_user_agent());
    }

    #[test]
    fn test_cache_config_from_settings() {
        let mut config = ConfigFile::default();
        config.cache.directory = PathBuf::from("/data/img");

        assert_eq!(config.cache_config().cache_dir, PathBuf::from("/data/img"));
    }
}
