//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization, runtime startup and
//! cache creation so command handlers stay small.

use std::future::Future;
use std::path::PathBuf;

use tokio::runtime::Runtime;
use tracing::info;

use imagecache::config::ConfigFile;
use imagecache::logging::{init_logging_from, LoggingGuard};
use imagecache::service::ImageCache;
use imagecache::tasks::TaskSpawner;

use crate::error::CliError;

/// Options shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Explicit config file path
    pub config_path: Option<PathBuf>,
    /// Cache root override
    pub cache_dir: Option<PathBuf>,
}

impl GlobalOptions {
    /// Load the config file and apply command-line overrides.
    pub fn load_config(&self) -> Result<ConfigFile, CliError> {
        let mut config = match &self.config_path {
            Some(path) => ConfigFile::load_from(path)?,
            None => ConfigFile::load()?,
        };

        if let Some(dir) = &self.cache_dir {
            config.cache.directory = dir.clone();
        }

        Ok(config)
    }
}

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    config: ConfigFile,
    runtime: Runtime,
}

impl CliRunner {
    /// Load config, initialize logging and start the async runtime.
    pub fn new(options: &GlobalOptions) -> Result<Self, CliError> {
        let config = options.load_config()?;

        let logging_guard = init_logging_from(&config.logging)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("imagecache-worker")
            .build()
            .map_err(CliError::Runtime)?;

        Ok(Self {
            logging_guard,
            config,
            runtime,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("imagecache v{}", imagecache::VERSION);
        info!(
            command,
            cache_dir = %self.config.cache.directory.display(),
            "imagecache CLI starting"
        );
    }

    /// Create an HTTP-backed cache whose background work runs on this
    /// runner's runtime.
    pub fn create_cache(&self) -> Result<ImageCache, CliError> {
        let spawner = TaskSpawner::new(self.runtime.handle().clone());

        ImageCache::with_http(
            self.config.cache_config(),
            &self.config.fetcher_config(),
            spawner,
        )
        .map_err(CliError::Cache)
        .inspect(|_| info!("Image cache created"))
    }

    /// Drive a future to completion on the runtime.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}
