//! Cache fill task implementation.
//!
//! [`CacheFillTask`] handles one cache miss end to end: fetch the image,
//! then publish it into the store. It runs detached from the lookup that
//! triggered it, so its outcome is only ever logged and counted.
//!
//! # Protocol
//!
//! 1. Derive the key from the identifier.
//! 2. Skip if the entry appeared meanwhile (another fill won the race).
//! 3. Fetch on a blocking thread.
//! 4. Publish via temp file + rename.
//!
//! Any failure ends the task without creating an entry. Fills are never
//! retried here; the next lookup for the key is a fresh attempt.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cache::{derive_key, CacheError, CacheKey, DiskStore, Namespace};
use crate::fetch::ImageFetcher;

/// Result of a fill that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillOutcome {
    /// A new entry was published.
    Stored {
        /// Path of the published entry
        path: PathBuf,
        /// Size of the entry in bytes
        size_bytes: u64,
    },
    /// The entry already existed; nothing was fetched.
    AlreadyCached,
}

/// Task that fetches one image and stores it.
pub struct CacheFillTask {
    url: String,
    namespace: Namespace,
    key: CacheKey,
    store: DiskStore,
    fetcher: Arc<dyn ImageFetcher>,
}

impl CacheFillTask {
    /// Creates a new cache fill task.
    ///
    /// # Arguments
    ///
    /// * `url` - Remote identifier to fetch
    /// * `namespace` - Namespace to store the entry in
    /// * `store` - Entry store
    /// * `fetcher` - Image fetcher
    pub fn new(
        url: impl Into<String>,
        namespace: Namespace,
        store: DiskStore,
        fetcher: Arc<dyn ImageFetcher>,
    ) -> Self {
        let url = url.into();
        let key = derive_key(&url);
        Self {
            url,
            namespace,
            key,
            store,
            fetcher,
        }
    }

    /// Key this task fills.
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Namespace this task fills.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Run the fill on a blocking thread.
    pub async fn run(self) -> Result<FillOutcome, CacheError> {
        tokio::task::spawn_blocking(move || self.execute())
            .await
            .map_err(|e| CacheError::Spawn(e.to_string()))?
    }

    /// Run the fill on the current thread. Blocks on the fetcher.
    pub fn execute(&self) -> Result<FillOutcome, CacheError> {
        if self.store.exists(&self.namespace, &self.key) {
            debug!(
                namespace = %self.namespace,
                key = %self.key,
                "Entry already cached, skipping fill"
            );
            return Ok(FillOutcome::AlreadyCached);
        }

        let data = self.fetcher.fetch(&self.url).map_err(|e| {
            warn!(
                url = %self.url,
                namespace = %self.namespace,
                error = %e,
                "Failed to fetch image"
            );
            CacheError::Fetch(e)
        })?;

        let path = self
            .store
            .publish(&self.namespace, &self.key, &data)
            .map_err(|e| {
                warn!(
                    url = %self.url,
                    namespace = %self.namespace,
                    key = %self.key,
                    error = %e,
                    "Failed to save image"
                );
                e
            })?;

        info!(
            namespace = %self.namespace,
            key = %self.key,
            size_bytes = data.len(),
            "Image saved"
        );

        Ok(FillOutcome::Stored {
            path,
            size_bytes: data.len() as u64,
        })
    }
}
