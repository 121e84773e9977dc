//! Image cache facade implementation.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::cache::{
    derive_key, CacheConfig, CacheError, CacheKey, CacheStatistics, CacheStats, DiskStore,
    Location, Namespace,
};
use crate::fetch::{FetcherConfig, HttpImageFetcher, ImageFetcher};
use crate::records::{AnyRecord, CacheRecord, HomeNamespace, RecordKind};
use crate::tasks::{
    CacheFillTask, FillOutcome, InFlightFills, ReconcileReport, ReconcileTask, TaskSpawner,
    WorkingSet,
};

/// Summary of a bulk operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkSummary {
    /// Records resolved to a local path
    pub hits: usize,
    /// Records resolved to their remote identifier
    pub misses: usize,
    /// Whether a reconcile pass was scheduled for the batch
    pub reconcile_scheduled: bool,
}

impl BulkSummary {
    /// Total records processed.
    pub fn total(&self) -> usize {
        self.hits + self.misses
    }
}

/// Disk-backed image cache.
///
/// Lookups are synchronous and never wait on the network: a hit returns the
/// local file, a miss returns the remote identifier and schedules a
/// background fill on the injected [`TaskSpawner`]. Bulk inserts also
/// schedule a reconcile pass that removes entries no longer referenced.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use imagecache::cache::{CacheConfig, Namespace};
/// use imagecache::fetch::FetcherConfig;
/// use imagecache::service::ImageCache;
/// use imagecache::tasks::TaskSpawner;
///
/// let cache = ImageCache::with_http(
///     CacheConfig::default(),
///     &FetcherConfig::default(),
///     TaskSpawner::current()?,
/// )?;
///
/// // Remote URL now, local path once the background fill has finished
/// let location = cache.get_or_populate("https://example.com/a.png", &Namespace::supplements());
/// println!("load from {}", location);
///
/// cache.shutdown().await;
/// ```
pub struct ImageCache {
    store: DiskStore,
    fetcher: Arc<dyn ImageFetcher>,
    spawner: TaskSpawner,
    in_flight: InFlightFills,
    stats: Arc<CacheStats>,
}

impl ImageCache {
    /// Create a cache from its collaborators.
    ///
    /// # Arguments
    ///
    /// * `config` - Cache configuration (root directory)
    /// * `fetcher` - Produces image bytes for cache fills
    /// * `spawner` - Execution context for background tasks
    pub fn new(config: CacheConfig, fetcher: Arc<dyn ImageFetcher>, spawner: TaskSpawner) -> Self {
        debug!(dir = %config.cache_dir.display(), "Image cache created");

        Self {
            store: DiskStore::new(config.cache_dir),
            fetcher,
            spawner,
            in_flight: InFlightFills::new(),
            stats: Arc::new(CacheStats::new()),
        }
    }

    /// Create a cache that fetches over HTTP.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_http(
        config: CacheConfig,
        fetcher_config: &FetcherConfig,
        spawner: TaskSpawner,
    ) -> Result<Self, CacheError> {
        let fetcher = HttpImageFetcher::new(fetcher_config)?;
        Ok(Self::new(config, Arc::new(fetcher), spawner))
    }

    /// Resolve an image to a loadable reference.
    ///
    /// On a hit returns [`Location::Local`]. On a miss schedules a
    /// background fill and returns [`Location::Remote`] with `url`
    /// unchanged. Never blocks on more than one existence check.
    pub fn get_or_populate(&self, url: &str, namespace: &Namespace) -> Location {
        let key = derive_key(url);

        if self.store.exists(namespace, &key) {
            self.stats.record_hit();
            trace!(namespace = %namespace, key = %key, "Cache hit");
            return Location::Local(self.store.locate(namespace, &key));
        }

        self.stats.record_miss();
        self.spawn_fill(url, namespace, key);
        Location::Remote(url.to_string())
    }

    /// Resolve every record against `namespace` and drop everything else.
    ///
    /// `records` must be the complete working set for `namespace`: a
    /// reconcile pass is scheduled that deletes every stored entry whose
    /// key is not derived from one of these records. Use
    /// [`ImageCache::bulk_fill`] for partial batches.
    ///
    /// The reconcile pass and the fill loop run concurrently. An empty
    /// collection is a no-op, and a batch with no storable key is filled
    /// without reconciling.
    pub fn bulk_insert<R: CacheRecord>(
        &self,
        records: &mut [R],
        namespace: &Namespace,
    ) -> BulkSummary {
        if records.is_empty() {
            debug!(namespace = %namespace, "Empty bulk insert ignored");
            return BulkSummary::default();
        }

        let reconcile_scheduled =
            match WorkingSet::complete(namespace.clone(), records.iter().map(|r| r.resource_url()))
            {
                Ok(working_set) => self.spawn_reconcile(working_set),
                Err(e) => {
                    warn!(namespace = %namespace, error = %e, "Skipping reconcile");
                    false
                }
            };

        let mut summary = self.bulk_fill(records, namespace);
        summary.reconcile_scheduled = reconcile_scheduled;
        summary
    }

    /// Resolve every record against `namespace` without reconciling.
    pub fn bulk_fill<R: CacheRecord>(&self, records: &mut [R], namespace: &Namespace) -> BulkSummary {
        let mut summary = BulkSummary::default();

        for record in records.iter_mut() {
            let location = self.get_or_populate(record.resource_url(), namespace);
            if location.is_local() {
                summary.hits += 1;
            } else {
                summary.misses += 1;
            }
            record.set_resolved(location.into_reference());
        }

        summary
    }

    /// [`ImageCache::bulk_insert`] into the record type's home namespace.
    pub fn bulk_insert_home<R: CacheRecord + HomeNamespace>(&self, records: &mut [R]) -> BulkSummary {
        self.bulk_insert(records, &R::home_namespace())
    }

    /// Bulk insert a mixed collection.
    ///
    /// Records are grouped by kind. Each kind that is present is processed
    /// in full as its own batch (and working set) in its home namespace.
    pub fn bulk_insert_any(&self, records: &mut [AnyRecord]) -> Vec<(RecordKind, BulkSummary)> {
        let mut summaries = Vec::new();

        for kind in [RecordKind::Program, RecordKind::Supplement] {
            let mut group: Vec<&mut AnyRecord> =
                records.iter_mut().filter(|r| r.kind() == kind).collect();
            if group.is_empty() {
                continue;
            }

            let summary = self.bulk_insert(group.as_mut_slice(), &kind.namespace());
            summaries.push((kind, summary));
        }

        summaries
    }

    /// Reconcile a namespace now and wait for the result.
    pub async fn reconcile(&self, working_set: WorkingSet) -> Result<ReconcileReport, CacheError> {
        let report = ReconcileTask::new(self.store.clone(), working_set)
            .run()
            .await?;
        self.stats.record_reconcile(report.removed as u64);
        Ok(report)
    }

    /// Whether an entry is stored for `url` in `namespace`.
    pub fn exists(&self, url: &str, namespace: &Namespace) -> bool {
        self.store.exists(namespace, &derive_key(url))
    }

    /// Whether a fill for `url` is currently running.
    pub fn is_filling(&self, url: &str, namespace: &Namespace) -> bool {
        self.in_flight.is_active(namespace, &derive_key(url))
    }

    /// Stored keys in a namespace.
    pub fn list(&self, namespace: &Namespace) -> HashSet<CacheKey> {
        self.store.list(namespace)
    }

    /// Stored bytes for `url`, if cached.
    pub fn read(&self, url: &str, namespace: &Namespace) -> Option<Vec<u8>> {
        self.store.read(namespace, &derive_key(url))
    }

    /// Delete every entry of a namespace. Returns the number removed.
    pub fn clear_namespace(&self, namespace: &Namespace) -> usize {
        let removed = self.store.clear_namespace(namespace);
        debug!(namespace = %namespace, removed, "Namespace cleared");
        removed
    }

    /// Underlying entry store.
    pub fn store(&self) -> &DiskStore {
        &self.store
    }

    /// Task spawner used for background work.
    pub fn spawner(&self) -> &TaskSpawner {
        &self.spawner
    }

    /// Snapshot of cache counters.
    pub fn stats(&self) -> CacheStatistics {
        self.stats.snapshot()
    }

    /// Wait for all background work spawned so far.
    pub async fn flush(&self) {
        self.spawner.flush().await;
    }

    /// Stop scheduling background work and drain what is in flight.
    ///
    /// Lookups keep working afterwards; misses just stop triggering fills.
    pub async fn shutdown(&self) {
        self.spawner.shutdown().await;
    }

    fn spawn_fill(&self, url: &str, namespace: &Namespace, key: CacheKey) {
        if !key.is_storable() {
            debug!(url = %url, "Identifier has no storable key, not caching");
            return;
        }

        let Some(claim) = self.in_flight.try_claim(namespace, &key) else {
            self.stats.record_fill_coalesced();
            trace!(namespace = %namespace, key = %key, "Fill already in flight");
            return;
        };

        let task = CacheFillTask::new(
            url,
            namespace.clone(),
            self.store.clone(),
            Arc::clone(&self.fetcher),
        );
        let stats = Arc::clone(&self.stats);

        let spawned = self.spawner.spawn_supervised("cache_fill", async move {
            let _claim = claim;
            let result = task.run().await;
            match &result {
                Ok(FillOutcome::Stored { size_bytes, .. }) => stats.record_fill_succeeded(*size_bytes),
                Ok(FillOutcome::AlreadyCached) => {}
                Err(_) => stats.record_fill_failed(),
            }
            result
        });

        if spawned {
            self.stats.record_fill_started();
        }
    }

    fn spawn_reconcile(&self, working_set: WorkingSet) -> bool {
        let task = ReconcileTask::new(self.store.clone(), working_set);
        let stats = Arc::clone(&self.stats);

        self.spawner.spawn_supervised("reconcile", async move {
            let report = task.run().await?;
            stats.record_reconcile(report.removed as u64);
            Ok::<_, CacheError>(report)
        })
    }
}
