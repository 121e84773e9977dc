//! Working-set reconciliation.
//!
//! [`ReconcileTask`] deletes every stored entry of a namespace whose key is
//! not in a [`WorkingSet`]. This is the cache's only eviction mechanism: it
//! is driven by what should exist now, not by age or size.
//!
//! # Contract
//!
//! The working set must be the COMPLETE set of identifiers that should stay
//! cached in the namespace. Reconciling against a partial batch deletes
//! entries that are valid but simply absent from that batch. [`WorkingSet`]
//! can only be built through [`WorkingSet::complete`], which rejects a list
//! that yields no storable key, since that would wipe the namespace. Callers that
//! only hold part of the working set should fill without reconciling.
//!
//! # Races
//!
//! Only keys present in the listing snapshot are considered, so an entry
//! published after the listing is never touched. A lookup that runs while
//! an orphan is being deleted may observe a transient miss; there is no
//! read-after-delete guarantee.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::cache::{derive_key, CacheError, CacheKey, DiskStore, Namespace};

/// The full set of keys that should remain cached in one namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingSet {
    namespace: Namespace,
    keys: HashSet<CacheKey>,
}

impl WorkingSet {
    /// Build the working set from the complete list of identifiers.
    ///
    /// Keys that cannot name a file are dropped; they can never be stored.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::EmptyWorkingSet`] if `identifiers` yields no
    /// storable key, including when every identifier is unstorable.
    pub fn complete<I, S>(namespace: Namespace, identifiers: I) -> Result<Self, CacheError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = 0usize;
        let keys: HashSet<CacheKey> = identifiers
            .into_iter()
            .inspect(|_| seen += 1)
            .map(|id| derive_key(id.as_ref()))
            .filter(CacheKey::is_storable)
            .collect();

        if keys.is_empty() {
            return Err(CacheError::EmptyWorkingSet {
                namespace: namespace.to_string(),
            });
        }

        if keys.len() < seen {
            debug!(
                namespace = %namespace,
                identifiers = seen,
                keys = keys.len(),
                "Working set has colliding or unstorable keys"
            );
        }

        Ok(Self { namespace, keys })
    }

    /// Namespace this set applies to.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Keys that must be kept.
    pub fn keys(&self) -> &HashSet<CacheKey> {
        &self.keys
    }

    /// Whether `key` is part of the working set.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.keys.contains(key)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True if no storable key is part of the set.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Summary of a reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Entries found in the namespace listing
    pub stored: usize,
    /// Listed entries kept because they are in the working set
    pub retained: usize,
    /// Orphans deleted
    pub removed: usize,
    /// Orphans that could not be deleted (already gone or I/O error)
    pub skipped: usize,
}

/// Task that deletes entries outside a working set.
pub struct ReconcileTask {
    store: DiskStore,
    working_set: WorkingSet,
}

impl ReconcileTask {
    /// Creates a new reconcile task.
    pub fn new(store: DiskStore, working_set: WorkingSet) -> Self {
        Self { store, working_set }
    }

    /// Namespace being reconciled.
    pub fn namespace(&self) -> &Namespace {
        self.working_set.namespace()
    }

    /// Run the pass on a blocking thread.
    pub async fn run(self) -> Result<ReconcileReport, CacheError> {
        tokio::task::spawn_blocking(move || self.execute())
            .await
            .map_err(|e| CacheError::Spawn(e.to_string()))
    }

    /// Run the pass on the current thread.
    pub fn execute(&self) -> ReconcileReport {
        let namespace = self.working_set.namespace();
        let stored = self.store.list(namespace);

        let mut report = ReconcileReport {
            stored: stored.len(),
            ..Default::default()
        };

        for key in &stored {
            if self.working_set.contains(key) {
                report.retained += 1;
            } else if self.store.delete(namespace, key) {
                report.removed += 1;
            } else {
                report.skipped += 1;
            }
        }

        if report.removed > 0 {
            info!(
                namespace = %namespace,
                removed = report.removed,
                retained = report.retained,
                "Removed cache entries outside the working set"
            );
        } else {
            debug!(
                namespace = %namespace,
                stored = report.stored,
                "Reconcile found nothing to remove"
            );
        }

        report
    }
}
