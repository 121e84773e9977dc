//! Fill coalescing.
//!
//! Tracks which `(namespace, key)` pairs have a fill running so a burst of
//! lookups for the same uncached image spawns one fetch instead of many.
//! The registry is advisory: it only dedupes spawns within one cache
//! instance and is not a lock on the entry itself.

use std::sync::Arc;

use dashmap::DashSet;

use crate::cache::{CacheKey, Namespace};

type FillId = (Namespace, CacheKey);

/// Registry of fills currently in flight.
#[derive(Debug, Clone, Default)]
pub struct InFlightFills {
    active: Arc<DashSet<FillId>>,
}

impl InFlightFills {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the right to fill `(namespace, key)`.
    ///
    /// Returns `None` if a fill for the pair is already running. The claim
    /// is released when the returned guard is dropped, whether the fill
    /// succeeded, failed or panicked.
    pub fn try_claim(&self, namespace: &Namespace, key: &CacheKey) -> Option<FillClaim> {
        let id = (namespace.clone(), key.clone());
        if self.active.insert(id.clone()) {
            Some(FillClaim {
                active: Arc::clone(&self.active),
                id,
            })
        } else {
            None
        }
    }

    /// Whether a fill for `(namespace, key)` is running.
    pub fn is_active(&self, namespace: &Namespace, key: &CacheKey) -> bool {
        self.active.contains(&(namespace.clone(), key.clone()))
    }

    /// Number of fills running.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// True if no fill is running.
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

/// Guard for a claimed fill; releases the claim on drop.
#[derive(Debug)]
pub struct FillClaim {
    active: Arc<DashSet<FillId>>,
    id: FillId,
}

impl Drop for FillClaim {
    fn drop(&mut self) {
        self.active.remove(&self.id);
    }
}
