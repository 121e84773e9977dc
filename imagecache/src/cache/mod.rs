//! Disk cache primitives.
//!
//! Key derivation, namespace and location types, path layout, the on-disk
//! entry store, and statistics. Orchestration (background fills,
//! reconciliation, the public facade) lives in [`crate::tasks`] and
//! [`crate::service`].

mod key;
mod path;
mod stats;
mod store;
mod types;

pub use key::{derive_key, CacheKey};
pub use path::{entry_path, namespace_directory, staging_directory, STAGING_DIR_NAME};
pub use stats::{CacheStatistics, CacheStats};
pub use store::DiskStore;
pub use types::{
    CacheConfig, CacheError, Location, Namespace, MEMBER_PORTAL_NAMESPACE, SUPPLEMENTS_NAMESPACE,
};
