//! Core types for the cache system.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

use crate::fetch::FetchError;

/// Namespace used for supplement images.
pub const SUPPLEMENTS_NAMESPACE: &str = "supplements";

/// Namespace used for member portal (program) images.
pub const MEMBER_PORTAL_NAMESPACE: &str = "member_portal";

/// Logical partition of the cache.
///
/// Each namespace maps to its own directory under the cache root, so keys
/// never collide across namespaces. Names are validated on construction:
/// they must be non-empty, contain no path separator, and must not start
/// with `.` (reserved for internal directories such as the staging area).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Namespace(String);

impl Namespace {
    /// Create a validated namespace.
    pub fn new(name: impl Into<String>) -> Result<Self, CacheError> {
        let name = name.into();
        let reason = if name.is_empty() {
            Some("must not be empty")
        } else if name.contains('/') || name.contains('\\') {
            Some("must not contain a path separator")
        } else if name.starts_with('.') {
            Some("must not start with '.'")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(CacheError::InvalidNamespace {
                name,
                reason: reason.to_string(),
            }),
            None => Ok(Self(name)),
        }
    }

    /// The `supplements` namespace.
    pub fn supplements() -> Self {
        Self(SUPPLEMENTS_NAMESPACE.to_string())
    }

    /// The `member_portal` namespace.
    pub fn member_portal() -> Self {
        Self(MEMBER_PORTAL_NAMESPACE.to_string())
    }

    /// The namespace name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Namespace {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Result of a cache lookup: where the caller should load the image from.
///
/// On a hit this is the local file; on a miss it is the original remote
/// identifier, which stays directly loadable while the background fill runs.
/// Both render through `Display` as a plain reference string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Entry exists on disk at this path.
    Local(PathBuf),
    /// Entry was missing; use the remote identifier.
    Remote(String),
}

impl Location {
    /// Returns true for a cache hit.
    pub fn is_local(&self) -> bool {
        matches!(self, Location::Local(_))
    }

    /// Local path, if this was a hit.
    pub fn local_path(&self) -> Option<&Path> {
        match self {
            Location::Local(path) => Some(path),
            Location::Remote(_) => None,
        }
    }

    /// Consume into the reference string stored on records.
    pub fn into_reference(self) -> String {
        match self {
            Location::Local(path) => path.display().to_string(),
            Location::Remote(url) => url,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Local(path) => write!(f, "{}", path.display()),
            Location::Remote(url) => f.write_str(url),
        }
    }
}

/// Cache-related errors.
#[derive(Debug, Error)]
pub enum CacheError {
    /// I/O error during cache operations
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Fetcher failed to produce image bytes
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Namespace name rejected
    #[error("Invalid namespace '{name}': {reason}")]
    InvalidNamespace { name: String, reason: String },

    /// Reconciliation was requested against an empty working set
    #[error("Refusing to reconcile namespace '{namespace}' against an empty working set")]
    EmptyWorkingSet { namespace: String },

    /// Background task could not be joined
    #[error("Background task failed: {0}")]
    Spawn(String),

    /// No tokio runtime available to run background work
    #[error("No async runtime available: {0}")]
    NoRuntime(String),
}

/// Cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Root directory; each namespace is a subdirectory of it.
    pub cache_dir: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        let cache_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("imagecache");

        Self { cache_dir }
    }
}

impl CacheConfig {
    /// Create a configuration rooted at the given directory.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Set cache directory.
    pub fn with_cache_dir(mut self, dir: PathBuf) -> Self {
        self.cache_dir = dir;
        self
    }
}
