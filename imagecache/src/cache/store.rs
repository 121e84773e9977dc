//! On-disk entry store.
//!
//! [`DiskStore`] maps `(namespace, key)` pairs to files and performs the raw
//! filesystem operations the cache needs. It holds no business logic and no
//! locks: every operation relies on the filesystem's own atomicity for
//! individual create, rename and delete calls.
//!
//! # Failure policy
//!
//! Lookups fail soft. An I/O error while probing or listing is logged and
//! reported as "absent" (or an empty listing), so a flaky disk degrades to
//! re-fetching instead of crashing the caller. Deletes are best effort.
//! Only [`DiskStore::publish`] returns errors, since its caller needs to
//! know that no entry was created.
//!
//! # Atomic publish
//!
//! Entries are written to a temporary file in `<cache_dir>/.staging` and
//! renamed into place. A concurrent [`DiskStore::exists`] therefore either
//! sees nothing or a complete file, never a truncated one.

use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};

use crate::cache::key::CacheKey;
use crate::cache::path::{entry_path, namespace_directory, staging_directory};
use crate::cache::types::{CacheError, Namespace};

/// Prefix for temporary files in the staging area.
const STAGING_PREFIX: &str = "fill-";

/// Suffix for temporary files in the staging area.
const STAGING_SUFFIX: &str = ".part";

/// Filesystem-backed entry store rooted at a cache directory.
#[derive(Debug, Clone)]
pub struct DiskStore {
    cache_dir: PathBuf,
}

impl DiskStore {
    /// Create a store rooted at `cache_dir`.
    ///
    /// Nothing is created on disk until the first publish.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Root directory of the store.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Canonical path for an entry. Does not touch the filesystem.
    pub fn locate(&self, namespace: &Namespace, key: &CacheKey) -> PathBuf {
        entry_path(&self.cache_dir, namespace, key)
    }

    /// Check whether an entry is stored.
    ///
    /// Only regular files count. Any I/O error other than "not found" is
    /// logged and treated as a miss.
    pub fn exists(&self, namespace: &Namespace, key: &CacheKey) -> bool {
        if !key.is_storable() {
            return false;
        }

        let path = self.locate(namespace, key);
        match fs::metadata(&path) {
            Ok(metadata) => metadata.is_file(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => {
                warn!(
                    namespace = %namespace,
                    key = %key,
                    error = %e,
                    "Failed to check cache entry, treating as missing"
                );
                false
            }
        }
    }

    /// Read an entry's bytes, or `None` if it is not stored.
    pub fn read(&self, namespace: &Namespace, key: &CacheKey) -> Option<Vec<u8>> {
        if !key.is_storable() {
            return None;
        }

        let path = self.locate(namespace, key);
        match fs::read(&path) {
            Ok(data) => Some(data),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to read cache entry"
                );
                None
            }
        }
    }

    /// Enumerate every stored key in a namespace.
    ///
    /// Returns an empty set when the namespace directory is absent or cannot
    /// be read. Subdirectories and non-UTF-8 filenames are skipped.
    pub fn list(&self, namespace: &Namespace) -> HashSet<CacheKey> {
        let dir = namespace_directory(&self.cache_dir, namespace);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return HashSet::new(),
            Err(e) => {
                warn!(
                    dir = %dir.display(),
                    error = %e,
                    "Failed to list cache namespace, treating as empty"
                );
                return HashSet::new();
            }
        };

        let mut keys = HashSet::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!(dir = %dir.display(), error = %e, "Skipping unreadable directory entry");
                    continue;
                }
            };

            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if !is_file {
                continue;
            }

            match entry.file_name().into_string() {
                Ok(name) => {
                    keys.insert(CacheKey::new(name));
                }
                Err(name) => {
                    debug!(name = ?name, "Skipping non UTF-8 cache filename");
                }
            }
        }

        keys
    }

    /// Remove an entry. Returns true if a file was deleted.
    ///
    /// Absent entries are a no-op; other errors are logged and swallowed.
    pub fn delete(&self, namespace: &Namespace, key: &CacheKey) -> bool {
        if !key.is_storable() {
            return false;
        }

        let path = self.locate(namespace, key);
        match fs::remove_file(&path) {
            Ok(()) => {
                trace!(namespace = %namespace, key = %key, "Deleted cache entry");
                true
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to delete cache entry"
                );
                false
            }
        }
    }

    /// Atomically store `data` as the entry for `(namespace, key)`.
    ///
    /// Creates the namespace directory if needed. On error the temporary
    /// file is removed and nothing appears under the final name.
    pub fn publish(
        &self,
        namespace: &Namespace,
        key: &CacheKey,
        data: &[u8],
    ) -> Result<PathBuf, CacheError> {
        if !key.is_storable() {
            return Err(CacheError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cache key '{}' cannot name a file", key),
            )));
        }

        fs::create_dir_all(namespace_directory(&self.cache_dir, namespace))?;
        let staging = staging_directory(&self.cache_dir);
        fs::create_dir_all(&staging)?;

        let mut temp = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .suffix(STAGING_SUFFIX)
            .tempfile_in(&staging)?;
        temp.write_all(data)?;
        temp.as_file().sync_all()?;

        let path = self.locate(namespace, key);
        temp.persist(&path).map_err(|e| CacheError::Io(e.error))?;

        debug!(
            namespace = %namespace,
            key = %key,
            size_bytes = data.len(),
            "Published cache entry"
        );

        Ok(path)
    }

    /// Delete every entry in a namespace. Returns the number removed.
    pub fn clear_namespace(&self, namespace: &Namespace) -> usize {
        self.list(namespace)
            .iter()
            .filter(|key| self.delete(namespace, key))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::key::derive_key;
    use tempfile::TempDir;

    fn create_test_store() -> (TempDir, DiskStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = DiskStore::new(temp_dir.path());
        (temp_dir, store)
    }

    fn keys(names: &[&str]) -> HashSet<CacheKey> {
        names.iter().map(|n| CacheKey::new(*n)).collect()
    }

    #[test]
    fn test_exists_on_empty_store() {
        let (_temp_dir, store) = create_test_store();
        assert!(!store.exists(&Namespace::supplements(), &CacheKey::new("a.png")));
    }

    #[test]
    fn test_publish_then_exists_and_read() {
        let (_temp_dir, store) = create_test_store();
        let ns = Namespace::supplements();
        let key = derive_key("https://x/y/z.png");

        let path = store.publish(&ns, &key, &[1, 2, 3]).unwrap();

        assert_eq!(path, store.locate(&ns, &key));
        assert!(store.exists(&ns, &key));
        assert_eq!(store.read(&ns, &key), Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_publish_replaces_existing() {
        let (_temp_dir, store) = create_test_store();
        let ns = Namespace::supplements();
        let key = CacheKey::new("a.png");

        store.publish(&ns, &key, &[1, 2, 3]).unwrap();
        store.publish(&ns, &key, &[4, 5]).unwrap();

        assert_eq!(store.read(&ns, &key), Some(vec![4, 5]));
        assert_eq!(store.list(&ns), keys(&["a.png"]));
    }

    #[test]
    fn test_publish_leaves_no_staging_files() {
        let (temp_dir, store) = create_test_store();
        let ns = Namespace::supplements();

        store.publish(&ns, &CacheKey::new("a.png"), &[0u8; 512]).unwrap();

        let staged: Vec<_> = fs::read_dir(temp_dir.path().join(".staging"))
            .unwrap()
            .filter_map(|e| e.ok())
            .collect();
        assert!(staged.is_empty(), "Staging files should not remain");
    }

    #[test]
    fn test_publish_failure_creates_nothing() {
        let (temp_dir, store) = create_test_store();
        let ns = Namespace::supplements();
        // A plain file where the namespace directory should be.
        fs::write(temp_dir.path().join("supplements"), b"blocker").unwrap();

        let result = store.publish(&ns, &CacheKey::new("a.png"), &[1, 2, 3]);

        assert!(matches!(result, Err(CacheError::Io(_))));
        assert!(!store.exists(&ns, &CacheKey::new("a.png")));
    }

    #[test]
    fn test_publish_rejects_unstorable_key() {
        let (_temp_dir, store) = create_test_store();
        let result = store.publish(&Namespace::supplements(), &CacheKey::new(""), &[1]);
        assert!(result.is_err());
    }

    #[test]
    fn test_exists_ignores_directories() {
        let (temp_dir, store) = create_test_store();
        fs::create_dir_all(temp_dir.path().join("supplements").join("nested.png")).unwrap();

        assert!(!store.exists(&Namespace::supplements(), &CacheKey::new("nested.png")));
    }

    #[test]
    fn test_exists_fails_soft_on_io_error() {
        let (temp_dir, store) = create_test_store();
        // Probing "<file>/a.png" fails with a non-NotFound error on unix.
        fs::write(temp_dir.path().join("supplements"), b"not a dir").unwrap();

        assert!(!store.exists(&Namespace::supplements(), &CacheKey::new("a.png")));
    }

    #[test]
    fn test_unstorable_key_never_exists() {
        let (temp_dir, store) = create_test_store();
        fs::create_dir_all(temp_dir.path().join("supplements")).unwrap();

        assert!(!store.exists(&Namespace::supplements(), &derive_key("https://h/dir/")));
    }

    #[test]
    fn test_list_absent_namespace_is_empty() {
        let (_temp_dir, store) = create_test_store();
        assert!(store.list(&Namespace::member_portal()).is_empty());
    }

    #[test]
    fn test_list_unreadable_namespace_is_empty() {
        let (temp_dir, store) = create_test_store();
        fs::write(temp_dir.path().join("supplements"), b"not a dir").unwrap();

        assert!(store.list(&Namespace::supplements()).is_empty());
    }

    #[test]
    fn test_list_returns_files_only() {
        let (temp_dir, store) = create_test_store();
        let ns = Namespace::supplements();
        store.publish(&ns, &CacheKey::new("a.png"), &[1]).unwrap();
        store.publish(&ns, &CacheKey::new("b.png"), &[2]).unwrap();
        fs::create_dir_all(temp_dir.path().join("supplements").join("subdir")).unwrap();

        assert_eq!(store.list(&ns), keys(&["a.png", "b.png"]));
    }

    #[test]
    fn test_list_is_per_namespace() {
        let (_temp_dir, store) = create_test_store();
        store
            .publish(&Namespace::supplements(), &CacheKey::new("a.png"), &[1])
            .unwrap();
        store
            .publish(&Namespace::member_portal(), &CacheKey::new("b.png"), &[2])
            .unwrap();

        assert_eq!(store.list(&Namespace::supplements()), keys(&["a.png"]));
        assert_eq!(store.list(&Namespace::member_portal()), keys(&["b.png"]));
    }

    #[test]
    fn test_delete() {
        let (_temp_dir, store) = create_test_store();
        let ns = Namespace::supplements();
        let key = CacheKey::new("a.png");
        store.publish(&ns, &key, &[1]).unwrap();

        assert!(store.delete(&ns, &key));
        assert!(!store.exists(&ns, &key));

        // Deleting again is a no-op
        assert!(!store.delete(&ns, &key));
    }

    #[test]
    fn test_read_missing() {
        let (_temp_dir, store) = create_test_store();
        assert!(store
            .read(&Namespace::supplements(), &CacheKey::new("nope.png"))
            .is_none());
    }

    #[test]
    fn test_clear_namespace() {
        let (_temp_dir, store) = create_test_store();
        let ns = Namespace::supplements();
        let other = Namespace::member_portal();
        store.publish(&ns, &CacheKey::new("a.png"), &[1]).unwrap();
        store.publish(&ns, &CacheKey::new("b.png"), &[2]).unwrap();
        store.publish(&other, &CacheKey::new("c.png"), &[3]).unwrap();

        assert_eq!(store.clear_namespace(&ns), 2);
        assert!(store.list(&ns).is_empty());
        assert_eq!(store.list(&other), keys(&["c.png"]));
    }
}
