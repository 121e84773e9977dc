//! Cache path construction.
//!
//! Layout on disk:
//! ```text
//! <cache_dir>/<namespace>/<key>
//! <cache_dir>/.staging/            (in-progress writes, same filesystem)
//! ```

use std::path::{Path, PathBuf};

use crate::cache::key::CacheKey;
use crate::cache::types::Namespace;

/// Name of the staging directory under the cache root.
///
/// Namespaces cannot start with `.`, so this never collides with one.
pub const STAGING_DIR_NAME: &str = ".staging";

/// Get the directory holding a namespace's entries.
///
/// # Example
///
/// ```
/// use std::path::{Path, PathBuf};
/// use imagecache::cache::{namespace_directory, Namespace};
///
/// let dir = namespace_directory(Path::new("/cache"), &Namespace::supplements());
/// assert_eq!(dir, PathBuf::from("/cache/supplements"));
/// ```
pub fn namespace_directory(cache_dir: &Path, namespace: &Namespace) -> PathBuf {
    cache_dir.join(namespace.as_str())
}

/// Construct the full path for a cached entry.
///
/// # Example
///
/// ```
/// use std::path::{Path, PathBuf};
/// use imagecache::cache::{entry_path, derive_key, Namespace};
///
/// let key = derive_key("https://x/y/z.png");
/// let path = entry_path(Path::new("/cache"), &Namespace::supplements(), &key);
/// assert_eq!(path, PathBuf::from("/cache/supplements/z.png"));
/// ```
pub fn entry_path(cache_dir: &Path, namespace: &Namespace, key: &CacheKey) -> PathBuf {
    namespace_directory(cache_dir, namespace).join(key.as_str())
}

/// Get the staging directory used for atomic publishes.
pub fn staging_directory(cache_dir: &Path) -> PathBuf {
    cache_dir.join(STAGING_DIR_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::key::derive_key;

    #[test]
    fn test_entry_path_member_portal() {
        let cache_dir = PathBuf::from("/home/user/.local/share/imagecache");
        let key = derive_key("https://cdn.example.com/programs/42/hero.jpg");

        let path = entry_path(&cache_dir, &Namespace::member_portal(), &key);

        assert_eq!(
            path,
            PathBuf::from("/home/user/.local/share/imagecache/member_portal/hero.jpg")
        );
    }

    #[test]
    fn test_namespaces_are_isolated() {
        let cache_dir = PathBuf::from("/cache");
        let key = derive_key("https://h/a.png");

        let a = entry_path(&cache_dir, &Namespace::supplements(), &key);
        let b = entry_path(&cache_dir, &Namespace::member_portal(), &key);

        assert_ne!(a, b);
        assert_eq!(a.file_name(), b.file_name());
    }

    #[test]
    fn test_entry_is_inside_namespace_directory() {
        let cache_dir = PathBuf::from("/cache");
        let ns = Namespace::new("thumbs").unwrap();
        let key = derive_key("https://h/t.webp");

        let path = entry_path(&cache_dir, &ns, &key);
        assert_eq!(path.parent(), Some(namespace_directory(&cache_dir, &ns).as_path()));
    }

    #[test]
    fn test_staging_directory() {
        let dir = staging_directory(Path::new("/cache"));
        assert_eq!(dir, PathBuf::from("/cache/.staging"));
    }
}
