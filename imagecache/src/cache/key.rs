//! Cache key derivation.
//!
//! A cache key is the last `/`-separated segment of a resource identifier.
//! Every component that maps identifiers to stored entries (lookups, fills,
//! reconciliation) goes through [`derive_key`] so they always agree.
//!
//! Two identifiers that share a trailing segment map to the same key:
//!
//! ```
//! use imagecache::cache::derive_key;
//!
//! let a = derive_key("https://cdn-a.example.com/img/logo.png");
//! let b = derive_key("https://cdn-b.example.com/other/logo.png");
//! assert_eq!(a, b);
//! ```
//!
//! This module does not perform any I/O.

use std::fmt;

/// Filename-like key identifying an entry within a namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Wrap an already-derived key (e.g. a filename read back from disk).
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this key can name a file inside a namespace directory.
    ///
    /// Identifiers ending in `/` (or `/.`, `/..`) derive keys that would
    /// resolve to a directory rather than a file.
    pub fn is_storable(&self) -> bool {
        !matches!(self.0.as_str(), "" | "." | "..") && !self.0.contains(['/', '\\'])
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Derive the cache key for a resource identifier.
///
/// Returns the final segment after splitting on `/`. Identifiers without a
/// separator are their own key.
pub fn derive_key(identifier: &str) -> CacheKey {
    let name = identifier.rsplit('/').next().unwrap_or(identifier);
    CacheKey(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_key_takes_last_segment() {
        let key = derive_key("https://x/y/z.png");
        assert_eq!(key.as_str(), "z.png");
    }

    #[test]
    fn test_derive_key_without_separator() {
        assert_eq!(derive_key("plain.jpg").as_str(), "plain.jpg");
    }

    #[test]
    fn test_derive_key_deterministic() {
        let url = "https://upload.wikimedia.org/wikipedia/commons/thumb/9/97/Earth.jpg/1920px-Earth.jpg";
        assert_eq!(derive_key(url), derive_key(url));
        assert_eq!(derive_key(url).as_str(), "1920px-Earth.jpg");
    }

    #[test]
    fn test_derive_key_keeps_query_string() {
        // The whole trailing segment is the key, query included.
        assert_eq!(derive_key("https://h/a.png?v=2").as_str(), "a.png?v=2");
    }

    #[test]
    fn test_same_trailing_segment_collides() {
        assert_eq!(
            derive_key("https://a.example/one/pic.png"),
            derive_key("https://b.example/two/pic.png")
        );
    }

    #[test]
    fn test_trailing_slash_is_not_storable() {
        let key = derive_key("https://host/dir/");
        assert_eq!(key.as_str(), "");
        assert!(!key.is_storable());
    }

    #[test]
    fn test_dot_segments_are_not_storable() {
        assert!(!derive_key("https://host/.").is_storable());
        assert!(!derive_key("https://host/..").is_storable());
        assert!(derive_key("https://host/.hidden.png").is_storable());
        assert!(!CacheKey::new("sub/dir.png").is_storable());
    }

    #[test]
    fn test_display_matches_as_str() {
        let key = CacheKey::new("a.png");
        assert_eq!(key.to_string(), "a.png");
    }
}
