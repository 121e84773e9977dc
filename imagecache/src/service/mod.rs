//! High-level image cache facade.
//!
//! [`ImageCache`] wires the entry store, fetcher and task spawner together
//! and exposes the lookup and bulk operations.
//!
//! ```ignore
//! use imagecache::records::Supplement;
//! use imagecache::service::ImageCache;
//!
//! let mut supplements = vec![
//!     Supplement::new(1, "https://cdn.example.com/s/a.png"),
//!     Supplement::new(2, "https://cdn.example.com/s/b.png"),
//! ];
//!
//! // Fills missing images and removes cached images of other supplements
//! cache.bulk_insert_home(&mut supplements);
//! ```

mod facade;

pub use facade::{BulkSummary, ImageCache};
