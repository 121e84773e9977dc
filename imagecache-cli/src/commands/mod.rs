//! CLI command implementations.
//!
//! - [`get`] - Resolve a single image
//! - [`sync`] - Bulk fill and reconcile
//! - [`entries`] - List and clear namespace contents
//! - [`init`] - Configuration initialization

pub mod entries;
pub mod get;
pub mod init;
pub mod sync;
