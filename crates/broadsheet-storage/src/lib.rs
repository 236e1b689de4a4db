//! Broadsheet Storage Library
//!
//! Durable file storage for the image pipeline: the `Storage` trait and a local
//! filesystem implementation.
//!
//! # Key format
//!
//! Keys are relative paths under the storage root. Originals are referenced by
//! the `original_path` of their row; dithered outputs live at
//! `{processed_prefix}/{id}_processed.png` (see [`keys::processed_key`]).
//!
//! Keys must not contain `..` or a leading `/`.

pub mod keys;
pub mod local;
pub mod traits;

// Re-export commonly used types
pub use keys::processed_key;
pub use local::LocalStorage;
pub use traits::{Storage, StorageError, StorageResult};
