//! Broadsheet Core Library
//!
//! Domain models, error types and configuration shared by every crate of the
//! image pipeline: the image store, the dithering engine, the worker and the
//! operator surfaces (HTTP and CLI).

pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{Config, ProcessingConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{ImageRecord, NewImage, ProcessingStatus, QueueStatus, StatusCounts};
