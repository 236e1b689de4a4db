//! Broadsheet Infrastructure Library
//!
//! Shared infrastructure for the Broadsheet binaries:
//! - Telemetry initialization (tracing subscriber, text or JSON output)
//! - The JSON error payload returned by HTTP handlers

pub mod error;
pub mod telemetry;

// Re-export commonly used types
pub use error::ErrorResponse;
pub use telemetry::{init_telemetry, shutdown_telemetry, LogFormat};
