//! Tracing initialization
//!
//! The filter comes from `RUST_LOG` when set, otherwise
//! `broadsheet=info,tower_http=info`. `LOG_FORMAT=json` switches to
//! newline-delimited JSON output.

mod init_basic;

pub use init_basic::{init_telemetry, shutdown_telemetry, LogFormat};
