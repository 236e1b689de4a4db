//! Broadsheet DB: the image store.
//!
//! Rows of the `images` table carry both the file references and the
//! processing lifecycle (status, attempts, timestamps, last error). The
//! [`ImageRepository`] is the only writer of the lifecycle columns.

pub mod db;

pub use db::image::{ImageRepository, STALE_CLAIM_ERROR};
pub use db::pool::{connect, run_migrations};
