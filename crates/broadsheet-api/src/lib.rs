//! Broadsheet API: HTTP invocation surface for the image processing queue.
//!
//! Routes:
//! - `GET /health` liveness and dependency check
//! - `GET /api/processing/status` queue counts, in-flight jobs, worker state
//! - `POST /api/processing/status` operator actions (`reset_failed`,
//!   `process_image`, `start_worker`, `stop_worker`)

pub mod error;
pub mod handlers;
pub mod setup;
pub mod state;

pub use setup::{build_router, initialize_app};
pub use state::AppState;
