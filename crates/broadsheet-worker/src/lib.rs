//! Broadsheet Worker: image processing queue and background worker.
//!
//! [`ProcessingQueue`] mediates access to the image store (batch selection,
//! claims, terminal transitions). [`ImageWorker`] drives it: single-item and
//! batch processing, the continuous polling loop and its cooperative stop.

mod in_flight;
mod queue;
mod settle;
mod worker;

pub use in_flight::{InFlightGuard, InFlightSet};
pub use queue::ProcessingQueue;
pub use settle::{settle_all, SettleReport};
pub use worker::{ImageWorker, ProcessedImage};
