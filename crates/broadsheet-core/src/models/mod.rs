pub mod image;

pub use image::{ImageRecord, NewImage, ProcessingStatus, QueueStatus, StatusCounts};
