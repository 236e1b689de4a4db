//! Image processing module
//!
//! - Format and dimension validation, metadata (processor)
//! - Fit-inside resizing (resize)
//! - Floyd-Steinberg error diffusion (dither)
//! - 1-bit indexed PNG output (encode)

pub mod dither;
pub mod encode;
pub mod processor;
pub mod resize;

pub use processor::{DitherProcessor, MAX_SOURCE_DIMENSION, SUPPORTED_FORMATS};
pub use resize::ImageResize;
