//! Broadsheet Processing Library
//!
//! The dithering engine: turns an uploaded photograph into a 1-bit black and
//! white PNG suitable for print, using Floyd-Steinberg error diffusion.
//!
//! All operations are synchronous and CPU bound; async callers should run
//! [`DitherProcessor::dither`] on a blocking thread.

pub mod image;

pub use crate::image::{DitherProcessor, MAX_SOURCE_DIMENSION, SUPPORTED_FORMATS};
