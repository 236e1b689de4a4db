//! Dithering processor - validation, metadata and the dithering pipeline

use crate::image::dither::floyd_steinberg;
use crate::image::encode::encode_bilevel_png;
use crate::image::resize::ImageResize;
use broadsheet_core::AppError;
use image::{ImageFormat, ImageReader};
use std::io::Cursor;

/// Raster formats accepted as dithering sources.
pub const SUPPORTED_FORMATS: [ImageFormat; 5] = [
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::WebP,
    ImageFormat::Gif,
    ImageFormat::Tiff,
];

/// Sanity bound on either source dimension.
pub const MAX_SOURCE_DIMENSION: u32 = 10_000;

pub struct DitherProcessor;

impl DitherProcessor {
    /// Whether `data` is a supported image with sane dimensions. Reads the
    /// header only and never fails: any decode problem yields `false`.
    pub fn validate(data: &[u8]) -> bool {
        let reader = match ImageReader::new(Cursor::new(data)).with_guessed_format() {
            Ok(reader) => reader,
            Err(_) => return false,
        };

        match reader.format() {
            Some(format) if SUPPORTED_FORMATS.contains(&format) => {}
            _ => return false,
        }

        match reader.into_dimensions() {
            Ok((width, height)) => {
                width > 0
                    && height > 0
                    && width <= MAX_SOURCE_DIMENSION
                    && height <= MAX_SOURCE_DIMENSION
            }
            Err(e) => {
                tracing::debug!(error = %e, "Image header could not be read");
                false
            }
        }
    }

    /// Pixel dimensions from the image header.
    pub fn dimensions(data: &[u8]) -> Result<(u32, u32), AppError> {
        ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| AppError::Decode(e.to_string()))?
            .into_dimensions()
            .map_err(|e| AppError::Decode(e.to_string()))
    }

    /// Size the dithered output will have for a source of the given size.
    pub fn output_dimensions(
        width: u32,
        height: u32,
        max_width: u32,
        max_height: u32,
    ) -> (u32, u32) {
        ImageResize::fit_within(width, height, max_width, max_height)
    }

    /// Decode, shrink to fit `max_width × max_height`, convert to grayscale,
    /// dither with Floyd-Steinberg and encode as a 1-bit PNG.
    pub fn dither(data: &[u8], max_width: u32, max_height: u32) -> Result<Vec<u8>, AppError> {
        let start = std::time::Instant::now();

        let img = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| AppError::Processing(e.to_string()))?
            .decode()
            .map_err(|e| AppError::Processing(e.to_string()))?;

        let resized = ImageResize::resize_to_fit(img, max_width, max_height);
        let gray = resized.to_luma8();
        let (width, height) = gray.dimensions();

        let mut pixels = gray.into_raw();
        floyd_steinberg(&mut pixels, width as usize, height as usize);

        let encoded = encode_bilevel_png(&pixels, width, height)
            .map_err(|e| AppError::Processing(e.to_string()))?;

        tracing::debug!(
            width,
            height,
            input_bytes = data.len(),
            output_bytes = encoded.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Image dithered"
        );

        Ok(encoded)
    }
}
