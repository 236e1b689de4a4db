use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};

/// Image resize operations
pub struct ImageResize;

impl ImageResize {
    /// Largest size that fits inside `max_width × max_height` with the source
    /// aspect ratio. Never upscales: a source that already fits is returned
    /// unchanged.
    pub fn fit_within(
        orig_width: u32,
        orig_height: u32,
        max_width: u32,
        max_height: u32,
    ) -> (u32, u32) {
        if orig_width == 0 || orig_height == 0 {
            return (orig_width, orig_height);
        }
        if orig_width <= max_width && orig_height <= max_height {
            return (orig_width, orig_height);
        }

        let scale = (max_width as f64 / orig_width as f64)
            .min(max_height as f64 / orig_height as f64);
        let width = ((orig_width as f64 * scale).round() as u32).clamp(1, max_width.max(1));
        let height = ((orig_height as f64 * scale).round() as u32).clamp(1, max_height.max(1));
        (width, height)
    }

    /// Select appropriate filter type based on resize ratio
    pub fn select_filter(
        orig_width: u32,
        orig_height: u32,
        new_width: u32,
        new_height: u32,
    ) -> FilterType {
        let width_ratio = orig_width as f32 / new_width as f32;
        let height_ratio = orig_height as f32 / new_height as f32;
        let max_ratio = width_ratio.max(height_ratio);

        if max_ratio > 2.0 {
            FilterType::Triangle
        } else if max_ratio > 1.5 {
            FilterType::CatmullRom
        } else {
            FilterType::Lanczos3
        }
    }

    /// Shrink `img` to fit inside the bounds ("fit inside, no enlargement").
    pub fn resize_to_fit(img: DynamicImage, max_width: u32, max_height: u32) -> DynamicImage {
        let (orig_width, orig_height) = img.dimensions();
        let (width, height) = Self::fit_within(orig_width, orig_height, max_width, max_height);
        if (width, height) == (orig_width, orig_height) {
            return img;
        }

        let filter = Self::select_filter(orig_width, orig_height, width, height);
        img.resize_exact(width, height, filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn test_fit_within_preserves_aspect_ratio() {
        assert_eq!(ImageResize::fit_within(2000, 2000, 1200, 1200), (1200, 1200));
        assert_eq!(ImageResize::fit_within(3000, 1000, 1200, 1200), (1200, 400));
        assert_eq!(ImageResize::fit_within(1000, 4000, 1200, 1200), (300, 1200));
        assert_eq!(ImageResize::fit_within(1600, 900, 800, 800), (800, 450));
    }

    #[test]
    fn test_fit_within_never_upscales() {
        assert_eq!(ImageResize::fit_within(640, 480, 1200, 1200), (640, 480));
        assert_eq!(ImageResize::fit_within(1200, 1200, 1200, 1200), (1200, 1200));
    }

    #[test]
    fn test_fit_within_keeps_extreme_ratios_non_zero() {
        assert_eq!(ImageResize::fit_within(10000, 1, 1200, 1200), (1200, 1));
    }

    #[test]
    fn test_select_filter() {
        assert_eq!(
            ImageResize::select_filter(3000, 3000, 1000, 1000),
            FilterType::Triangle
        );
        assert_eq!(
            ImageResize::select_filter(1800, 1800, 1000, 1000),
            FilterType::CatmullRom
        );
        assert_eq!(
            ImageResize::select_filter(1200, 1200, 1000, 1000),
            FilterType::Lanczos3
        );
    }

    #[test]
    fn test_resize_to_fit() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(400, 200, Luma([10])));
        let resized = ImageResize::resize_to_fit(img, 100, 100);
        assert_eq!(resized.dimensions(), (100, 50));

        let small = DynamicImage::ImageLuma8(GrayImage::from_pixel(40, 20, Luma([10])));
        let untouched = ImageResize::resize_to_fit(small, 100, 100);
        assert_eq!(untouched.dimensions(), (40, 20));
    }
}
