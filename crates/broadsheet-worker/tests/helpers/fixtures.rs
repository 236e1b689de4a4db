use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use std::io::Cursor;

/// Diagonal gradient PNG of the given size
pub fn png_fixture(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        let v = ((x + y) * 255 / (width + height)) as u8;
        Rgb([v, 255 - v, v / 2])
    });
    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    buffer
}
