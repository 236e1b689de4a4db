//! Floyd-Steinberg error diffusion on 8-bit grayscale buffers.

/// Pixels below this value become black, the rest white.
pub const THRESHOLD: u8 = 128;

// (dx, dy, weight) of the four forward neighbours.
const KERNEL: [(isize, usize, f64); 4] = [
    (1, 0, 7.0 / 16.0),
    (-1, 1, 3.0 / 16.0),
    (0, 1, 5.0 / 16.0),
    (1, 1, 1.0 / 16.0),
];

/// Quantize `pixels` (row-major, `width × height`) in place to 0/255.
///
/// Scans left to right, top to bottom. Each pixel is thresholded and its
/// quantization error is pushed onto the right, bottom-left, bottom and
/// bottom-right neighbours. Updated neighbours are clamped to `0..=255` and
/// truncated back to integers before they are visited.
pub fn floyd_steinberg(pixels: &mut [u8], width: usize, height: usize) {
    debug_assert_eq!(pixels.len(), width * height);

    for y in 0..height {
        for x in 0..width {
            let idx = y * width + x;
            let old = pixels[idx];
            let new = if old < THRESHOLD { 0 } else { 255 };
            pixels[idx] = new;

            let error = old as f64 - new as f64;
            if error == 0.0 {
                continue;
            }

            for &(dx, dy, weight) in &KERNEL {
                let nx = x as isize + dx;
                let ny = y + dy;
                if nx < 0 || nx as usize >= width || ny >= height {
                    continue;
                }
                let n = ny * width + nx as usize;
                let value = pixels[n] as f64 + error * weight;
                pixels[n] = value.clamp(0.0, 255.0) as u8;
            }
        }
    }
}
