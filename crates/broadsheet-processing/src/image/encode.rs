//! 1-bit indexed PNG output.

use png::{BitDepth, ColorType, Compression, Encoder, EncodingError};

/// Palette index 0 = black, 1 = white.
const BILEVEL_PALETTE: [u8; 6] = [0, 0, 0, 255, 255, 255];

/// Pack a 0/255 buffer into 1-bit rows (MSB first, rows padded to a byte).
pub fn pack_bilevel(pixels: &[u8], width: usize, height: usize) -> Vec<u8> {
    let stride = width.div_ceil(8);
    let mut packed = vec![0u8; stride * height];

    for y in 0..height {
        let row = &pixels[y * width..(y + 1) * width];
        let out = &mut packed[y * stride..(y + 1) * stride];
        for (x, &p) in row.iter().enumerate() {
            if p != 0 {
                out[x / 8] |= 0x80 >> (x % 8);
            }
        }
    }

    packed
}

/// Encode a dithered buffer as a two-colour palette PNG at maximum compression.
pub fn encode_bilevel_png(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>, EncodingError> {
    let packed = pack_bilevel(pixels, width as usize, height as usize);

    let mut out = Vec::with_capacity(packed.len() / 4 + 128);
    {
        let mut encoder = Encoder::new(&mut out, width, height);
        encoder.set_color(ColorType::Indexed);
        encoder.set_depth(BitDepth::One);
        encoder.set_palette(&BILEVEL_PALETTE[..]);
        encoder.set_compression(Compression::Best);

        let mut writer = encoder.write_header()?;
        writer.write_image_data(&packed)?;
        writer.finish()?;
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_bilevel_msb_first() {
        // 10 px wide: two bytes per row, last 6 bits padding
        let row = [255, 0, 0, 0, 0, 0, 0, 255, 255, 0];
        let packed = pack_bilevel(&row, 10, 1);
        assert_eq!(packed, vec![0b1000_0001, 0b1000_0000]);
    }

    #[test]
    fn test_encoded_png_is_one_bit_indexed() {
        let pixels = [0u8, 255, 255, 0, 0, 255];
        let data = encode_bilevel_png(&pixels, 3, 2).unwrap();

        let decoder = png::Decoder::new(std::io::Cursor::new(data));
        let reader = decoder.read_info().unwrap();
        let info = reader.info();
        assert_eq!((info.width, info.height), (3, 2));
        assert_eq!(info.color_type, ColorType::Indexed);
        assert_eq!(info.bit_depth, BitDepth::One);
        assert_eq!(info.palette.as_deref(), Some(&BILEVEL_PALETTE[..]));
    }
}
