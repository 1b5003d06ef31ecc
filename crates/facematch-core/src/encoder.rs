//! Face crop → model input tensor.
//!
//! MobileFaceNet takes a 112x112 RGB crop as a flat NHWC float buffer,
//! normalized with `(byte - 128) / 128`.

use image::RgbImage;
use thiserror::Error;

// Fixed by the training preprocessing of the shipped model asset.
pub const INPUT_SIZE: usize = 112;
pub const IMAGE_MEAN: f32 = 128.0;
pub const IMAGE_STD: f32 = 128.0;
pub const CHANNELS: usize = 3;

/// Number of floats in one encoded face tensor.
pub const TENSOR_LEN: usize = INPUT_SIZE * INPUT_SIZE * CHANNELS;

#[derive(Error, Debug, PartialEq)]
pub enum EncodeError {
    #[error("face grid must be {INPUT_SIZE}x{INPUT_SIZE}, got side {side} with {pixels} pixels")]
    InvalidGrid { side: usize, pixels: usize },
}

#[inline]
fn normalize(channel: u8) -> f32 {
    (channel as f32 - IMAGE_MEAN) / IMAGE_STD
}

/// Encode a square grid of packed `0x??RRGGBB` pixels.
///
/// Output is row-major and channel-interleaved: `[r0, g0, b0, r1, g1, b1, ...]`.
pub fn encode(pixels: &[u32], side: usize) -> Result<Vec<f32>, EncodeError> {
    if side != INPUT_SIZE || pixels.len() != side * side {
        return Err(EncodeError::InvalidGrid {
            side,
            pixels: pixels.len(),
        });
    }

    let mut tensor = Vec::with_capacity(TENSOR_LEN);
    for &pixel in pixels {
        tensor.push(normalize((pixel >> 16 & 0xFF) as u8));
        tensor.push(normalize((pixel >> 8 & 0xFF) as u8));
        tensor.push(normalize((pixel & 0xFF) as u8));
    }

    Ok(tensor)
}

/// Pack an RGB image into `0x00RRGGBB` pixels, row by row.
pub fn pack_rgb(image: &RgbImage) -> Vec<u32> {
    image
        .pixels()
        .map(|p| {
            let [r, g, b] = p.0;
            (r as u32) << 16 | (g as u32) << 8 | b as u32
        })
        .collect()
}

/// Encode a 112x112 RGB crop directly.
pub fn encode_rgb(image: &RgbImage) -> Result<Vec<f32>, EncodeError> {
    if image.width() != image.height() {
        return Err(EncodeError::InvalidGrid {
            side: image.width() as usize,
            pixels: image.width() as usize * image.height() as usize,
        });
    }
    encode(&pack_rgb(image), image.width() as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn grid(pixel: u32) -> Vec<u32> {
        vec![pixel; INPUT_SIZE * INPUT_SIZE]
    }

    #[test]
    fn test_encode_output_length() {
        let tensor = encode(&grid(0x00336699), INPUT_SIZE).unwrap();
        assert_eq!(tensor.len(), TENSOR_LEN);
        assert_eq!(TENSOR_LEN, 112 * 112 * 3);
    }

    #[test]
    fn test_encode_normalization_extremes() {
        let black = encode(&grid(0x00000000), INPUT_SIZE).unwrap();
        assert!(black.iter().all(|&v| v == -1.0));

        let white = encode(&grid(0x00FFFFFF), INPUT_SIZE).unwrap();
        let expected = (255.0 - 128.0) / 128.0;
        assert!(white.iter().all(|&v| (v - expected).abs() < 1e-6));
    }

    #[test]
    fn test_encode_mean_pixel_is_zero() {
        let tensor = encode(&grid(0x00808080), INPUT_SIZE).unwrap();
        assert!(tensor.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_encode_channel_order_is_rgb() {
        // Alpha byte is ignored.
        let tensor = encode(&grid(0xFF_FF_80_00), INPUT_SIZE).unwrap();
        assert!((tensor[0] - 127.0 / 128.0).abs() < 1e-6);
        assert_eq!(tensor[1], 0.0);
        assert_eq!(tensor[2], -1.0);
    }

    #[test]
    fn test_encode_row_major_layout() {
        let mut pixels = grid(0);
        // Row 1, column 2.
        pixels[INPUT_SIZE + 2] = 0x00FFFFFF;
        let tensor = encode(&pixels, INPUT_SIZE).unwrap();
        let offset = (INPUT_SIZE + 2) * CHANNELS;
        assert!(tensor[offset] > 0.9);
        assert_eq!(tensor[offset - 1], -1.0);
        assert_eq!(tensor[offset + CHANNELS], -1.0);
    }

    #[test]
    fn test_encode_values_in_range() {
        let pixels: Vec<u32> = (0..(INPUT_SIZE * INPUT_SIZE) as u32)
            .map(|i| i.wrapping_mul(2654435761))
            .collect();
        let tensor = encode(&pixels, INPUT_SIZE).unwrap();
        assert!(tensor.iter().all(|v| (-1.0..=1.0).contains(v)));
    }

    #[test]
    fn test_encode_rejects_wrong_side() {
        let err = encode(&vec![0; 64 * 64], 64).unwrap_err();
        assert_eq!(err, EncodeError::InvalidGrid { side: 64, pixels: 64 * 64 });
    }

    #[test]
    fn test_encode_rejects_short_buffer() {
        assert!(encode(&[0; 10], INPUT_SIZE).is_err());
    }

    #[test]
    fn test_encode_rgb_matches_packed() {
        let img = RgbImage::from_pixel(INPUT_SIZE as u32, INPUT_SIZE as u32, Rgb([10, 200, 128]));
        let direct = encode_rgb(&img).unwrap();
        let packed = encode(&grid(0x000AC880), INPUT_SIZE).unwrap();
        assert_eq!(direct, packed);
    }

    #[test]
    fn test_encode_rgb_rejects_non_square() {
        let img = RgbImage::new(3, 2);
        assert_eq!(encode_rgb(&img).unwrap_err(), EncodeError::InvalidGrid { side: 3, pixels: 6 });
    }

    #[test]
    fn test_pack_rgb_layout() {
        let img = RgbImage::from_pixel(1, 1, Rgb([0x12, 0x34, 0x56]));
        assert_eq!(pack_rgb(&img), vec![0x00123456]);
    }
}
