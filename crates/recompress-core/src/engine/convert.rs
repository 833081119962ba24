//! Pixel layout conversions feeding the encoders.

/// ITU-R BT.601 weights, the ones JPEG's YCbCr transform uses for luma.
const LUMA_R: u32 = 299;
const LUMA_G: u32 = 587;
const LUMA_B: u32 = 114;

/// Drop the alpha channel of interleaved RGBA samples.
pub fn rgba_to_rgb(rgba: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
    for px in rgba.chunks_exact(4) {
        rgb.extend_from_slice(&px[..3]);
    }
    rgb
}

/// Collapse interleaved RGBA samples to one luma byte per pixel.
pub fn rgba_to_luma(rgba: &[u8]) -> Vec<u8> {
    rgba.chunks_exact(4)
        .map(|px| {
            let sum = LUMA_R * px[0] as u32 + LUMA_G * px[1] as u32 + LUMA_B * px[2] as u32;
            ((sum + 500) / 1000) as u8
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgba_to_rgb_drops_alpha() {
        let rgba = [1, 2, 3, 4, 5, 6, 7, 8];
        assert_eq!(rgba_to_rgb(&rgba), vec![1, 2, 3, 5, 6, 7]);
    }

    #[test]
    fn test_luma_of_gray_is_identity() {
        for v in [0u8, 64, 128, 192, 255] {
            assert_eq!(rgba_to_luma(&[v, v, v, 255]), vec![v]);
        }
    }

    #[test]
    fn test_luma_primaries() {
        assert_eq!(rgba_to_luma(&[255, 0, 0, 255]), vec![76]);
        assert_eq!(rgba_to_luma(&[0, 255, 0, 255]), vec![150]);
        assert_eq!(rgba_to_luma(&[0, 0, 255, 255]), vec![29]);
    }
}
