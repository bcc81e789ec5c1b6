//! Edge handling for neighbourhood stages.
//!
//! Anything that reads outside a pixel (blur, bloom, sharpen, grain) pads its
//! input first and crops back to the original integral extent afterwards, so
//! no transparent fringe can creep in from beyond the border.

use crate::core::stage::EdgeMode;
use crate::core::types::Extent;
use image::{imageops, Rgba, RgbaImage};

/// Grow `image` by `margin` pixels on every side.
pub fn pad(image: &RgbaImage, margin: u32, mode: EdgeMode) -> RgbaImage {
    let (width, height) = image.dimensions();
    if margin == 0 || width == 0 || height == 0 {
        return image.clone();
    }

    let max_x = width as i64 - 1;
    let max_y = height as i64 - 1;
    let m = margin as i64;

    RgbaImage::from_fn(width + 2 * margin, height + 2 * margin, |x, y| {
        let sx = x as i64 - m;
        let sy = y as i64 - m;
        match mode {
            EdgeMode::Clamp => *image.get_pixel(sx.clamp(0, max_x) as u32, sy.clamp(0, max_y) as u32),
            EdgeMode::Transparent => {
                if (0..=max_x).contains(&sx) && (0..=max_y).contains(&sy) {
                    *image.get_pixel(sx as u32, sy as u32)
                } else {
                    Rgba([0, 0, 0, 0])
                }
            }
        }
    })
}

/// Copy the region `extent` out of `image`.
///
/// Negative origins and overhangs are clipped to the image.
pub fn crop(image: &RgbaImage, extent: Extent) -> RgbaImage {
    let x = extent.x.max(0) as u32;
    let y = extent.y.max(0) as u32;
    imageops::crop_imm(image, x, y, extent.width, extent.height).to_image()
}

/// Pad, run `op`, then crop back to the input's extent.
pub fn with_padding<F>(image: &RgbaImage, margin: u32, mode: EdgeMode, op: F) -> RgbaImage
where
    F: FnOnce(&RgbaImage) -> RgbaImage,
{
    if margin == 0 {
        return op(image);
    }
    let padded = pad(image, margin, mode);
    let processed = op(&padded);
    crop(
        &processed,
        Extent::new(margin as i64, margin as i64, image.width(), image.height()),
    )
}

/// Margin that covers a Gaussian of standard deviation `sigma`.
pub(crate) fn blur_margin(sigma: f32) -> u32 {
    (3.0 * sigma.max(0.0)).ceil() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn two_by_two() -> RgbaImage {
        let mut image = RgbaImage::new(2, 2);
        image.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        image.put_pixel(1, 0, Rgba([0, 255, 0, 255]));
        image.put_pixel(0, 1, Rgba([0, 0, 255, 255]));
        image.put_pixel(1, 1, Rgba([255, 255, 255, 255]));
        image
    }

    #[test]
    fn test_pad_clamp_repeats_edges() {
        let padded = pad(&two_by_two(), 2, EdgeMode::Clamp);
        assert_eq!(padded.dimensions(), (6, 6));
        assert_eq!(padded.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(padded.get_pixel(5, 0).0, [0, 255, 0, 255]);
        assert_eq!(padded.get_pixel(5, 5).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_pad_transparent_fills_clear() {
        let padded = pad(&two_by_two(), 1, EdgeMode::Transparent);
        assert_eq!(padded.get_pixel(0, 0).0, [0, 0, 0, 0]);
        assert_eq!(padded.get_pixel(1, 1).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_with_padding_restores_extent() {
        let image = two_by_two();
        let out = with_padding(&image, 3, EdgeMode::Clamp, |padded| padded.clone());
        assert_eq!(out, image);
    }

    #[test]
    fn test_blur_margin() {
        assert_eq!(blur_margin(0.0), 0);
        assert_eq!(blur_margin(0.8), 3);
        assert_eq!(blur_margin(12.0), 36);
    }

    proptest! {
        #[test]
        fn prop_pad_crop_is_identity(w in 1u32..12, h in 1u32..12, margin in 0u32..6) {
            let image = RgbaImage::from_fn(w, h, |x, y| Rgba([x as u8, y as u8, 7, 255]));
            let padded = pad(&image, margin, EdgeMode::Clamp);
            let back = crop(&padded, Extent::new(margin as i64, margin as i64, w, h));
            prop_assert_eq!(back, image);
        }
    }
}
