//! Built-in stage implementations.
//!
//! Every stage works on RGBA8 frames with per-pixel maths in `f32` on the
//! unit interval. Alpha passes through untouched unless a stage says
//! otherwise.

pub mod edge;
mod blur;
mod color;
mod grain;
mod pixel;
mod vignette;

use image::RgbaImage;

// Re-export for direct access
pub use blur::{Bloom, GaussianBlur, SharpenLuminance};
pub use color::{
    ColorControls, Exposure, ForceOpaque, HueAdjust, SepiaTone, TemperatureTint, Vibrance,
    WhitePoint,
};
pub use edge::{crop, pad, with_padding};
pub use grain::{BlendMode, Grain};
pub use pixel::{Pixellate, Posterize};
pub use vignette::Vignette;

/// Byte to unit interval.
#[inline]
pub(crate) fn unit(v: u8) -> f32 {
    v as f32 / 255.0
}

/// Unit interval to byte, clamping.
#[inline]
pub(crate) fn byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Rec. 601 luma.
#[inline]
pub(crate) fn luma(rgb: [f32; 3]) -> f32 {
    0.299 * rgb[0] + 0.587 * rgb[1] + 0.114 * rgb[2]
}

/// Apply `f` to the colour channels of every pixel, keeping alpha.
pub(crate) fn map_rgb<F>(input: &RgbaImage, f: F) -> RgbaImage
where
    F: Fn([f32; 3]) -> [f32; 3],
{
    let mut output = input.clone();
    for px in output.chunks_exact_mut(4) {
        let rgb = f([unit(px[0]), unit(px[1]), unit(px[2])]);
        px[0] = byte(rgb[0]);
        px[1] = byte(rgb[1]);
        px[2] = byte(rgb[2]);
    }
    output
}

/// Like [`map_rgb`] but with the pixel's coordinates.
pub(crate) fn map_rgb_at<F>(input: &RgbaImage, f: F) -> RgbaImage
where
    F: Fn(u32, u32, [f32; 3]) -> [f32; 3],
{
    let width = input.width() as usize;
    let mut output = input.clone();
    for (i, px) in output.chunks_exact_mut(4).enumerate() {
        let (x, y) = ((i % width) as u32, (i / width) as u32);
        let rgb = f(x, y, [unit(px[0]), unit(px[1]), unit(px[2])]);
        px[0] = byte(rgb[0]);
        px[1] = byte(rgb[1]);
        px[2] = byte(rgb[2]);
    }
    output
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_byte_round_trip() {
        for v in [0u8, 1, 127, 128, 254, 255] {
            assert_eq!(byte(unit(v)), v);
        }
        assert_eq!(byte(1.7), 255);
        assert_eq!(byte(-0.2), 0);
    }

    #[test]
    fn test_map_rgb_at_coordinates() {
        let input = RgbaImage::new(3, 2);
        let output = map_rgb_at(&input, |x, y, _| {
            [x as f32 / 255.0, y as f32 / 255.0, 0.0]
        });
        assert_eq!(output.get_pixel(2, 1).0, [2, 1, 0, 0]);
    }

    #[test]
    fn test_pixels_visited_in_row_order_on_caller_thread() {
        use std::cell::RefCell;

        let input = RgbaImage::new(3, 2);
        let visited = RefCell::new(Vec::new());
        let caller = std::thread::current().id();
        map_rgb_at(&input, |x, y, rgb| {
            assert_eq!(std::thread::current().id(), caller);
            visited.borrow_mut().push((x, y));
            rgb
        });
        assert_eq!(
            visited.into_inner(),
            vec![(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]
        );

        let calls = std::cell::Cell::new(0);
        map_rgb(&input, |rgb| {
            calls.set(calls.get() + 1);
            rgb
        });
        assert_eq!(calls.get(), 6);
    }
}
