//! Block pixelation and colour quantisation.

use super::{byte, map_rgb};
use crate::core::error::StageError;
use crate::core::stage::{ensure_non_empty, Stage, StageContext};
use image::RgbaImage;

/// Replaces each block of `scale` pixels with the colour at its centre.
///
/// The grid is anchored at the frame's midpoint rounded to a multiple of the
/// block size, which puts block boundaries on the integral grid. Samples
/// that would land past the border are clamped back inside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pixellate {
    /// Block size in pixels, at least 1.
    pub scale: f32,
}

impl Pixellate {
    /// Create a pixellate stage.
    pub fn new(scale: f32) -> Self {
        Self {
            scale: scale.max(1.0),
        }
    }

    /// Grid anchor for a frame of the given size.
    pub fn grid_center(&self, width: u32, height: u32) -> (f32, f32) {
        let s = self.scale;
        let mid_x = width as f32 / 2.0;
        let mid_y = height as f32 / 2.0;
        ((mid_x / s).round() * s, (mid_y / s).round() * s)
    }
}

impl Default for Pixellate {
    fn default() -> Self {
        Self::new(8.0)
    }
}

impl Stage for Pixellate {
    fn name(&self) -> &'static str {
        "pixellate"
    }

    fn apply(&self, input: &RgbaImage, _ctx: &StageContext) -> Result<RgbaImage, StageError> {
        ensure_non_empty(self.name(), input)?;
        let (width, height) = input.dimensions();
        let s = self.scale;
        let (cx, cy) = self.grid_center(width, height);

        let sample = |p: u32, center: f32, limit: u32| -> u32 {
            let block = ((p as f32 + 0.5 - center) / s).floor();
            let at = center + (block + 0.5) * s;
            (at.floor() as i64).clamp(0, limit as i64 - 1) as u32
        };

        Ok(RgbaImage::from_fn(width, height, |x, y| {
            *input.get_pixel(sample(x, cx, width), sample(y, cy, height))
        }))
    }
}

/// Quantises each colour channel to `levels` evenly spaced values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Posterize {
    /// Number of levels per channel, 2..=64.
    pub levels: u32,
}

impl Posterize {
    /// Create a posterize stage.
    pub fn new(levels: u32) -> Self {
        Self {
            levels: levels.clamp(2, 64),
        }
    }
}

impl Default for Posterize {
    fn default() -> Self {
        Self::new(6)
    }
}

impl Stage for Posterize {
    fn name(&self) -> &'static str {
        "posterize"
    }

    fn apply(&self, input: &RgbaImage, _ctx: &StageContext) -> Result<RgbaImage, StageError> {
        ensure_non_empty(self.name(), input)?;
        let steps = (self.levels - 1) as f32;
        Ok(map_rgb(input, |rgb| rgb.map(|c| (c * steps).round() / steps)))
    }
}

/// The distinct values a posterized channel can take.
pub fn posterize_levels(levels: u32) -> Vec<u8> {
    let steps = (levels.clamp(2, 64) - 1) as f32;
    (0..=steps as u32)
        .map(|i| byte(i as f32 / steps))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Extent;
    use crate::stages::testing::gradient;
    use image::Rgba;
    use std::collections::HashSet;

    fn ctx() -> StageContext {
        StageContext::new(Extent::new(0, 0, 40, 40), None)
    }

    #[test]
    fn test_scale_one_is_identity() {
        let input = gradient(7, 5);
        assert_eq!(Pixellate::new(1.0).apply(&input, &ctx()).unwrap(), input);
    }

    #[test]
    fn test_grid_center_is_multiple_of_scale() {
        let stage = Pixellate::new(18.0);
        let (cx, cy) = stage.grid_center(100, 75);
        assert_eq!(cx % 18.0, 0.0);
        assert_eq!(cy % 18.0, 0.0);
        assert_eq!((cx, cy), (54.0, 36.0));
    }

    #[test]
    fn test_blocks_are_uniform() {
        let input = RgbaImage::from_fn(36, 36, |x, y| Rgba([(x * 7) as u8, (y * 7) as u8, 0, 255]));
        let output = Pixellate::new(18.0).apply(&input, &ctx()).unwrap();
        assert_eq!(output.dimensions(), (36, 36));
        let first = *output.get_pixel(0, 0);
        for y in 0..18 {
            for x in 0..18 {
                assert_eq!(*output.get_pixel(x, y), first);
            }
        }
        assert_ne!(*output.get_pixel(18, 0), first);
        // Block centre sample at (9, 9).
        assert_eq!(first.0, [63, 63, 0, 255]);
    }

    #[test]
    fn test_huge_scale_on_tiny_frame() {
        let input = RgbaImage::from_pixel(1, 1, Rgba([10, 20, 30, 255]));
        let output = Pixellate::new(18.0).apply(&input, &ctx()).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn test_posterize_limits_palette() {
        let input = RgbaImage::from_fn(256, 1, |x, _| Rgba([x as u8, x as u8, x as u8, 255]));
        let output = Posterize::new(6).apply(&input, &ctx()).unwrap();
        let values: HashSet<u8> = output.pixels().map(|p| p[0]).collect();
        let allowed: HashSet<u8> = posterize_levels(6).into_iter().collect();
        assert_eq!(values, allowed);
        assert_eq!(allowed.len(), 6);
    }

    #[test]
    fn test_posterize_preserves_alpha() {
        let input = RgbaImage::from_pixel(2, 2, Rgba([100, 150, 200, 77]));
        let output = Posterize::new(2).apply(&input, &ctx()).unwrap();
        assert_eq!(output.get_pixel(1, 1).0, [0, 255, 255, 77]);
    }
}
