//! Procedural film grain.
//!
//! The noise field is monochrome, generated over the padded frame so the
//! softening blur has real noise to read at the border, then cropped back
//! and blended at `amount` opacity.

use super::blur::gaussian;
use super::edge::{blur_margin, crop};
use super::{byte, unit};
use crate::core::error::StageError;
use crate::core::stage::{ensure_non_empty, Stage, StageContext};
use crate::core::types::Extent;
use image::{Rgba, RgbaImage};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// How the grain layer is composited over the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Gentle contrast, natural looking.
    #[default]
    SoftLight,
    /// Stronger, crisper grain.
    Overlay,
}

impl BlendMode {
    /// Blend one channel of `layer` over `base`, both on the unit interval.
    pub fn blend(self, base: f32, layer: f32) -> f32 {
        match self {
            BlendMode::SoftLight => soft_light_channel(base, layer),
            BlendMode::Overlay => overlay_channel(base, layer),
        }
    }
}

fn overlay_channel(base: f32, blend: f32) -> f32 {
    if base < 0.5 {
        2.0 * base * blend
    } else {
        1.0 - 2.0 * (1.0 - base) * (1.0 - blend)
    }
}

fn soft_light_channel(base: f32, blend: f32) -> f32 {
    if blend <= 0.5 {
        base - (1.0 - 2.0 * blend) * base * (1.0 - base)
    } else {
        let d = if base <= 0.25 {
            ((16.0 * base - 12.0) * base + 4.0) * base
        } else {
            base.sqrt()
        };
        base + (2.0 * blend - 1.0) * (d - base)
    }
}

/// Monochrome noise blended over the frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grain {
    /// Opacity of the grain layer, 0..=1.
    pub amount: f32,
    /// Blur applied to the noise before blending.
    pub softness: f32,
    /// Size of one noise cell in pixels, 0.25..=4.
    pub scale: f32,
    /// Composite mode.
    pub mode: BlendMode,
}

impl Grain {
    /// Create a grain stage with unit scale.
    pub fn new(amount: f32, softness: f32, mode: BlendMode) -> Self {
        Self {
            amount: amount.clamp(0.0, 1.0),
            softness: softness.clamp(0.0, 10.0),
            scale: 1.0,
            mode,
        }
    }

    /// Set the noise cell size.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale.clamp(0.25, 4.0);
        self
    }

    /// Render the noise layer for a frame of the given size.
    pub fn noise(&self, width: u32, height: u32, ctx: &StageContext) -> RgbaImage {
        let margin = if self.softness > 0.0 {
            blur_margin(self.softness)
        } else {
            0
        };
        let (pw, ph) = (width + 2 * margin, height + 2 * margin);

        let (cells_x, cells_y) = cell_grid(pw, ph, self.scale);
        let mut rng = ctx.rng();
        let cells: Vec<u8> = (0..cells_x * cells_y).map(|_| rng.gen()).collect();

        let scale = self.scale;
        let field = RgbaImage::from_fn(pw, ph, |x, y| {
            let cx = ((x as f32 / scale) as usize).min(cells_x - 1);
            let cy = ((y as f32 / scale) as usize).min(cells_y - 1);
            let v = cells[cy * cells_x + cx];
            Rgba([v, v, v, u8::MAX])
        });

        if margin == 0 {
            return field;
        }
        let softened = gaussian(&field, self.softness);
        crop(
            &softened,
            Extent::new(margin as i64, margin as i64, width, height),
        )
    }
}

/// Noise cells covering a `width` x `height` field, with one spare per axis.
fn cell_grid(width: u32, height: u32, scale: f32) -> (usize, usize) {
    let cells = |len: u32| (len as f64 / scale as f64).ceil() as usize + 1;
    (cells(width), cells(height))
}

impl Default for Grain {
    fn default() -> Self {
        Self::new(0.12, 0.6, BlendMode::SoftLight)
    }
}

impl Stage for Grain {
    fn name(&self) -> &'static str {
        "grain"
    }

    fn is_deterministic(&self) -> bool {
        false
    }

    fn apply(&self, input: &RgbaImage, ctx: &StageContext) -> Result<RgbaImage, StageError> {
        ensure_non_empty(self.name(), input)?;
        if self.amount <= 0.0 {
            return Ok(input.clone());
        }

        let noise = self.noise(input.width(), input.height(), ctx);
        let (amount, mode) = (self.amount, self.mode);
        let mut output = input.clone();
        for (out, n) in output.pixels_mut().zip(noise.pixels()) {
            let layer = unit(n[0]);
            for c in 0..3 {
                let base = unit(out[c]);
                let blended = mode.blend(base, layer);
                out[c] = byte(base + (blended - base) * amount);
            }
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::testing::gradient;

    fn seeded(seed: u64) -> StageContext {
        StageContext::new(Extent::new(0, 0, 16, 16), Some(seed))
    }

    #[test]
    fn test_blend_modes_keep_mid_grey_neutral() {
        for mode in [BlendMode::SoftLight, BlendMode::Overlay] {
            // A 50% grey layer leaves soft-light unchanged.
            let v = mode.blend(0.3, 0.5);
            if mode == BlendMode::SoftLight {
                assert!((v - 0.3).abs() < 1e-6);
            }
            assert!((0.0..=1.0).contains(&v));
        }
        assert!((overlay_channel(0.25, 0.5) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_zero_amount_is_identity() {
        let input = gradient(8, 8);
        let stage = Grain::new(0.0, 0.6, BlendMode::SoftLight);
        assert_eq!(stage.apply(&input, &seeded(1)).unwrap(), input);
    }

    #[test]
    fn test_seeded_grain_is_repeatable() {
        let input = gradient(12, 9);
        let stage = Grain::new(0.28, 1.2, BlendMode::Overlay).with_scale(1.4);
        let a = stage.apply(&input, &seeded(42)).unwrap();
        let b = stage.apply(&input, &seeded(42)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.dimensions(), (12, 9));

        let c = stage.apply(&input, &seeded(43)).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_grain_preserves_alpha() {
        let input = RgbaImage::from_pixel(5, 5, Rgba([120, 120, 120, 200]));
        let output = Grain::new(1.0, 0.0, BlendMode::Overlay)
            .apply(&input, &seeded(3))
            .unwrap();
        assert!(output.pixels().all(|p| p[3] == 200));
        assert!(output.pixels().any(|p| p[0] != 120));
    }

    #[test]
    fn test_cell_grid_counts_past_u32() {
        let (cx, cy) = cell_grid(40_000, 40_000, 0.25);
        assert_eq!((cx, cy), (160_001, 160_001));
        assert!(cx * cy > u32::MAX as usize);
    }

    #[test]
    fn test_fine_noise_on_narrow_frame() {
        let grain = Grain::new(0.5, 0.0, BlendMode::Overlay).with_scale(0.25);
        let noise = grain.noise(2, 300, &seeded(5));
        assert_eq!(noise.dimensions(), (2, 300));
    }

    #[test]
    fn test_noise_is_monochrome() {
        let stage = Grain::new(0.5, 0.6, BlendMode::SoftLight).with_scale(2.0);
        let noise = stage.noise(10, 6, &seeded(9));
        assert_eq!(noise.dimensions(), (10, 6));
        assert!(noise.pixels().all(|p| p[0] == p[1] && p[1] == p[2]));
    }

    #[test]
    fn test_grain_is_not_deterministic() {
        assert!(!Grain::default().is_deterministic());
    }
}
