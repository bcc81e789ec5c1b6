//! Radial darkening about the frame centre.

use super::map_rgb_at;
use crate::core::error::StageError;
use crate::core::stage::{ensure_non_empty, Stage, StageContext};
use image::RgbaImage;

/// Radial darkening anchored at the frame centre.
///
/// Distance is measured from the centre in units of the half diagonal, so
/// the falloff has the same shape at any resolution. A larger `radius`
/// pushes the darkening further out. Alpha is left untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vignette {
    /// Strength, 0..=2.
    pub intensity: f32,
    /// Relative falloff, > 0.
    pub radius: f32,
}

impl Vignette {
    /// Create a vignette stage.
    pub fn new(intensity: f32, radius: f32) -> Self {
        Self {
            intensity: intensity.clamp(0.0, 2.0),
            radius: radius.clamp(0.01, 5.0),
        }
    }

    /// Brightness multiplier at normalised distance `d` (0 centre, 1 corner).
    pub fn falloff(&self, d: f32) -> f32 {
        let t = (d * 2.0 / self.radius).powi(2).min(1.0);
        let smooth = t * t * (3.0 - 2.0 * t);
        (1.0 - self.intensity * smooth).max(0.0)
    }
}

impl Default for Vignette {
    fn default() -> Self {
        Self::new(0.5, 2.0)
    }
}

impl Stage for Vignette {
    fn name(&self) -> &'static str {
        "vignette"
    }

    fn apply(&self, input: &RgbaImage, _ctx: &StageContext) -> Result<RgbaImage, StageError> {
        ensure_non_empty(self.name(), input)?;
        if self.intensity <= 0.0 {
            return Ok(input.clone());
        }

        let (width, height) = input.dimensions();
        let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
        let half_diagonal = (cx * cx + cy * cy).sqrt();

        Ok(map_rgb_at(input, |x, y, rgb| {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            let d = (dx * dx + dy * dy).sqrt() / half_diagonal;
            let k = self.falloff(d);
            rgb.map(|c| c * k)
        }))
    }
}
