//! Neighbourhood stages: Gaussian blur, bloom and luminance sharpening.
//!
//! All three pad with clamped edges before filtering and crop back after.

use super::edge::{blur_margin, with_padding};
use super::{byte, luma, unit};
use crate::core::error::StageError;
use crate::core::stage::{ensure_non_empty, EdgeMode, Stage, StageContext};
use image::{Rgba, Rgba32FImage, RgbaImage};
use imageproc::filter::gaussian_blur_f32;

/// Gaussian blur with no edge handling. `sigma` must be positive.
///
/// Filtering runs on a float copy so uniform regions round back exactly.
pub(crate) fn gaussian(image: &RgbaImage, sigma: f32) -> RgbaImage {
    let (width, height) = image.dimensions();
    let linear = Rgba32FImage::from_fn(width, height, |x, y| Rgba(image.get_pixel(x, y).0.map(unit)));
    let blurred = gaussian_blur_f32(&linear, sigma);
    RgbaImage::from_fn(width, height, |x, y| Rgba(blurred.get_pixel(x, y).0.map(byte)))
}

/// Gaussian blur of the padded frame. `sigma` must be positive.
fn blur_padded(image: &RgbaImage, sigma: f32, mode: EdgeMode) -> RgbaImage {
    with_padding(image, blur_margin(sigma), mode, |padded| gaussian(padded, sigma))
}

/// Gaussian blur.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianBlur {
    /// Standard deviation in pixels. 0 disables the stage.
    pub radius: f32,
    /// How the border is extended before blurring.
    pub edge: EdgeMode,
}

impl GaussianBlur {
    /// Blur with clamped edges.
    pub fn new(radius: f32) -> Self {
        Self {
            radius: radius.clamp(0.0, 100.0),
            edge: EdgeMode::Clamp,
        }
    }

    /// Set the edge mode.
    pub fn with_edge(mut self, edge: EdgeMode) -> Self {
        self.edge = edge;
        self
    }
}

impl Default for GaussianBlur {
    fn default() -> Self {
        Self::new(10.0)
    }
}

impl Stage for GaussianBlur {
    fn name(&self) -> &'static str {
        "gaussian_blur"
    }

    fn apply(&self, input: &RgbaImage, _ctx: &StageContext) -> Result<RgbaImage, StageError> {
        ensure_non_empty(self.name(), input)?;
        if self.radius <= 0.0 {
            return Ok(input.clone());
        }
        Ok(blur_padded(input, self.radius, self.edge))
    }
}

/// Soft glow: a blurred copy screen-composited over the frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bloom {
    /// Blur radius of the glow.
    pub radius: f32,
    /// Opacity of the glow, 0..=1.
    pub intensity: f32,
}

impl Bloom {
    /// Create a bloom stage.
    pub fn new(radius: f32, intensity: f32) -> Self {
        Self {
            radius: radius.clamp(0.0, 100.0),
            intensity: intensity.clamp(0.0, 1.0),
        }
    }
}

impl Default for Bloom {
    fn default() -> Self {
        Self::new(10.0, 0.5)
    }
}

impl Stage for Bloom {
    fn name(&self) -> &'static str {
        "bloom"
    }

    fn apply(&self, input: &RgbaImage, _ctx: &StageContext) -> Result<RgbaImage, StageError> {
        ensure_non_empty(self.name(), input)?;
        if self.intensity <= 0.0 {
            return Ok(input.clone());
        }

        let glow = if self.radius > 0.0 {
            blur_padded(input, self.radius, EdgeMode::Clamp)
        } else {
            input.clone()
        };

        let intensity = self.intensity;
        let mut output = input.clone();
        for (out, glow) in output.pixels_mut().zip(glow.pixels()) {
            for c in 0..3 {
                let base = unit(out[c]);
                let light = unit(glow[c]);
                out[c] = byte(base + intensity * light * (1.0 - base));
            }
        }
        Ok(output)
    }
}

/// Unsharp mask applied to luma only, so edges sharpen without colour fringes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SharpenLuminance {
    /// Strength, 0..=2.
    pub sharpness: f32,
    /// Radius of the blur the detail is measured against.
    pub radius: f32,
}

impl SharpenLuminance {
    /// Sharpen with the default radius.
    pub fn new(sharpness: f32) -> Self {
        Self {
            sharpness: sharpness.clamp(0.0, 2.0),
            radius: 1.69,
        }
    }

    /// Set the radius.
    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius.clamp(0.0, 20.0);
        self
    }
}

impl Default for SharpenLuminance {
    fn default() -> Self {
        Self::new(0.4)
    }
}

impl Stage for SharpenLuminance {
    fn name(&self) -> &'static str {
        "sharpen_luminance"
    }

    fn apply(&self, input: &RgbaImage, _ctx: &StageContext) -> Result<RgbaImage, StageError> {
        ensure_non_empty(self.name(), input)?;
        if self.sharpness <= 0.0 || self.radius <= 0.0 {
            return Ok(input.clone());
        }

        let blurred = blur_padded(input, self.radius, EdgeMode::Clamp);
        let sharpness = self.sharpness;
        let mut output = input.clone();
        for (out, soft) in output.pixels_mut().zip(blurred.pixels()) {
            let rgb = [unit(out[0]), unit(out[1]), unit(out[2])];
            let soft = [unit(soft[0]), unit(soft[1]), unit(soft[2])];
            let detail = sharpness * (luma(rgb) - luma(soft));
            for c in 0..3 {
                out[c] = byte(rgb[c] + detail);
            }
        }
        Ok(output)
    }
}
