//! Per-pixel colour stages: tone, white balance, hue, saturation, exposure.

use super::{luma, map_rgb};
use crate::core::error::StageError;
use crate::core::stage::{ensure_non_empty, Stage, StageContext};
use image::RgbaImage;

/// Classic sepia colour matrix, mixed with the original by `intensity`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SepiaTone {
    /// 0 leaves the frame alone, 1 is full sepia.
    pub intensity: f32,
}

impl SepiaTone {
    /// Create a sepia stage.
    pub fn new(intensity: f32) -> Self {
        Self {
            intensity: intensity.clamp(0.0, 1.0),
        }
    }
}

impl Default for SepiaTone {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Stage for SepiaTone {
    fn name(&self) -> &'static str {
        "sepia_tone"
    }

    fn apply(&self, input: &RgbaImage, _ctx: &StageContext) -> Result<RgbaImage, StageError> {
        ensure_non_empty(self.name(), input)?;
        if self.intensity <= 0.0 {
            return Ok(input.clone());
        }

        let i = self.intensity;
        Ok(map_rgb(input, |[r, g, b]| {
            let sr = 0.393 * r + 0.769 * g + 0.189 * b;
            let sg = 0.349 * r + 0.686 * g + 0.168 * b;
            let sb = 0.272 * r + 0.534 * g + 0.131 * b;
            [
                r + (sr - r) * i,
                g + (sg - g) * i,
                b + (sb - b) * i,
            ]
        }))
    }
}

/// White balance shift between two colour temperatures, plus a green/magenta tint.
///
/// Channel gains are the ratio of the target white to the neutral white,
/// normalised so overall luminance is unchanged. A target above the neutral
/// temperature cools the frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureTint {
    /// Temperature the frame is assumed to be balanced for, in Kelvin.
    pub neutral: f32,
    /// Temperature to rebalance to, in Kelvin.
    pub target: f32,
    /// Positive pushes toward magenta, negative toward green.
    pub tint: f32,
}

/// Neutral daylight white.
pub const D65_KELVIN: f32 = 6500.0;

impl TemperatureTint {
    /// Shift from the D65 neutral to `target`.
    pub fn new(target: f32) -> Self {
        Self {
            neutral: D65_KELVIN,
            target: target.clamp(1000.0, 40000.0),
            tint: 0.0,
        }
    }

    /// Set the tint.
    pub fn with_tint(mut self, tint: f32) -> Self {
        self.tint = tint.clamp(-150.0, 150.0);
        self
    }

    /// Per-channel gains this shift applies.
    pub fn gains(&self) -> [f32; 3] {
        let neutral = kelvin_to_rgb(self.neutral);
        let target = kelvin_to_rgb(self.target);
        let mut gains = [
            target[0] / neutral[0].max(1e-3),
            target[1] / neutral[1].max(1e-3),
            target[2] / neutral[2].max(1e-3),
        ];
        gains[1] *= 1.0 - self.tint / 1000.0;

        let norm = luma(gains);
        if norm > 0.0 {
            for g in &mut gains {
                *g /= norm;
            }
        }
        gains
    }
}

impl Default for TemperatureTint {
    fn default() -> Self {
        Self::new(D65_KELVIN)
    }
}

impl Stage for TemperatureTint {
    fn name(&self) -> &'static str {
        "temperature_tint"
    }

    fn apply(&self, input: &RgbaImage, _ctx: &StageContext) -> Result<RgbaImage, StageError> {
        ensure_non_empty(self.name(), input)?;
        if (self.target - self.neutral).abs() < f32::EPSILON && self.tint == 0.0 {
            return Ok(input.clone());
        }

        let [gr, gg, gb] = self.gains();
        Ok(map_rgb(input, |[r, g, b]| [r * gr, g * gg, b * gb]))
    }
}

/// Approximate RGB of a black body at `kelvin`, each channel in 0..=1.
///
/// Curve fit good from 1000 K to 40000 K.
pub fn kelvin_to_rgb(kelvin: f32) -> [f32; 3] {
    let t = kelvin.clamp(1000.0, 40000.0) / 100.0;

    let r = if t <= 66.0 {
        255.0
    } else {
        329.698_73 * (t - 60.0).powf(-0.133_204_76)
    };
    let g = if t <= 66.0 {
        99.470_8 * t.ln() - 161.119_57
    } else {
        288.122_16 * (t - 60.0).powf(-0.075_514_85)
    };
    let b = if t >= 66.0 {
        255.0
    } else if t <= 19.0 {
        0.0
    } else {
        138.517_73 * (t - 10.0).ln() - 305.044_8
    };

    [
        r.clamp(0.0, 255.0) / 255.0,
        g.clamp(0.0, 255.0) / 255.0,
        b.clamp(0.0, 255.0) / 255.0,
    ]
}

/// Hue rotation in YIQ space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HueAdjust {
    /// Rotation in radians.
    pub angle: f32,
}

impl HueAdjust {
    /// Rotate by `angle` radians.
    pub fn new(angle: f32) -> Self {
        Self {
            angle: angle.clamp(-std::f32::consts::PI, std::f32::consts::PI),
        }
    }

    /// Rotate by `degrees`.
    pub fn degrees(degrees: f32) -> Self {
        Self::new(degrees.to_radians())
    }
}

impl Stage for HueAdjust {
    fn name(&self) -> &'static str {
        "hue_adjust"
    }

    fn apply(&self, input: &RgbaImage, _ctx: &StageContext) -> Result<RgbaImage, StageError> {
        ensure_non_empty(self.name(), input)?;
        if self.angle == 0.0 {
            return Ok(input.clone());
        }

        let (sin, cos) = self.angle.sin_cos();
        Ok(map_rgb(input, |[r, g, b]| {
            let y = 0.299 * r + 0.587 * g + 0.114 * b;
            let i = 0.596 * r - 0.274 * g - 0.322 * b;
            let q = 0.211 * r - 0.523 * g + 0.312 * b;

            let i2 = i * cos - q * sin;
            let q2 = i * sin + q * cos;

            [
                y + 0.956 * i2 + 0.621 * q2,
                y - 0.272 * i2 - 0.647 * q2,
                y - 1.106 * i2 + 1.703 * q2,
            ]
        }))
    }
}

/// Saturation boost that favours muted colours over already vivid ones.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vibrance {
    /// -1 mutes, 1 boosts.
    pub amount: f32,
}

impl Vibrance {
    /// Create a vibrance stage.
    pub fn new(amount: f32) -> Self {
        Self {
            amount: amount.clamp(-1.0, 1.0),
        }
    }
}

impl Stage for Vibrance {
    fn name(&self) -> &'static str {
        "vibrance"
    }

    fn apply(&self, input: &RgbaImage, _ctx: &StageContext) -> Result<RgbaImage, StageError> {
        ensure_non_empty(self.name(), input)?;
        if self.amount == 0.0 {
            return Ok(input.clone());
        }

        let amount = self.amount;
        Ok(map_rgb(input, |rgb| {
            let max = rgb[0].max(rgb[1]).max(rgb[2]);
            let min = rgb[0].min(rgb[1]).min(rgb[2]);
            let scale = 1.0 + amount * (1.0 - (max - min));
            let y = luma(rgb);
            [
                y + (rgb[0] - y) * scale,
                y + (rgb[1] - y) * scale,
                y + (rgb[2] - y) * scale,
            ]
        }))
    }
}

/// Saturation, brightness and contrast in one pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorControls {
    /// 0 is greyscale, 1 unchanged.
    pub saturation: f32,
    /// Added to every channel.
    pub brightness: f32,
    /// Scales distance from mid-grey.
    pub contrast: f32,
}

impl ColorControls {
    /// Create with explicit values.
    pub fn new(saturation: f32, brightness: f32, contrast: f32) -> Self {
        Self {
            saturation: saturation.clamp(0.0, 3.0),
            brightness: brightness.clamp(-1.0, 1.0),
            contrast: contrast.clamp(0.25, 4.0),
        }
    }

    fn is_neutral(&self) -> bool {
        self.saturation == 1.0 && self.brightness == 0.0 && self.contrast == 1.0
    }
}

impl Default for ColorControls {
    fn default() -> Self {
        Self::new(1.0, 0.0, 1.0)
    }
}

impl Stage for ColorControls {
    fn name(&self) -> &'static str {
        "color_controls"
    }

    fn apply(&self, input: &RgbaImage, _ctx: &StageContext) -> Result<RgbaImage, StageError> {
        ensure_non_empty(self.name(), input)?;
        if self.is_neutral() {
            return Ok(input.clone());
        }

        let Self {
            saturation,
            brightness,
            contrast,
        } = *self;
        Ok(map_rgb(input, |rgb| {
            let y = luma(rgb);
            rgb.map(|c| {
                let c = y + (c - y) * saturation + brightness;
                (c - 0.5) * contrast + 0.5
            })
        }))
    }
}

/// Exposure in stops: every channel is multiplied by `2^ev`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Exposure {
    /// Stops of exposure compensation.
    pub ev: f32,
}

impl Exposure {
    /// Create an exposure stage.
    pub fn new(ev: f32) -> Self {
        Self {
            ev: ev.clamp(-10.0, 10.0),
        }
    }
}

impl Stage for Exposure {
    fn name(&self) -> &'static str {
        "exposure"
    }

    fn apply(&self, input: &RgbaImage, _ctx: &StageContext) -> Result<RgbaImage, StageError> {
        ensure_non_empty(self.name(), input)?;
        if self.ev == 0.0 {
            return Ok(input.clone());
        }

        let gain = self.ev.exp2();
        Ok(map_rgb(input, |rgb| rgb.map(|c| c * gain)))
    }
}

/// Rebalances the white point by per-channel gains.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WhitePoint {
    /// Colour that pure white maps to.
    pub color: [f32; 3],
}

impl WhitePoint {
    /// Map white to `color`.
    pub fn new(color: [f32; 3]) -> Self {
        Self {
            color: color.map(|c| c.max(0.0)),
        }
    }

    /// An icy bias: less red, more blue, by `shift`.
    pub fn cool(shift: f32) -> Self {
        Self::new([1.0 - shift * 0.5, 1.0, 1.0 + shift])
    }
}

impl Default for WhitePoint {
    fn default() -> Self {
        Self::new([1.0, 1.0, 1.0])
    }
}

impl Stage for WhitePoint {
    fn name(&self) -> &'static str {
        "white_point"
    }

    fn apply(&self, input: &RgbaImage, _ctx: &StageContext) -> Result<RgbaImage, StageError> {
        ensure_non_empty(self.name(), input)?;
        if self.color == [1.0, 1.0, 1.0] {
            return Ok(input.clone());
        }

        let [wr, wg, wb] = self.color;
        Ok(map_rgb(input, |[r, g, b]| [r * wr, g * wg, b * wb]))
    }
}

/// Sets every pixel fully opaque.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ForceOpaque;

impl Stage for ForceOpaque {
    fn name(&self) -> &'static str {
        "force_opaque"
    }

    fn apply(&self, input: &RgbaImage, _ctx: &StageContext) -> Result<RgbaImage, StageError> {
        ensure_non_empty(self.name(), input)?;
        let mut output = input.clone();
        for pixel in output.pixels_mut() {
            pixel[3] = u8::MAX;
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Extent;
    use crate::stages::testing::gradient;
    use image::Rgba;

    fn ctx() -> StageContext {
        StageContext::new(Extent::new(0, 0, 8, 8), None)
    }

    fn channel_sums(image: &RgbaImage) -> [u64; 3] {
        image.pixels().fold([0; 3], |mut acc, p| {
            for c in 0..3 {
                acc[c] += p[c] as u64;
            }
            acc
        })
    }

    #[test]
    fn test_neutral_parameters_are_identity() {
        let input = gradient(8, 8);
        let stages: Vec<Box<dyn Stage>> = vec![
            Box::new(SepiaTone::new(0.0)),
            Box::new(TemperatureTint::default()),
            Box::new(HueAdjust::default()),
            Box::new(Vibrance::default()),
            Box::new(ColorControls::default()),
            Box::new(Exposure::default()),
            Box::new(WhitePoint::default()),
        ];
        for stage in stages {
            assert_eq!(stage.apply(&input, &ctx()).unwrap(), input, "{}", stage.name());
        }
    }

    #[test]
    fn test_sepia_full_intensity() {
        let input = RgbaImage::from_pixel(1, 1, Rgba([255, 255, 255, 128]));
        let output = SepiaTone::new(1.0).apply(&input, &ctx()).unwrap();
        let p = output.get_pixel(0, 0);
        // White saturates red and green; blue lands at 0.937.
        assert_eq!(p[0], 255);
        assert_eq!(p[1], 255);
        assert_eq!(p[2], 239);
        assert_eq!(p[3], 128);
    }

    #[test]
    fn test_higher_target_is_cooler() {
        let input = RgbaImage::from_pixel(4, 4, Rgba([128, 128, 128, 255]));
        let cooled = TemperatureTint::new(9000.0).apply(&input, &ctx()).unwrap();
        let p = cooled.get_pixel(0, 0);
        assert!(p[2] > p[0], "blue {} should exceed red {}", p[2], p[0]);

        let warmed = TemperatureTint::new(3000.0).apply(&input, &ctx()).unwrap();
        let p = warmed.get_pixel(0, 0);
        assert!(p[0] > p[2]);
    }

    #[test]
    fn test_temperature_gains_preserve_luma() {
        let gains = TemperatureTint::new(8000.0).with_tint(20.0).gains();
        assert!((luma(gains) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_kelvin_curve_endpoints() {
        let warm = kelvin_to_rgb(1000.0);
        assert_eq!(warm[0], 1.0);
        assert_eq!(warm[2], 0.0);
        let d65 = kelvin_to_rgb(6500.0);
        assert!(d65.iter().all(|c| *c > 0.9));
    }

    #[test]
    fn test_hue_keeps_grey() {
        let input = RgbaImage::from_pixel(2, 2, Rgba([90, 90, 90, 255]));
        let output = HueAdjust::degrees(-14.0).apply(&input, &ctx()).unwrap();
        for p in output.pixels() {
            for c in 0..3 {
                assert!((p[c] as i32 - 90).abs() <= 1);
            }
        }
    }

    #[test]
    fn test_full_hue_turn_changes_colour() {
        let input = RgbaImage::from_pixel(1, 1, Rgba([220, 40, 40, 255]));
        let output = HueAdjust::degrees(120.0).apply(&input, &ctx()).unwrap();
        let p = output.get_pixel(0, 0);
        assert!(p[0] < 200);
    }

    #[test]
    fn test_vibrance_boosts_muted_more() {
        let muted = RgbaImage::from_pixel(1, 1, Rgba([140, 120, 110, 255]));
        let stage = Vibrance::new(0.5);
        let out = stage.apply(&muted, &ctx()).unwrap();
        let before = 140 - 110;
        let p = out.get_pixel(0, 0);
        assert!((p[0] as i32 - p[2] as i32) > before);
    }

    #[test]
    fn test_color_controls_desaturate() {
        let output = ColorControls::new(0.0, 0.0, 1.0)
            .apply(&gradient(4, 4), &ctx())
            .unwrap();
        for p in output.pixels() {
            assert!((p[0] as i32 - p[1] as i32).abs() <= 1);
            assert!((p[1] as i32 - p[2] as i32).abs() <= 1);
        }
    }

    #[test]
    fn test_exposure_one_stop_doubles() {
        let input = RgbaImage::from_pixel(1, 1, Rgba([50, 60, 70, 255]));
        let output = Exposure::new(1.0).apply(&input, &ctx()).unwrap();
        assert_eq!(output.get_pixel(0, 0).0, [100, 120, 140, 255]);
    }

    #[test]
    fn test_white_point_cool_bias() {
        let input = RgbaImage::from_pixel(1, 1, Rgba([200, 200, 200, 255]));
        let output = WhitePoint::cool(0.1).apply(&input, &ctx()).unwrap();
        let p = output.get_pixel(0, 0);
        assert!(p[2] > p[1] && p[1] > p[0]);
    }

    #[test]
    fn test_force_opaque() {
        let input = RgbaImage::from_pixel(2, 1, Rgba([1, 2, 3, 0]));
        let output = ForceOpaque.apply(&input, &ctx()).unwrap();
        assert!(output.pixels().all(|p| p.0 == [1, 2, 3, 255]));
    }

    #[test]
    fn test_sepia_warms_frame() {
        let input = gradient(8, 8);
        let output = SepiaTone::new(0.55).apply(&input, &ctx()).unwrap();
        let [r, _, b] = channel_sums(&output);
        assert!(r > b);
    }

    #[test]
    fn test_empty_input_is_error() {
        let empty = RgbaImage::new(0, 0);
        assert!(matches!(
            Exposure::new(1.0).apply(&empty, &ctx()),
            Err(StageError::EmptyInput { stage: "exposure" })
        ));
    }
}
