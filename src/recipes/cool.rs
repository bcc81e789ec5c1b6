//! Cool, airy looks built on a temperature shift plus a teal hue nudge.

use super::{cool_amount_parameter, radius_parameter, vignette_parameters};
use crate::core::param::{ParameterDefinition, ResolvedParameters};
use crate::core::recipe::{Category, Pipeline, Recipe, RecipeMetadata};
use crate::stages::{
    Bloom, Exposure, HueAdjust, SharpenLuminance, TemperatureTint, Vibrance, Vignette, WhitePoint,
};

const NEUTRAL_KELVIN: f32 = 6500.0;

fn vibrance_parameter(default: f64) -> ParameterDefinition {
    ParameterDefinition::float("vibrance", default)
        .with_description("Keeps colours lively after the cool shift")
        .with_range(-1.0, 1.0)
}

fn bloom_parameters(radius: f64, intensity: f64) -> [ParameterDefinition; 2] {
    [
        radius_parameter("bloom_radius", radius, 50.0)
            .with_description("Glow spread")
            .with_group("Bloom"),
        ParameterDefinition::float("bloom_intensity", intensity)
            .with_description("Glow strength")
            .with_range(0.0, 1.0)
            .with_group("Bloom"),
    ]
}

/// Shared front of both cool looks: temperature toward `span` Kelvin above
/// neutral, then a hue turn of `degrees`, both scaled by `cool`.
fn cool_shift(pipeline: Pipeline, cool: f32, span: f32, degrees: f32) -> Pipeline {
    pipeline
        .then(TemperatureTint::new(NEUTRAL_KELVIN + cool * span))
        .then(HueAdjust::degrees(degrees * cool))
}

/// Daylight shift, a teal hint, gentle vibrance, soft bloom and a subtle vignette.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArcticMist;

impl Recipe for ArcticMist {
    fn metadata(&self) -> RecipeMetadata {
        let [bloom_radius, bloom_intensity] = bloom_parameters(8.0, 0.2);
        let [vignette_intensity, vignette_radius] = vignette_parameters(0.35, 1.6);
        RecipeMetadata::builder("arctic_mist", "Arctic Mist")
            .description("Crisp and cool: daylight shift, teal hint, gentle vibrance and a soft bloom")
            .category(Category::Cool)
            .parameter(cool_amount_parameter(0.6))
            .parameter(vibrance_parameter(0.25))
            .parameter(bloom_radius)
            .parameter(bloom_intensity)
            .parameter(vignette_intensity)
            .parameter(vignette_radius)
            .tags(["cool", "teal", "bloom", "airy"])
            .build()
    }

    fn pipeline(&self, params: &ResolvedParameters) -> Pipeline {
        cool_shift(Pipeline::new(), params.float("cool_amount"), 1500.0, -12.0)
            .then(Vibrance::new(params.float("vibrance")))
            .then(Bloom::new(
                params.float("bloom_radius"),
                params.float("bloom_intensity"),
            ))
            .then(Vignette::new(
                params.float("vignette_intensity"),
                params.float("vignette_radius"),
            ))
    }
}

/// A punchier, brighter cool look: deeper shift, icy white point, clean
/// bloom and crisp edges.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolarRadiance;

impl Recipe for PolarRadiance {
    fn metadata(&self) -> RecipeMetadata {
        let [bloom_radius, bloom_intensity] = bloom_parameters(12.0, 0.35);
        let [vignette_intensity, vignette_radius] = vignette_parameters(0.2, 2.0);
        RecipeMetadata::builder("polar_radiance", "Polar Radiance")
            .description("Bright and icy: deep cool shift, cyan highlights, bloom and a light sharpen")
            .category(Category::Cool)
            .parameter(cool_amount_parameter(0.8))
            .parameter(vibrance_parameter(0.35))
            .parameter(
                ParameterDefinition::float("white_point_shift", 0.02)
                    .with_description("Bias of whites toward cyan")
                    .with_range(0.0, 0.1),
            )
            .parameter(
                ParameterDefinition::float("exposure_ev", 0.25)
                    .with_description("Extra brightness in stops")
                    .with_range(-2.0, 2.0),
            )
            .parameter(bloom_radius)
            .parameter(bloom_intensity)
            .parameter(
                ParameterDefinition::float("sharpen", 0.3)
                    .with_description("Edge crispness after the bloom")
                    .with_range(0.0, 2.0),
            )
            .parameter(vignette_intensity)
            .parameter(vignette_radius)
            .tags(["cool", "bright", "bloom", "crisp"])
            .build()
    }

    fn pipeline(&self, params: &ResolvedParameters) -> Pipeline {
        cool_shift(Pipeline::new(), params.float("cool_amount"), 2500.0, -14.0)
            .then(Vibrance::new(params.float("vibrance")))
            .then(WhitePoint::cool(params.float("white_point_shift")))
            .then(Exposure::new(params.float("exposure_ev")))
            .then(Bloom::new(
                params.float("bloom_radius"),
                params.float("bloom_intensity"),
            ))
            .then(SharpenLuminance::new(params.float("sharpen")))
            .then(Vignette::new(
                params.float("vignette_intensity"),
                params.float("vignette_radius"),
            ))
    }
}
