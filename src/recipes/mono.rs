//! Monochrome looks.

use super::{radius_parameter, vignette_parameters};
use crate::core::param::{ParameterDefinition, ResolvedParameters};
use crate::core::recipe::{Category, Pipeline, Recipe, RecipeMetadata};
use crate::stages::{BlendMode, ColorControls, Exposure, Grain, Vignette};

/// Gritty mono film: deep desaturation, mild contrast, heavy overlay grain
/// and a subtle vignette.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilverGrit;

impl Recipe for SilverGrit {
    fn metadata(&self) -> RecipeMetadata {
        let [vignette_intensity, vignette_radius] = vignette_parameters(0.6, 2.0);
        RecipeMetadata::builder("silver_grit", "Silver Grit")
            .description("Monochrome film with gritty overlay grain and a subtle vignette")
            .category(Category::Monochrome)
            .parameter(
                ParameterDefinition::float("desaturation", 1.0)
                    .with_description("1 removes all colour")
                    .with_range(0.0, 1.0),
            )
            .parameter(
                ParameterDefinition::float("contrast", 1.08)
                    .with_description("1 is neutral")
                    .with_range(0.5, 1.5),
            )
            .parameter(
                ParameterDefinition::float("exposure_ev", -0.05)
                    .with_description("Negative darkens slightly")
                    .with_range(-1.0, 1.0),
            )
            .parameter(
                ParameterDefinition::float("grain_amount", 0.28)
                    .with_description("Grain opacity")
                    .with_range(0.0, 1.0)
                    .with_group("Grain"),
            )
            .parameter(
                radius_parameter("grain_softness", 1.2, 10.0)
                    .with_description("Blur that makes the grain chunkier")
                    .with_group("Grain"),
            )
            .parameter(
                ParameterDefinition::float("grain_scale", 1.4)
                    .with_description("Below 1 is finer, above 1 coarser")
                    .with_range(0.25, 4.0)
                    .with_group("Grain"),
            )
            .parameter(vignette_intensity)
            .parameter(vignette_radius)
            .tags(["monochrome", "black and white", "grain", "film"])
            .non_deterministic()
            .build()
    }

    fn pipeline(&self, params: &ResolvedParameters) -> Pipeline {
        let saturation = (1.0 - params.float("desaturation").clamp(0.0, 1.0)).max(0.0);
        Pipeline::new()
            .then(ColorControls::new(saturation, 0.0, params.float("contrast")))
            .then(Exposure::new(params.float("exposure_ev")))
            .then(
                Grain::new(
                    params.float("grain_amount"),
                    params.float("grain_softness"),
                    BlendMode::Overlay,
                )
                .with_scale(params.float("grain_scale")),
            )
            .then(Vignette::new(
                params.float("vignette_intensity"),
                params.float("vignette_radius"),
            ))
    }
}
