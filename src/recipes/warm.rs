//! Warm, faded film looks.

use super::{radius_parameter, vignette_parameters};
use crate::core::param::{ParameterDefinition, ResolvedParameters, UiHint};
use crate::core::recipe::{Category, Pipeline, Recipe, RecipeMetadata};
use crate::stages::{
    BlendMode, ForceOpaque, GaussianBlur, Grain, SepiaTone, TemperatureTint, Vignette,
};

/// A touch of sepia, a whisper of blur and a soft vignette.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaramelFade;

impl Recipe for CaramelFade {
    fn metadata(&self) -> RecipeMetadata {
        let [vignette_intensity, vignette_radius] = vignette_parameters(0.45, 1.8);
        RecipeMetadata::builder("caramel_fade", "Caramel Fade")
            .description("Cozy, cinematic blend: a little sepia, a very light blur and a soft vignette")
            .category(Category::Warm)
            .parameter(
                ParameterDefinition::float("sepia_intensity", 0.55)
                    .with_description("Sepia mix")
                    .with_range(0.0, 1.0),
            )
            .parameter(radius_parameter("blur_radius", 0.8, 10.0).with_description("Softening blur"))
            .parameter(vignette_intensity)
            .parameter(vignette_radius)
            .tags(["sepia", "vintage", "soft"])
            .build()
    }

    fn pipeline(&self, params: &ResolvedParameters) -> Pipeline {
        Pipeline::new()
            .then(SepiaTone::new(params.float("sepia_intensity")))
            .then(GaussianBlur::new(params.float("blur_radius")))
            .then(Vignette::new(
                params.float("vignette_intensity"),
                params.float("vignette_radius"),
            ))
    }
}

/// Lighter sepia, a temperature shift, soft grain and a deeper vignette.
///
/// Finishes fully opaque so thumbnails never show a residual fringe.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatinaGrain;

impl Recipe for PatinaGrain {
    fn metadata(&self) -> RecipeMetadata {
        let [vignette_intensity, vignette_radius] = vignette_parameters(0.85, 2.3);
        RecipeMetadata::builder("patina_grain", "Patina Grain")
            .description("Vintage vibe: light sepia, a white balance shift, soft-light grain and a deep vignette")
            .category(Category::Warm)
            .parameter(
                ParameterDefinition::float("sepia_intensity", 0.35)
                    .with_description("Sepia mix")
                    .with_range(0.0, 1.0),
            )
            .parameter(
                ParameterDefinition::float("target_temperature", 5200.0)
                    .with_description("White balance target in Kelvin, against a 6500 K neutral")
                    .with_range(1000.0, 40000.0)
                    .with_ui_hint(UiHint::Temperature),
            )
            .parameter(
                ParameterDefinition::float("noise_amount", 0.12)
                    .with_description("Grain opacity")
                    .with_range(0.0, 1.0)
                    .with_group("Grain"),
            )
            .parameter(
                radius_parameter("noise_softness", 0.6, 10.0)
                    .with_description("Blur applied to the grain")
                    .with_group("Grain"),
            )
            .parameter(vignette_intensity)
            .parameter(vignette_radius)
            .tags(["sepia", "grain", "film", "vintage"])
            .non_deterministic()
            .build()
    }

    fn pipeline(&self, params: &ResolvedParameters) -> Pipeline {
        Pipeline::new()
            .then(SepiaTone::new(params.float("sepia_intensity")))
            .then(TemperatureTint::new(params.float("target_temperature")))
            .then(Grain::new(
                params.float("noise_amount"),
                params.float("noise_softness"),
                BlendMode::SoftLight,
            ))
            .then(Vignette::new(
                params.float("vignette_intensity"),
                params.float("vignette_radius"),
            ))
            .then(ForceOpaque)
    }
}
