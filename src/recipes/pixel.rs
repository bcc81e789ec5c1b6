//! Blocky, reduced-palette pixel-art looks.

use super::vignette_parameters;
use crate::core::param::{Constraint, ParameterDefinition, ResolvedParameters, UiHint};
use crate::core::recipe::{Category, Pipeline, Recipe, RecipeMetadata};
use crate::core::types::Value;
use crate::stages::{Pixellate, Posterize, Vignette};

/// Chunky pixels, a reduced palette and a hint of vignette.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetroPixel;

impl Recipe for RetroPixel {
    fn metadata(&self) -> RecipeMetadata {
        let [vignette_intensity, vignette_radius] = vignette_parameters(0.4, 1.5);
        RecipeMetadata::builder("retro_pixel", "Retro Pixel")
            .description("Playful pixel art: blocky pixels, posterized colours and a light vignette")
            .category(Category::Pixel)
            .parameter(
                ParameterDefinition::float("pixel_scale", 18.0)
                    .with_description("Block size in pixels")
                    .with_range(1.0, 200.0),
            )
            .parameter(
                ParameterDefinition::new("posterize_levels", Value::Integer(6))
                    .with_description("Fewer levels give chunkier colour")
                    .with_constraint(Constraint::Range { min: 2.0, max: 64.0 })
                    .with_ui_hint(UiHint::SpinBox),
            )
            .parameter(vignette_intensity)
            .parameter(vignette_radius)
            .tags(["pixel", "8-bit", "posterize", "retro"])
            .build()
    }

    fn pipeline(&self, params: &ResolvedParameters) -> Pipeline {
        let levels = params.integer("posterize_levels").clamp(2, 64) as u32;
        Pipeline::new()
            .then(Pixellate::new(params.float("pixel_scale")))
            .then(Posterize::new(levels))
            .then(Vignette::new(
                params.float("vignette_intensity"),
                params.float("vignette_radius"),
            ))
    }
}
