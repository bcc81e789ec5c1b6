//! Built-in recipes.
//!
//! Each recipe declares its tunables with the defaults the looks were
//! designed around and assembles its stages from [`crate::stages`].

mod cool;
mod mono;
mod pixel;
pub mod registry;
mod warm;

use crate::core::param::{ParameterDefinition, UiHint};

pub use cool::{ArcticMist, PolarRadiance};
pub use mono::SilverGrit;
pub use pixel::RetroPixel;
pub use registry::{RecipeRegistry, RegistryEntry};
pub use warm::{CaramelFade, PatinaGrain};

/// Register all built-in recipes, in the order they are offered.
pub fn register_all(registry: &mut RecipeRegistry) {
    registry.register(CaramelFade);
    registry.register(ArcticMist);
    registry.register(PolarRadiance);
    registry.register(PatinaGrain);
    registry.register(SilverGrit);
    registry.register(RetroPixel);
}

/// The vignette pair every recipe finishes with.
pub(crate) fn vignette_parameters(intensity: f64, radius: f64) -> [ParameterDefinition; 2] {
    [
        ParameterDefinition::float("vignette_intensity", intensity)
            .with_description("Strength of the edge darkening")
            .with_range(0.0, 2.0)
            .with_group("Vignette"),
        ParameterDefinition::float("vignette_radius", radius)
            .with_description("Relative falloff; larger keeps more of the frame bright")
            .with_range(0.1, 5.0)
            .with_group("Vignette"),
    ]
}

/// Cool-shift amount shared by the cool looks.
pub(crate) fn cool_amount_parameter(default: f64) -> ParameterDefinition {
    ParameterDefinition::float("cool_amount", default)
        .with_description("How far temperature and hue shift toward teal")
        .with_range(0.0, 1.0)
}

/// Blur radius slider.
pub(crate) fn radius_parameter(name: &str, default: f64, max: f64) -> ParameterDefinition {
    ParameterDefinition::float(name, default)
        .with_range(0.0, max)
        .with_ui_hint(UiHint::Slider { logarithmic: true })
}
