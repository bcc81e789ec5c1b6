//! # Retrobooth - Retro Photo Filters
//!
//! Retrobooth applies preset looks ("recipes") to a small selection of
//! photos. Each recipe is an ordered pipeline of image stages (sepia,
//! temperature, hue, vibrance, bloom, pixelation, posterize, grain and
//! vignette) built from a handful of tunable parameters.
//!
//! ## Features
//!
//! - **Recipes**: six built-in looks, enumerable through a registry
//! - **Validated Parameters**: every parameter has a default and a range; overrides are checked before rendering
//! - **Forgiving Rendering**: a failing stage is skipped and the last good frame carried forward
//! - **Selection Flow**: import up to ten photos, switch recipes per photo, export the result
//! - **Background Work**: imports and re-renders run off the interactive thread
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use retrobooth::prelude::*;
//!
//! let registry = RecipeRegistry::with_builtins();
//! let engine = RenderEngine::new();
//!
//! let source = retrobooth::import::load_path("photo.jpg".as_ref(), 2048)?;
//! let recipe = registry.require("caramel_fade")?;
//!
//! let overrides = ParameterSet::new().with("vignette_intensity", Value::Float(0.6));
//! if let Some(bitmap) = engine.render(Some(&source), recipe.as_ref(), &overrides) {
//!     retrobooth::export::export(&bitmap, "out.png".as_ref(), ExportFormat::Png)?;
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: types, parameters, the `Stage` and `Recipe` traits, errors
//! - [`stages`]: built-in image stages
//! - [`recipes`]: built-in recipes and the registry
//! - [`render`]: the render engine
//! - [`import`]: decoding, orientation and downscaling
//! - [`session`]: selection/application state
//! - [`worker`]: background import and render units
//! - [`review`]: persisted review-prompt throttle
//! - [`export`]: writing final bitmaps
//! - [`config`]: TOML configuration
//!
//! ## Custom Recipes
//!
//! Implement [`Recipe`](core::Recipe) and register it:
//!
//! ```rust,ignore
//! use retrobooth::prelude::*;
//!
//! struct Faded;
//!
//! impl Recipe for Faded {
//!     fn metadata(&self) -> RecipeMetadata {
//!         RecipeMetadata::builder("faded", "Faded")
//!             .description("A washed-out print")
//!             .parameter(ParameterDefinition::float("contrast", 0.8).with_range(0.5, 1.5))
//!             .build()
//!     }
//!
//!     fn pipeline(&self, params: &ResolvedParameters) -> Pipeline {
//!         Pipeline::new()
//!             .then(ColorControls::new(0.9, 0.05, params.float("contrast")))
//!             .then(Vignette::new(0.3, 2.0))
//!     }
//! }
//!
//! let mut registry = RecipeRegistry::with_builtins();
//! registry.register(Faded);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod core;
pub mod export;
pub mod import;
pub mod recipes;
pub mod render;
pub mod review;
pub mod session;
pub mod stages;
pub mod worker;

/// Prelude module for convenient imports.
///
/// Import everything commonly needed with:
/// ```rust,ignore
/// use retrobooth::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use crate::core::types::{Extent, ImageMetadata, Orientation, SourceImage, Value};

    // Parameters
    pub use crate::core::param::{
        Constraint, ParameterDefinition, ParameterSet, ResolvedParameters, UiHint,
    };

    // Stages and recipes
    pub use crate::core::recipe::{Category, Pipeline, Recipe, RecipeMetadata};
    pub use crate::core::stage::{EdgeMode, Stage, StageContext};

    // Errors
    pub use crate::core::error::{
        ExportError, ImportError, RetroboothError, RetroboothResult, StageError, ValidationError,
    };

    // Built-in stages
    pub use crate::stages::{
        BlendMode, Bloom, ColorControls, Exposure, ForceOpaque, GaussianBlur, Grain, HueAdjust,
        Pixellate, Posterize, SepiaTone, SharpenLuminance, TemperatureTint, Vibrance, Vignette,
        WhitePoint,
    };

    // Recipes
    pub use crate::recipes::{
        ArcticMist, CaramelFade, PatinaGrain, PolarRadiance, RecipeRegistry, RegistryEntry,
        RetroPixel, SilverGrit,
    };

    // Rendering
    pub use crate::render::{RenderEngine, RenderOptions, RenderOutput, RenderReport, RenderStats};

    // Flow
    pub use crate::config::AppConfig;
    pub use crate::export::ExportFormat;
    pub use crate::import::{ImportBatch, ImportSource};
    pub use crate::review::{Preferences, ReviewDecision, ReviewThrottle};
    pub use crate::session::{PhotoItem, Session, SessionEvent, SessionState};
    pub use crate::worker::{Controller, ControllerSettings};
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
        assert_eq!(super::NAME, "retrobooth");
    }

    #[test]
    fn test_custom_recipe_end_to_end() {
        #[derive(Debug)]
        struct Faded;

        impl Recipe for Faded {
            fn metadata(&self) -> RecipeMetadata {
                RecipeMetadata::builder("faded", "Faded")
                    .parameter(ParameterDefinition::float("contrast", 0.8).with_range(0.5, 1.5))
                    .build()
            }

            fn pipeline(&self, params: &ResolvedParameters) -> Pipeline {
                Pipeline::new()
                    .then(ColorControls::new(1.0, 0.0, params.float("contrast")))
                    .then(Vignette::new(0.3, 2.0))
            }
        }

        let mut registry = RecipeRegistry::with_builtins();
        registry.register(Faded);
        assert_eq!(registry.len(), 7);

        let recipe = registry.require("faded").unwrap();
        let source = SourceImage::solid(9, 7, [180, 90, 40, 255]).unwrap();
        let output = RenderEngine::new()
            .render_with_report(Some(&source), recipe.as_ref(), &ParameterSet::new())
            .unwrap();
        assert_eq!(output.bitmap.dimensions(), (9, 7));
        assert!(output.report.is_clean());
        assert_eq!(output.report.stages_applied, 2);
    }
}
