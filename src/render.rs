//! Render engine.
//!
//! The engine runs a recipe's pipeline over one source image and hands back a
//! bitmap. It never fails past its own boundary: an absent source or invalid
//! parameters yield `None`, and a failing stage is skipped with the previous
//! frame carried forward.

use crate::core::error::StageError;
use crate::core::param::ParameterSet;
use crate::core::recipe::Recipe;
use crate::core::stage::StageContext;
use crate::core::types::{Extent, SourceImage};
use image::RgbaImage;
use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Render options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Seed for procedural stages. `None` draws fresh entropy each render.
    pub seed: Option<u64>,
}

impl RenderOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the noise seed so grain is reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// A stage that was skipped during a render.
#[derive(Debug, Clone, PartialEq)]
pub struct StageFallback {
    /// Position of the stage in the pipeline.
    pub index: usize,
    /// Stage name.
    pub stage: &'static str,
    /// Why its output was discarded.
    pub reason: String,
}

/// What happened during one render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderReport {
    /// Recipe that was rendered.
    pub recipe_id: String,
    /// Stages whose output was kept.
    pub stages_applied: usize,
    /// Stages that were skipped.
    pub fallbacks: Vec<StageFallback>,
    /// Wall time of the render.
    pub duration: Duration,
}

impl RenderReport {
    /// Whether every stage ran cleanly.
    pub fn is_clean(&self) -> bool {
        self.fallbacks.is_empty()
    }
}

/// A rendered bitmap together with its report.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    /// Final frame, same extent as the source.
    pub bitmap: RgbaImage,
    /// Render details.
    pub report: RenderReport,
}

/// Render statistics accumulated over the engine's lifetime.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderStats {
    /// Number of completed renders.
    pub renders: usize,
    /// Number of stages that fell back.
    pub stage_failures: usize,
    /// Total time spent rendering.
    pub total_duration: Duration,
}

/// The render engine.
///
/// Shared between the interactive thread and background units via `Arc`.
#[derive(Debug, Default)]
pub struct RenderEngine {
    options: RenderOptions,
    stats: Mutex<RenderStats>,
}

impl RenderEngine {
    /// Create a new engine with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with the given options.
    pub fn with_options(options: RenderOptions) -> Self {
        Self {
            options,
            stats: Mutex::new(RenderStats::default()),
        }
    }

    /// Current options.
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Render `recipe` over `source`. `None` when there is nothing to render.
    pub fn render(
        &self,
        source: Option<&SourceImage>,
        recipe: &dyn Recipe,
        overrides: &ParameterSet,
    ) -> Option<RgbaImage> {
        self.render_with_report(source, recipe, overrides)
            .map(|output| output.bitmap)
    }

    /// Render and report which stages ran.
    pub fn render_with_report(
        &self,
        source: Option<&SourceImage>,
        recipe: &dyn Recipe,
        overrides: &ParameterSet,
    ) -> Option<RenderOutput> {
        let source = source?;
        let metadata = recipe.metadata();

        let params = match metadata.resolve(overrides) {
            Ok(params) => params,
            Err(error) => {
                log::warn!("Not rendering '{}': {}", metadata.id, error);
                return None;
            }
        };

        let start = Instant::now();
        let pipeline = recipe.pipeline(&params);
        let extent = source.extent();
        let ctx = StageContext::new(extent, self.options.seed);

        let mut frame = source.pixels().clone();
        let mut stages_applied = 0;
        let mut fallbacks = Vec::new();

        for (index, stage) in pipeline.stages().enumerate() {
            let stage_start = Instant::now();
            let result = stage
                .apply(&frame, &ctx.at_stage(index))
                .and_then(|output| check_extent(stage.name(), extent, output));

            match result {
                Ok(output) => {
                    log::debug!(
                        "{}[{}] {} took {:?}",
                        metadata.id,
                        index,
                        stage.name(),
                        stage_start.elapsed()
                    );
                    frame = output;
                    stages_applied += 1;
                }
                Err(error) => {
                    log::warn!(
                        "{}[{}] falling back past '{}': {}",
                        metadata.id,
                        index,
                        stage.name(),
                        error
                    );
                    fallbacks.push(StageFallback {
                        index,
                        stage: stage.name(),
                        reason: error.to_string(),
                    });
                }
            }
        }

        let duration = start.elapsed();
        {
            let mut stats = self.stats.lock();
            stats.renders += 1;
            stats.stage_failures += fallbacks.len();
            stats.total_duration += duration;
        }
        log::info!(
            "Rendered '{}' at {} in {:?}",
            metadata.id,
            extent,
            duration
        );

        Some(RenderOutput {
            bitmap: frame,
            report: RenderReport {
                recipe_id: metadata.id,
                stages_applied,
                fallbacks,
                duration,
            },
        })
    }

    /// Snapshot of accumulated statistics.
    pub fn stats(&self) -> RenderStats {
        self.stats.lock().clone()
    }

    /// Reset accumulated statistics.
    pub fn reset_stats(&self) {
        *self.stats.lock() = RenderStats::default();
    }
}

fn check_extent(stage: &'static str, extent: Extent, output: RgbaImage) -> Result<RgbaImage, StageError> {
    if output.dimensions() != extent.dimensions() {
        return Err(StageError::ExtentMismatch {
            stage,
            width: extent.width,
            height: extent.height,
            got_width: output.width(),
            got_height: output.height(),
        });
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::param::ParameterDefinition;
    use crate::core::recipe::{Pipeline, RecipeMetadata};
    use crate::core::param::ResolvedParameters;
    use crate::core::stage::Stage;
    use crate::core::types::Value;
    use crate::recipes::RecipeRegistry;
    use crate::stages::{Exposure, SepiaTone};
    use image::Rgba;

    #[derive(Debug)]
    struct Broken;

    impl Stage for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn apply(&self, _input: &RgbaImage, _ctx: &StageContext) -> Result<RgbaImage, StageError> {
            Err(StageError::Failed {
                stage: "broken",
                reason: "always fails".to_string(),
            })
        }
    }

    #[derive(Debug)]
    struct Shrink;

    impl Stage for Shrink {
        fn name(&self) -> &'static str {
            "shrink"
        }

        fn apply(&self, input: &RgbaImage, _ctx: &StageContext) -> Result<RgbaImage, StageError> {
            Ok(RgbaImage::new(input.width() / 2 + 1, input.height()))
        }
    }

    struct Flaky;

    impl Recipe for Flaky {
        fn metadata(&self) -> RecipeMetadata {
            RecipeMetadata::builder("flaky", "Flaky")
                .parameter(ParameterDefinition::float("ev", 1.0).with_range(-2.0, 2.0))
                .build()
        }

        fn pipeline(&self, params: &ResolvedParameters) -> Pipeline {
            Pipeline::new()
                .then(Exposure::new(params.float("ev")))
                .then(Broken)
                .then(Shrink)
                .then(SepiaTone::new(0.0))
        }
    }

    fn source() -> SourceImage {
        SourceImage::solid(4, 3, [40, 50, 60, 255]).unwrap()
    }

    #[test]
    fn test_absent_source_is_noop() {
        let engine = RenderEngine::new();
        let registry = RecipeRegistry::with_builtins();
        let recipe = registry.get("caramel_fade").unwrap();
        assert!(engine.render(None, recipe.as_ref(), &ParameterSet::new()).is_none());
        assert_eq!(engine.stats().renders, 0);
    }

    #[test]
    fn test_failing_stages_fall_back() {
        let engine = RenderEngine::new();
        let output = engine
            .render_with_report(Some(&source()), &Flaky, &ParameterSet::new())
            .unwrap();

        // Exposure ran; the broken and shrinking stages were skipped.
        assert_eq!(output.bitmap.dimensions(), (4, 3));
        assert_eq!(output.bitmap.get_pixel(0, 0).0, [80, 100, 120, 255]);
        assert_eq!(output.report.stages_applied, 2);
        let skipped: Vec<_> = output.report.fallbacks.iter().map(|f| (f.index, f.stage)).collect();
        assert_eq!(skipped, vec![(1, "broken"), (2, "shrink")]);
        assert!(!output.report.is_clean());

        let stats = engine.stats();
        assert_eq!(stats.renders, 1);
        assert_eq!(stats.stage_failures, 2);
    }

    #[test]
    fn test_invalid_parameters_render_nothing() {
        let engine = RenderEngine::new();
        let overrides = ParameterSet::new().with("ev", Value::Float(9.0));
        assert!(engine.render(Some(&source()), &Flaky, &overrides).is_none());
    }

    #[test]
    fn test_non_finite_override_renders_nothing() {
        let engine = RenderEngine::new();
        let registry = RecipeRegistry::with_builtins();
        let recipe = registry.get("caramel_fade").unwrap();
        let overrides = ParameterSet::new().with("blur_radius", Value::Float(f64::NAN));
        assert!(engine.render(Some(&source()), recipe.as_ref(), &overrides).is_none());
        assert_eq!(engine.stats().renders, 0);
    }

    #[test]
    fn test_deterministic_recipe_is_repeatable() {
        let engine = RenderEngine::new();
        let registry = RecipeRegistry::with_builtins();
        let pixels = RgbaImage::from_fn(20, 14, |x, y| Rgba([(x * 12) as u8, (y * 17) as u8, 90, 255]));
        let source = SourceImage::from_rgba(pixels).unwrap();

        for (id, entry) in registry.iter().filter(|(_, e)| e.metadata.deterministic) {
            let a = engine.render(Some(&source), entry.recipe.as_ref(), &ParameterSet::new());
            let b = engine.render(Some(&source), entry.recipe.as_ref(), &ParameterSet::new());
            assert_eq!(a, b, "{}", id);
        }
    }

    #[test]
    fn test_seeded_engine_repeats_grain() {
        let engine = RenderEngine::with_options(RenderOptions::new().with_seed(11));
        let registry = RecipeRegistry::with_builtins();
        let recipe = registry.get("silver_grit").unwrap();
        let source = source();
        let a = engine.render(Some(&source), recipe.as_ref(), &ParameterSet::new());
        let b = engine.render(Some(&source), recipe.as_ref(), &ParameterSet::new());
        assert!(a.is_some());
        assert_eq!(a, b);
    }

    #[test]
    fn test_every_recipe_on_one_pixel() {
        let engine = RenderEngine::new();
        let registry = RecipeRegistry::with_builtins();
        let source = SourceImage::solid(1, 1, [200, 120, 60, 255]).unwrap();
        for (id, entry) in registry.iter() {
            let output = engine
                .render_with_report(Some(&source), entry.recipe.as_ref(), &ParameterSet::new())
                .unwrap();
            assert_eq!(output.bitmap.dimensions(), (1, 1), "{}", id);
            assert!(output.bitmap.get_pixel(0, 0)[3] > 0, "{}", id);
            assert!(output.report.is_clean(), "{}", id);
        }
    }
}
