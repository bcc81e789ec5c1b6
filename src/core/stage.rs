//! The Stage trait and its per-run context.
//!
//! A stage is one image transform in a recipe's pipeline. Stages take the
//! previous frame by reference and return a new frame of the same extent;
//! the render engine checks that contract and discards any output that
//! breaks it.

use crate::core::error::StageError;
use crate::core::types::Extent;
use image::RgbaImage;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// How pixels outside the frame are synthesised when a stage pads its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EdgeMode {
    /// Repeat the nearest edge pixel outward.
    #[default]
    Clamp,
    /// Fill with transparent black.
    Transparent,
}

/// Information shared with every stage of a single render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageContext {
    /// Extent of the source image the pipeline started from.
    pub source_extent: Extent,
    /// Seed for procedural stages. `None` means entropy.
    pub seed: Option<u64>,
    /// Position of the current stage in its pipeline.
    pub stage_index: usize,
}

impl StageContext {
    /// Create a context for the first stage.
    pub fn new(source_extent: Extent, seed: Option<u64>) -> Self {
        Self {
            source_extent,
            seed,
            stage_index: 0,
        }
    }

    /// The same context positioned at another stage.
    pub fn at_stage(self, stage_index: usize) -> Self {
        Self {
            stage_index,
            ..self
        }
    }

    /// A random generator for this stage.
    ///
    /// Seeded runs mix the stage index in, so two grain stages in one
    /// pipeline do not produce identical noise.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(
                seed ^ (self.stage_index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15),
            ),
            None => StdRng::from_entropy(),
        }
    }
}

/// One image transform in a pipeline.
///
/// # Contract
///
/// - `apply` must return a frame with the same dimensions as `input`.
/// - Stages must not panic on any non-empty input.
/// - Neutral parameters should return the input unchanged.
///
/// # Example
///
/// ```ignore
/// struct Invert;
///
/// impl Stage for Invert {
///     fn name(&self) -> &'static str {
///         "invert"
///     }
///
///     fn apply(&self, input: &RgbaImage, _ctx: &StageContext) -> StageResult<RgbaImage> {
///         let mut output = input.clone();
///         for pixel in output.pixels_mut() {
///             for c in 0..3 {
///                 pixel[c] = 255 - pixel[c];
///             }
///         }
///         Ok(output)
///     }
/// }
/// ```
pub trait Stage: Send + Sync + std::fmt::Debug {
    /// Short identifier used in logs and render reports.
    fn name(&self) -> &'static str;

    /// Whether identical inputs always give identical outputs.
    fn is_deterministic(&self) -> bool {
        true
    }

    /// Transform one frame.
    fn apply(&self, input: &RgbaImage, ctx: &StageContext) -> Result<RgbaImage, StageError>;
}

/// Reject empty frames up front. Every stage calls this first.
pub fn ensure_non_empty(stage: &'static str, input: &RgbaImage) -> Result<(), StageError> {
    if input.width() == 0 || input.height() == 0 {
        return Err(StageError::EmptyInput { stage });
    }
    Ok(())
}
