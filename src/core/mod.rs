//! Core types and traits for Retrobooth.
//!
//! This module contains the foundational pieces every look is built from:
//! - Value types (Extent, SourceImage, Value)
//! - Parameter definitions and constraints
//! - The Stage and Recipe traits
//! - Error types

pub mod types;
pub mod param;
pub mod error;
pub mod stage;
pub mod recipe;

// Re-export commonly used types
pub use types::{Extent, ImageMetadata, Orientation, SourceImage, Value};
pub use param::{Constraint, ParameterDefinition, ParameterSet, ResolvedParameters, UiHint};
pub use error::{ExportError, ImportError, RetroboothError, StageError, ValidationError};
pub use stage::{EdgeMode, Stage, StageContext};
pub use recipe::{Category, Pipeline, Recipe, RecipeMetadata};
