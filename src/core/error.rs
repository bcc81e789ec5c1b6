//! Error types for Retrobooth.
//!
//! Uses thiserror for structured errors with context. Errors are designed to:
//! - Be serializable where they describe user input (parameters, recipes)
//! - Include actionable information (which stage, which parameter)
//! - Stay recoverable: nothing here is allowed to escape the render boundary

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error type for Retrobooth.
///
/// This enum encompasses all error categories and enables automatic
/// conversion between specific error types.
#[derive(Error, Debug)]
pub enum RetroboothError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Stage error: {0}")]
    Stage(#[from] StageError),

    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Errors raised while checking recipe parameters.
///
/// Validation happens before a pipeline is built, so a bad override never
/// reaches the stages.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValidationError {
    #[error("Recipe '{0}' is not registered")]
    UnknownRecipe(String),

    #[error("Recipe '{recipe}' has no parameter named '{parameter}'")]
    UnknownParameter { recipe: String, parameter: String },

    #[error("Parameter '{parameter}': {error}")]
    ConstraintViolation { parameter: String, error: String },

    #[error("Parameter '{parameter}' expects {expected}, got {got}")]
    TypeMismatch {
        parameter: String,
        expected: String,
        got: String,
    },

    #[error("Invalid parameter assignment '{0}', expected name=value")]
    MalformedAssignment(String),
}

/// Failure inside a single pipeline stage.
///
/// The render engine never propagates these; it logs them and falls back to
/// the previous stage's output.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StageError {
    #[error("Stage '{stage}' received an empty frame")]
    EmptyInput { stage: &'static str },

    #[error("Stage '{stage}' produced {got_width}x{got_height}, expected {width}x{height}")]
    ExtentMismatch {
        stage: &'static str,
        width: u32,
        height: u32,
        got_width: u32,
        got_height: u32,
    },

    #[error("Stage '{stage}' failed: {reason}")]
    Failed { stage: &'static str, reason: String },
}

/// Errors while turning picked photos into source images.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Failed to read {label}: {source}")]
    Read {
        label: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode {label}: {source}")]
    Decode {
        label: String,
        #[source]
        source: image::ImageError,
    },

    #[error("{label} decoded to an empty image")]
    EmptyImage { label: String },

    #[error("Import was superseded by a newer batch")]
    Superseded,
}

/// Errors while handing a final bitmap off to disk.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Nothing to export: no rendered image")]
    NothingRendered,

    #[error("Unsupported export format '{0}'")]
    UnsupportedFormat(String),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// Error Utilities
// ============================================================================

impl ValidationError {
    /// Get suggestion for fixing this error.
    pub fn suggested_fix(&self) -> Option<String> {
        match self {
            ValidationError::UnknownRecipe(_) => {
                Some("Run `retrobooth list` to see available recipes".to_string())
            }
            ValidationError::UnknownParameter { recipe, .. } => Some(format!(
                "Run `retrobooth info {}` to see its parameters",
                recipe
            )),
            ValidationError::ConstraintViolation { parameter, error } => {
                Some(format!("Adjust '{}': {}", parameter, error))
            }
            ValidationError::MalformedAssignment(_) => {
                Some("Write parameters as name=value, e.g. vignette_intensity=0.5".to_string())
            }
            _ => None,
        }
    }
}

impl StageError {
    /// Name of the stage that failed.
    pub fn stage(&self) -> &'static str {
        match self {
            StageError::EmptyInput { stage }
            | StageError::ExtentMismatch { stage, .. }
            | StageError::Failed { stage, .. } => stage,
        }
    }
}

impl ImportError {
    /// Check if the rest of the batch can continue after this error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ImportError::Superseded)
    }

    /// Short user-facing notice for a transient toast.
    pub fn notice(&self) -> String {
        match self {
            ImportError::Superseded => "Import cancelled.".to_string(),
            _ => "Failed to load an image.".to_string(),
        }
    }
}

/// Result type alias for Retrobooth operations.
pub type RetroboothResult<T> = Result<T, RetroboothError>;

/// Result type alias for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Result type alias for stage operations.
pub type StageResult<T> = Result<T, StageError>;

/// Result type alias for import operations.
pub type ImportResult<T> = Result<T, ImportError>;
