//! Application configuration.
//!
//! Loaded from a sparse TOML file; every key is optional and unknown keys are
//! rejected:
//!
//! ```toml
//! preferences_path = "/home/me/.config/retrobooth/preferences.json"
//!
//! [import]
//! target_width = 2048
//! max_selection = 10
//!
//! [render]
//! default_recipe = "caramel_fade"
//! seed = 7                  # omit for fresh grain each render
//!
//! [review]
//! threshold = 40
//! min_days_between_prompts = 30
//!
//! [logging]
//! level = "info"
//! ```

use crate::core::error::{RetroboothError, RetroboothResult};
use crate::import::{DEFAULT_TARGET_WIDTH, MAX_SELECTION};
use crate::recipes::RecipeRegistry;
use crate::render::RenderOptions;
use crate::review::ReviewThrottle;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Where the review counter is stored.
    pub preferences_path: PathBuf,
    /// Import settings.
    pub import: ImportConfig,
    /// Render settings.
    pub render: RenderConfig,
    /// Review prompt throttle.
    pub review: ReviewThrottle,
    /// Logging settings.
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            preferences_path: default_preferences_path(),
            import: ImportConfig::default(),
            render: RenderConfig::default(),
            review: ReviewThrottle::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Import settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImportConfig {
    /// Working width photos are downscaled to.
    pub target_width: u32,
    /// Most photos accepted per import.
    pub max_selection: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            target_width: DEFAULT_TARGET_WIDTH,
            max_selection: MAX_SELECTION,
        }
    }
}

/// Render settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Recipe applied to freshly imported photos.
    pub default_recipe: String,
    /// Fixed grain seed.
    pub seed: Option<u64>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            default_recipe: "caramel_fade".to_string(),
            seed: None,
        }
    }
}

impl RenderConfig {
    /// Engine options for these settings.
    pub fn options(&self) -> RenderOptions {
        RenderOptions { seed: self.seed }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

fn default_preferences_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("retrobooth")
        .join("preferences.json")
}

impl AppConfig {
    /// Load from a TOML file. A missing file yields defaults.
    pub fn load(path: &Path) -> RetroboothResult<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Parse TOML text.
    pub fn from_toml_str(text: &str) -> RetroboothResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Check values against what the crate can honour.
    pub fn validate(&self, registry: &RecipeRegistry) -> RetroboothResult<()> {
        if self.import.target_width == 0 {
            return Err(RetroboothError::Config(
                "import.target_width must be non-zero".into(),
            ));
        }
        if self.import.max_selection == 0 {
            return Err(RetroboothError::Config(
                "import.max_selection must be non-zero".into(),
            ));
        }
        if !registry.contains(&self.render.default_recipe) {
            return Err(RetroboothError::Config(format!(
                "render.default_recipe '{}' is not a known recipe",
                self.render.default_recipe
            )));
        }
        if self.review.min_days_between_prompts < 0 {
            return Err(RetroboothError::Config(
                "review.min_days_between_prompts must not be negative".into(),
            ));
        }
        Ok(())
    }
}
