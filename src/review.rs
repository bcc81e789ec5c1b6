//! Review-prompt throttle.
//!
//! The only state Retrobooth persists: how many times a filter was chosen and
//! when the user was last asked for a review.

use crate::core::error::RetroboothResult;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Persisted preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Number of times a filter was chosen.
    pub chosen_filter_count: u64,
    /// When the review prompt was last shown.
    pub last_review_prompt: Option<DateTime<Utc>>,
}

impl Preferences {
    /// Load from a JSON file. A missing file yields defaults.
    pub fn load(path: &Path) -> RetroboothResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Save as JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> RetroboothResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Whether to show the review prompt now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    /// Ask for a review.
    Prompt,
    /// Stay quiet.
    Skip,
}

/// Rules for when a review may be requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewThrottle {
    /// Filter choices needed before the first prompt.
    pub threshold: u64,
    /// Minimum gap between prompts.
    pub min_days_between_prompts: i64,
}

impl Default for ReviewThrottle {
    fn default() -> Self {
        Self {
            threshold: 40,
            min_days_between_prompts: 30,
        }
    }
}

impl ReviewThrottle {
    /// Count one filter choice and decide whether to prompt.
    pub fn record_choice(&self, prefs: &mut Preferences, now: DateTime<Utc>) -> ReviewDecision {
        prefs.chosen_filter_count = prefs.chosen_filter_count.saturating_add(1);
        if prefs.chosen_filter_count < self.threshold {
            return ReviewDecision::Skip;
        }

        let due = match prefs.last_review_prompt {
            None => true,
            // An interval too large for a duration never elapses.
            Some(last) => Duration::try_days(self.min_days_between_prompts)
                .is_some_and(|interval| now - last > interval),
        };
        if !due {
            return ReviewDecision::Skip;
        }

        prefs.last_review_prompt = Some(now);
        log::info!(
            "Requesting review after {} filter choices",
            prefs.chosen_filter_count
        );
        ReviewDecision::Prompt
    }
}
