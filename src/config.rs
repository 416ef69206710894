//! Engine configuration
//!
//! Every field has a default, so an empty TOML document is a valid config.
//!
//! ```toml
//! [baseline]
//! window = 30
//! trend_sensitivity = 0.5
//!
//! [selection]
//! low_mood_threshold = 2
//!
//! [lexicon]
//! extra_high_terms = ["give up forever"]
//! extra_watch_terms = []
//!
//! [history]
//! max_entries = 365
//! ```

use crate::baseline::{BaselineTracker, Window, DEFAULT_TREND_SENSITIVITY};
use crate::crisis::{CrisisLexicon, CrisisScanner};
use crate::error::EngineError;
use crate::intervention::{InterventionSelector, DEFAULT_LOW_MOOD_THRESHOLD};
use crate::types::MoodScore;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default bound on the history kept by a processor
pub const DEFAULT_MAX_HISTORY_ENTRIES: usize = 365;

/// Top-level engine configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub baseline: BaselineConfig,

    #[serde(default)]
    pub selection: SelectionConfig,

    #[serde(default)]
    pub lexicon: LexiconConfig,

    #[serde(default)]
    pub history: HistoryConfig,
}

/// Baseline window and trend settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineConfig {
    /// Newest entries to include; absent means the whole history
    #[serde(default)]
    pub window: Option<usize>,

    #[serde(default = "default_trend_sensitivity")]
    pub trend_sensitivity: f64,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            window: None,
            trend_sensitivity: default_trend_sensitivity(),
        }
    }
}

/// Intervention selection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionConfig {
    #[serde(default = "default_low_mood_threshold")]
    pub low_mood_threshold: u8,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            low_mood_threshold: default_low_mood_threshold(),
        }
    }
}

/// Extra crisis terms appended to the built-in lexicon
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LexiconConfig {
    #[serde(default)]
    pub extra_high_terms: Vec<String>,

    #[serde(default)]
    pub extra_watch_terms: Vec<String>,
}

/// In-memory history bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
        }
    }
}

fn default_trend_sensitivity() -> f64 {
    DEFAULT_TREND_SENSITIVITY
}

fn default_low_mood_threshold() -> u8 {
    DEFAULT_LOW_MOOD_THRESHOLD
}

fn default_max_entries() -> usize {
    DEFAULT_MAX_HISTORY_ENTRIES
}

impl EngineConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self, EngineError> {
        let config: Self =
            toml::from_str(contents).map_err(|e| EngineError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path).map_err(|e| {
            EngineError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&contents)?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Serialize to TOML
    pub fn to_toml_string(&self) -> Result<String, EngineError> {
        toml::to_string_pretty(self).map_err(|e| EngineError::EncodingError(e.to_string()))
    }

    /// Reject values the engine cannot honor
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.baseline.window == Some(0) {
            return Err(EngineError::ConfigError(
                "baseline.window must be at least 1".to_string(),
            ));
        }
        if !self.baseline.trend_sensitivity.is_finite() || self.baseline.trend_sensitivity < 0.0 {
            return Err(EngineError::ConfigError(format!(
                "baseline.trend_sensitivity must be a non-negative number, got {}",
                self.baseline.trend_sensitivity
            )));
        }
        MoodScore::new(self.selection.low_mood_threshold as i64).map_err(|_| {
            EngineError::ConfigError(format!(
                "selection.low_mood_threshold must be between 1 and 5, got {}",
                self.selection.low_mood_threshold
            ))
        })?;
        if self.history.max_entries == 0 {
            return Err(EngineError::ConfigError(
                "history.max_entries must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn window(&self) -> Result<Window, EngineError> {
        Window::from_size(self.baseline.window)
    }

    pub fn baseline_tracker(&self) -> Result<BaselineTracker, EngineError> {
        Ok(BaselineTracker::new(self.window()?)
            .with_trend_sensitivity(self.baseline.trend_sensitivity))
    }

    pub fn crisis_scanner(&self) -> CrisisScanner {
        let lexicon = CrisisLexicon::default().with_additional(
            &self.lexicon.extra_high_terms,
            &self.lexicon.extra_watch_terms,
        );
        CrisisScanner::new(lexicon)
    }

    pub fn intervention_selector(&self) -> Result<InterventionSelector, EngineError> {
        let threshold = MoodScore::new(self.selection.low_mood_threshold as i64)
            .map_err(|e| EngineError::ConfigError(e.to_string()))?;
        Ok(InterventionSelector::new(threshold))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Severity;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.baseline.window, None);
        assert_eq!(config.baseline.trend_sensitivity, 0.5);
        assert_eq!(config.selection.low_mood_threshold, 2);
        assert_eq!(config.history.max_entries, 365);
    }

    #[test]
    fn test_partial_document() {
        let config = EngineConfig::from_toml_str(
            r#"
            [baseline]
            window = 14

            [lexicon]
            extra_watch_terms = ["not sleeping"]
            "#,
        )
        .unwrap();

        assert_eq!(config.baseline.window, Some(14));
        assert_eq!(config.baseline.trend_sensitivity, 0.5);
        assert_eq!(config.window().unwrap(), Window::last(14).unwrap());
        assert_eq!(
            config.crisis_scanner().scan("I keep not sleeping").severity,
            Severity::Watch
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        for doc in [
            "[baseline]\nwindow = 0",
            "[baseline]\ntrend_sensitivity = -1.0",
            "[selection]\nlow_mood_threshold = 9",
            "[history]\nmax_entries = 0",
        ] {
            let result = EngineConfig::from_toml_str(doc);
            assert!(
                matches!(result, Err(EngineError::ConfigError(_))),
                "accepted: {}",
                doc
            );
        }
    }

    #[test]
    fn test_malformed_toml() {
        let result = EngineConfig::from_toml_str("[baseline\nwindow = ");
        assert!(matches!(result, Err(EngineError::ConfigError(_))));
    }

    #[test]
    fn test_round_trip_toml() {
        let mut config = EngineConfig::default();
        config.baseline.window = Some(30);
        config.selection.low_mood_threshold = 3;

        let text = config.to_toml_string().unwrap();
        let loaded = EngineConfig::from_toml_str(&text).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_builds_components() {
        let mut config = EngineConfig::default();
        config.selection.low_mood_threshold = 3;
        config.baseline.trend_sensitivity = 1.0;

        assert_eq!(config.intervention_selector().unwrap().low_mood_threshold(), 3);
        assert_eq!(config.baseline_tracker().unwrap().trend_sensitivity(), 1.0);
    }
}
