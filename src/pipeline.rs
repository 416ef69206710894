//! Engine orchestration
//!
//! This module provides the public entry points used by application shells:
//! stateless JSON one-shots, and a stateful processor that owns a bounded mood
//! history and the recent-intervention list between calls.

use crate::baseline::{self, compute_baseline, BaselineTracker, Window, MIN_TREND_SAMPLES};
use crate::catalog::{default_catalog, validate_catalog};
use crate::config::EngineConfig;
use crate::crisis::{self, CrisisScanner};
use crate::error::EngineError;
use crate::intervention::{select_intervention, InterventionSelector};
use crate::resources::{escalation_resources, CrisisResource};
use crate::responder::{respond, SupportReply};
use crate::types::{
    BaselineStats, CrisisSignal, InterventionHistory, InterventionModule, MoodEntry, MoodScore,
    Severity,
};
use serde::{Deserialize, Serialize};

/// Outcome of recording a mood
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckIn {
    /// Id of the recorded entry
    pub entry_id: String,
    /// Baseline including the new entry
    pub baseline: BaselineStats,
    /// New score minus the baseline mean before the entry was added
    pub deviation: Option<f64>,
    /// Deviation in standard deviations of the prior baseline
    pub z_score: Option<f64>,
    /// Too few samples for a trend yet
    pub building_baseline: bool,
}

/// Outcome of one chat message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatTurn {
    pub signal: CrisisSignal,
    pub reply: SupportReply,
    /// Resources to display; empty when the signal is `none`
    pub resources: Vec<&'static CrisisResource>,
}

/// Arguments for a one-shot selection
#[derive(Debug, Clone, Deserialize)]
pub struct SelectionRequest {
    pub current_mood: MoodScore,
    /// Precomputed baseline; computed from `history` when absent
    #[serde(default)]
    pub baseline: Option<BaselineStats>,
    #[serde(default)]
    pub history: Vec<MoodEntry>,
    #[serde(default)]
    pub recent_ids: InterventionHistory,
    /// Custom catalog; the built-in one when absent
    #[serde(default)]
    pub catalog: Option<Vec<InterventionModule>>,
}

/// Parse a JSON array of mood entries
pub fn parse_history(json: &str) -> Result<Vec<MoodEntry>, EngineError> {
    serde_json::from_str(json)
        .map_err(|e| EngineError::ParseError(format!("Failed to parse mood history: {}", e)))
}

/// Compute a baseline from a JSON mood history (stateless, one-shot).
///
/// # Arguments
/// * `history_json` - JSON array of mood entries, oldest first
/// * `window` - Newest entries to include, `None` for all
///
/// # Returns
/// Baseline JSON
pub fn compute_baseline_json(history_json: &str, window: Option<usize>) -> Result<String, EngineError> {
    let history = parse_history(history_json)?;
    let baseline = compute_baseline(&history, Window::from_size(window)?);
    Ok(serde_json::to_string(&baseline)?)
}

/// Scan a message and return the crisis signal as JSON
pub fn scan_json(text: &str) -> Result<String, EngineError> {
    Ok(serde_json::to_string(&crisis::scan(text))?)
}

/// Select an intervention from a JSON [`SelectionRequest`], returning the module as JSON
pub fn select_intervention_json(request_json: &str) -> Result<String, EngineError> {
    let request: SelectionRequest = serde_json::from_str(request_json)
        .map_err(|e| EngineError::ParseError(format!("Failed to parse selection request: {}", e)))?;

    let baseline = match request.baseline {
        Some(baseline) => baseline,
        None => compute_baseline(&request.history, Window::All),
    };
    let catalog = match request.catalog.as_deref() {
        Some(custom) => {
            validate_catalog(custom)?;
            custom
        }
        None => default_catalog(),
    };

    let chosen = select_intervention(
        catalog,
        request.current_mood,
        &baseline,
        request.recent_ids.ids(),
    )?;
    Ok(serde_json::to_string(chosen)?)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ProcessorState {
    history: Vec<MoodEntry>,
    recent: InterventionHistory,
}

/// Stateful processor for an application session.
///
/// Holds the caller's mood history and recent interventions so that each
/// check-in and selection sees the same data. All computation is delegated to
/// the pure components; the processor only threads state between them.
pub struct WellnessProcessor {
    tracker: BaselineTracker,
    scanner: CrisisScanner,
    selector: InterventionSelector,
    catalog: Vec<InterventionModule>,
    max_history: usize,
    state: ProcessorState,
}

impl Default for WellnessProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl WellnessProcessor {
    /// Create a processor with default settings and the built-in catalog
    pub fn new() -> Self {
        let config = EngineConfig::default();
        Self {
            tracker: BaselineTracker::default(),
            scanner: CrisisScanner::default(),
            selector: InterventionSelector::default(),
            catalog: default_catalog().to_vec(),
            max_history: config.history.max_entries,
            state: ProcessorState::default(),
        }
    }

    /// Create a processor with a specific baseline window (number of entries)
    pub fn with_baseline_window(entries: usize) -> Result<Self, EngineError> {
        let mut processor = Self::new();
        processor.tracker = BaselineTracker::new(Window::last(entries)?);
        Ok(processor)
    }

    /// Create a processor from a configuration
    pub fn with_config(config: &EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            tracker: config.baseline_tracker()?,
            scanner: config.crisis_scanner(),
            selector: config.intervention_selector()?,
            catalog: default_catalog().to_vec(),
            max_history: config.history.max_entries,
            state: ProcessorState::default(),
        })
    }

    /// Replace the intervention catalog
    pub fn with_catalog(mut self, catalog: Vec<InterventionModule>) -> Result<Self, EngineError> {
        validate_catalog(&catalog)?;
        self.catalog = catalog;
        Ok(self)
    }

    /// Record a mood entry and return the updated baseline
    pub fn record_mood(&mut self, entry: MoodEntry) -> CheckIn {
        // Deviation is measured against the baseline before this entry
        let prior = self.baseline();
        let deviation = baseline::deviation(entry.mood, &prior);
        let z_score = baseline::z_score(entry.mood, &prior);
        let entry_id = entry.id.clone();

        self.state.history.push(entry);
        if self.state.history.len() > self.max_history {
            let excess = self.state.history.len() - self.max_history;
            self.state.history.drain(..excess);
        }

        let baseline = self.baseline();
        let building_baseline = (baseline.sample_count as usize) < MIN_TREND_SAMPLES;

        CheckIn {
            entry_id,
            baseline,
            deviation,
            z_score,
            building_baseline,
        }
    }

    /// Baseline over the current history
    pub fn baseline(&self) -> BaselineStats {
        self.tracker.compute(&self.state.history)
    }

    /// Scan a message with the configured lexicon
    pub fn scan_message(&self, text: &str) -> CrisisSignal {
        let signal = self.scanner.scan(text);
        if signal.severity == Severity::High {
            tracing::warn!(matches = signal.matched_terms.len(), "high severity crisis signal");
        }
        signal
    }

    /// Scan a chat message and build the supportive reply.
    ///
    /// The reply is always produced; the signal and resources travel alongside
    /// it for the caller's escalation policy.
    pub fn chat_turn(&self, text: &str) -> ChatTurn {
        let signal = self.scan_message(text);
        let resources = escalation_resources(&signal);
        ChatTurn {
            reply: respond(text),
            signal,
            resources,
        }
    }

    /// Select the next intervention and remember it
    pub fn next_intervention(
        &mut self,
        current_mood: MoodScore,
    ) -> Result<InterventionModule, EngineError> {
        let baseline = self.baseline();
        let chosen = self
            .selector
            .select(&self.catalog, current_mood, &baseline, self.state.recent.ids())?
            .clone();
        self.state.recent.record(chosen.id.clone());
        Ok(chosen)
    }

    pub fn recent_interventions(&self) -> &InterventionHistory {
        &self.state.recent
    }

    pub fn history(&self) -> &[MoodEntry] {
        &self.state.history
    }

    pub fn history_len(&self) -> usize {
        self.state.history.len()
    }

    pub fn catalog(&self) -> &[InterventionModule] {
        &self.catalog
    }

    /// Save history and recent interventions to JSON for persistence
    pub fn save_state(&self) -> Result<String, EngineError> {
        serde_json::to_string(&self.state).map_err(|e| EngineError::EncodingError(e.to_string()))
    }

    /// Load history and recent interventions from JSON
    pub fn load_state(&mut self, json: &str) -> Result<(), EngineError> {
        let mut state: ProcessorState =
            serde_json::from_str(json).map_err(|e| EngineError::ParseError(e.to_string()))?;
        if state.history.len() > self.max_history {
            let excess = state.history.len() - self.max_history;
            state.history.drain(..excess);
        }
        self.state = state;
        Ok(())
    }

    /// Clear history and recent interventions
    pub fn clear(&mut self) {
        self.state.history.clear();
        self.state.recent.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::responder::SupportTopic;
    use crate::types::Trend;
    use chrono::{Duration, TimeZone, Utc};

    fn entry(mood: i64, day: i64) -> MoodEntry {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 20, 0, 0).unwrap();
        MoodEntry::new(MoodScore::new(mood).unwrap(), start + Duration::days(day))
    }

    fn sample_history_json() -> &'static str {
        r#"[
            {"mood": 5, "timestamp": "2024-01-01T20:00:00Z"},
            {"mood": 5, "timestamp": "2024-01-02T20:00:00Z"},
            {"mood": 5, "timestamp": "2024-01-03T20:00:00Z", "note": "good run"},
            {"mood": 1, "timestamp": "2024-01-04T20:00:00Z", "tags": ["work"]},
            {"mood": 1, "timestamp": "2024-01-05T20:00:00Z"},
            {"mood": 1, "timestamp": "2024-01-06T20:00:00Z"}
        ]"#
    }

    #[test]
    fn test_compute_baseline_json() {
        let json = compute_baseline_json(sample_history_json(), Some(6)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["sample_count"], 6);
        assert_eq!(value["trend"], "falling");
        assert_eq!(value["rolling_mean"], 3.0);
        assert_eq!(value["last_updated"], "2024-01-06T20:00:00Z");
    }

    #[test]
    fn test_compute_baseline_json_empty() {
        let json = compute_baseline_json("[]", None).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["sample_count"], 0);
        assert!(value["rolling_mean"].is_null());
        assert_eq!(value["rolling_std_dev"], 0.0);
        assert_eq!(value["trend"], "stable");
    }

    #[test]
    fn test_compute_baseline_json_rejects_bad_input() {
        assert!(compute_baseline_json("not json", None).is_err());
        assert!(compute_baseline_json(r#"[{"mood": 0, "timestamp": "2024-01-01T00:00:00Z"}]"#, None).is_err());
        assert!(matches!(
            compute_baseline_json("[]", Some(0)),
            Err(EngineError::InvalidWindow(_))
        ));
    }

    #[test]
    fn test_scan_json() {
        let value: serde_json::Value =
            serde_json::from_str(&scan_json("I want to end it all").unwrap()).unwrap();
        assert_eq!(value["matched"], true);
        assert_eq!(value["severity"], "high");
        assert_eq!(value["matched_terms"][0], "end it all");
    }

    #[test]
    fn test_select_intervention_json() {
        let request = format!(
            r#"{{"current_mood": 4, "history": {}, "recent_ids": ["grounding_54321"]}}"#,
            sample_history_json()
        );
        let value: serde_json::Value =
            serde_json::from_str(&select_intervention_json(&request).unwrap()).unwrap();

        // falling trend, grounding used recently
        assert_eq!(value["id"], "box_breathing");
    }

    #[test]
    fn test_select_intervention_json_empty_catalog() {
        let result = select_intervention_json(r#"{"current_mood": 3, "catalog": []}"#);
        assert!(matches!(result, Err(EngineError::EmptyCatalog)));
    }

    #[test]
    fn test_select_intervention_json_validates_custom_catalog() {
        let request = r#"{
            "current_mood": 3,
            "catalog": [
                {"id": "box", "name": "Box", "description": "", "duration_minutes": 4, "instructions": [], "category": "breathing"},
                {"id": "box", "name": "Box again", "description": "", "duration_minutes": 2, "instructions": [], "category": "reflection"}
            ]
        }"#;
        assert!(matches!(
            select_intervention_json(request),
            Err(EngineError::InvalidCatalog(_))
        ));

        let blank = r#"{
            "current_mood": 3,
            "catalog": [{"id": " ", "name": "", "description": "", "duration_minutes": 2, "instructions": [], "category": "reflection"}]
        }"#;
        assert!(matches!(
            select_intervention_json(blank),
            Err(EngineError::InvalidCatalog(_))
        ));
    }

    #[test]
    fn test_select_intervention_json_rejects_bad_mood() {
        let result = select_intervention_json(r#"{"current_mood": 12}"#);
        assert!(matches!(result, Err(EngineError::ParseError(_))));
    }

    #[test]
    fn test_processor_check_in() {
        let mut processor = WellnessProcessor::new();

        let first = processor.record_mood(entry(4, 0));
        assert_eq!(first.baseline.sample_count, 1);
        assert_eq!(first.deviation, None);
        assert!(first.building_baseline);

        processor.record_mood(entry(4, 1));
        let third = processor.record_mood(entry(2, 2));

        assert_eq!(third.deviation, Some(-2.0));
        // prior baseline had no spread
        assert_eq!(third.z_score, None);
        assert!(!third.building_baseline);
        assert_eq!(third.baseline.sample_count, 3);
        assert_eq!(third.baseline.trend, Trend::Falling);
    }

    #[test]
    fn test_processor_history_bounded() {
        let mut config = EngineConfig::default();
        config.history.max_entries = 3;
        let mut processor = WellnessProcessor::with_config(&config).unwrap();

        for day in 0..5 {
            processor.record_mood(entry(3, day));
        }

        assert_eq!(processor.history_len(), 3);
        assert_eq!(processor.history()[0].timestamp, entry(3, 2).timestamp);
    }

    #[test]
    fn test_processor_custom_window() {
        let mut processor = WellnessProcessor::with_baseline_window(2).unwrap();
        for (day, mood) in [1, 1, 5, 5].into_iter().enumerate() {
            processor.record_mood(entry(mood, day as i64));
        }

        let baseline = processor.baseline();
        assert_eq!(baseline.sample_count, 2);
        assert_eq!(baseline.rolling_mean, Some(5.0));
        assert!(WellnessProcessor::with_baseline_window(0).is_err());
    }

    #[test]
    fn test_processor_never_repeats_recent() {
        let mut processor = WellnessProcessor::new();
        let mood = MoodScore::new(3).unwrap();
        let mut seen = Vec::new();

        for _ in 0..5 {
            let chosen = processor.next_intervention(mood).unwrap();
            assert!(!seen.contains(&chosen.id));
            seen.push(chosen.id);
        }

        assert_eq!(processor.recent_interventions().len(), 5);
        assert_eq!(processor.recent_interventions().ids()[0], seen[4]);
    }

    #[test]
    fn test_processor_low_mood_gets_relief() {
        let mut processor = WellnessProcessor::new();
        let chosen = processor.next_intervention(MoodScore::new(1).unwrap()).unwrap();
        assert_eq!(chosen.id, "grounding_54321");
    }

    #[test]
    fn test_processor_rejects_empty_catalog() {
        let result = WellnessProcessor::new().with_catalog(vec![]);
        assert!(matches!(result, Err(EngineError::EmptyCatalog)));
    }

    #[test]
    fn test_chat_turn_augments_reply() {
        let processor = WellnessProcessor::new();

        let turn = processor.chat_turn("I'm anxious and feel hopeless");
        assert_eq!(turn.reply.topic, SupportTopic::Anxiety);
        assert_eq!(turn.signal.severity, Severity::Watch);
        assert!(!turn.resources.is_empty());

        let calm = processor.chat_turn("had a good day");
        assert_eq!(calm.signal.severity, Severity::None);
        assert!(calm.resources.is_empty());
    }

    #[test]
    fn test_configured_lexicon() {
        let mut config = EngineConfig::default();
        config.lexicon.extra_high_terms = vec!["disappear forever".to_string()];
        let processor = WellnessProcessor::with_config(&config).unwrap();

        assert_eq!(
            processor.scan_message("I want to disappear forever").severity,
            Severity::High
        );
    }

    #[test]
    fn test_state_serialization() {
        let mut processor = WellnessProcessor::new();
        processor.record_mood(entry(3, 0));
        processor.record_mood(entry(2, 1));
        let chosen = processor.next_intervention(MoodScore::new(2).unwrap()).unwrap();

        let saved = processor.save_state().unwrap();

        let mut restored = WellnessProcessor::new();
        restored.load_state(&saved).unwrap();

        assert_eq!(restored.history_len(), 2);
        assert!(restored.recent_interventions().contains(&chosen.id));
        assert_eq!(restored.baseline(), processor.baseline());

        // the restored processor continues to avoid the recorded module
        let next = restored.next_intervention(MoodScore::new(2).unwrap()).unwrap();
        assert_ne!(next.id, chosen.id);
    }

    #[test]
    fn test_load_state_rejects_invalid_json() {
        let mut processor = WellnessProcessor::new();
        assert!(matches!(
            processor.load_state("not json"),
            Err(EngineError::ParseError(_))
        ));
    }

    #[test]
    fn test_clear() {
        let mut processor = WellnessProcessor::new();
        processor.record_mood(entry(3, 0));
        processor.next_intervention(MoodScore::new(3).unwrap()).unwrap();

        processor.clear();
        assert_eq!(processor.history_len(), 0);
        assert!(processor.recent_interventions().is_empty());
        assert!(!processor.baseline().has_samples());
    }
}
