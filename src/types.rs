//! Core data types
//!
//! This module defines the value objects exchanged between the engine and its
//! callers: mood entries, baseline snapshots, crisis signals and interventions.

use crate::error::EngineError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Maximum number of intervention ids remembered for the recency filter
pub const RECENT_INTERVENTION_CAPACITY: usize = 5;

/// A validated mood score on the 1-5 scale
///
/// Out-of-range values are rejected at construction and on deserialization,
/// so statistics never see a corrupt score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct MoodScore(u8);

impl MoodScore {
    /// Lowest valid score
    pub const MIN: u8 = 1;
    /// Highest valid score
    pub const MAX: u8 = 5;

    /// Create a score, failing with `InvalidMood` outside 1..=5
    pub fn new(value: i64) -> Result<Self, EngineError> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(EngineError::InvalidMood(value))
        }
    }

    /// Create a score, clamping out-of-range values into 1..=5
    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(Self::MIN as i64, Self::MAX as i64) as u8)
    }

    /// Raw score value
    pub fn get(self) -> u8 {
        self.0
    }

    pub(crate) fn as_f64(self) -> f64 {
        self.0 as f64
    }

    /// Display label for the score
    pub fn label(self) -> &'static str {
        match self.0 {
            1 => "Very Sad",
            2 => "Sad",
            3 => "Neutral",
            4 => "Happy",
            _ => "Very Happy",
        }
    }
}

impl TryFrom<i64> for MoodScore {
    type Error = EngineError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MoodScore> for u8 {
    fn from(score: MoodScore) -> Self {
        score.0
    }
}

/// A single logged mood
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodEntry {
    /// Entry identifier; any string, a UUID v4 is generated when absent
    #[serde(default = "new_entry_id")]
    pub id: String,
    /// Mood score (1-5)
    pub mood: MoodScore,
    /// When the mood was logged
    pub timestamp: DateTime<Utc>,
    /// Optional free-text note
    #[serde(default, alias = "notes", skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Context tags (work, sleep, ...)
    #[serde(default, alias = "activities")]
    pub tags: BTreeSet<String>,
}

fn new_entry_id() -> String {
    Uuid::new_v4().to_string()
}

impl MoodEntry {
    /// Create an entry with no note and no tags
    pub fn new(mood: MoodScore, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: new_entry_id(),
            mood,
            timestamp,
            note: None,
            tags: BTreeSet::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Direction of mood over the baseline window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Rising,
    Falling,
    #[default]
    Stable,
}

/// Immutable snapshot of rolling mood statistics
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BaselineStats {
    /// Arithmetic mean over the window, `None` when there are no samples
    pub rolling_mean: Option<f64>,
    /// Population standard deviation (0 for fewer than two samples)
    pub rolling_std_dev: f64,
    /// Number of entries in the window
    pub sample_count: u32,
    /// Newest third versus oldest third of the window
    pub trend: Trend,
    /// Timestamp of the newest entry in the window
    pub last_updated: Option<DateTime<Utc>>,
}

impl BaselineStats {
    /// Zero-state baseline for an empty history
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether any samples contributed to this baseline
    pub fn has_samples(&self) -> bool {
        self.sample_count > 0
    }
}

/// Crisis severity tier
///
/// Ordered so that `High > Watch > None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    None,
    Watch,
    High,
}

/// Result of scanning one message against the crisis lexicon
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CrisisSignal {
    /// Whether any lexicon term matched
    pub matched: bool,
    /// Matched lexicon terms in order of first appearance
    pub matched_terms: Vec<String>,
    /// Highest tier among the matched terms
    pub severity: Severity,
}

impl CrisisSignal {
    /// Signal for text with no matches
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether the caller should surface escalation options
    pub fn requires_escalation(&self) -> bool {
        self.severity != Severity::None
    }
}

/// Kind of micro-intervention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterventionCategory {
    Breathing,
    Grounding,
    Affirmation,
    Meditation,
    Reflection,
}

impl InterventionCategory {
    /// Categories preferred for anxiety and low-mood relief
    pub fn relieves_distress(self) -> bool {
        matches!(self, Self::Breathing | Self::Grounding)
    }
}

/// A scripted coping exercise
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterventionModule {
    /// Unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Short description
    pub description: String,
    /// Expected duration in minutes
    #[serde(alias = "duration")]
    pub duration_minutes: u32,
    /// Ordered steps
    pub instructions: Vec<String>,
    /// Category used for relief preference
    pub category: InterventionCategory,
}

/// Most-recent-first list of selected intervention ids, capped at five
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct InterventionHistory {
    ids: Vec<String>,
}

impl InterventionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend a selected id, dropping the oldest beyond capacity
    pub fn record(&mut self, id: impl Into<String>) {
        self.ids.insert(0, id.into());
        self.ids.truncate(RECENT_INTERVENTION_CAPACITY);
    }

    /// Ids, most recent first
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|recent| recent == id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}

impl From<Vec<String>> for InterventionHistory {
    fn from(mut ids: Vec<String>) -> Self {
        ids.truncate(RECENT_INTERVENTION_CAPACITY);
        Self { ids }
    }
}

impl From<InterventionHistory> for Vec<String> {
    fn from(history: InterventionHistory) -> Self {
        history.ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_mood_score_range() {
        assert_eq!(MoodScore::new(1).unwrap().get(), 1);
        assert_eq!(MoodScore::new(5).unwrap().get(), 5);
        assert!(matches!(MoodScore::new(0), Err(EngineError::InvalidMood(0))));
        assert!(matches!(MoodScore::new(6), Err(EngineError::InvalidMood(6))));
        assert!(matches!(MoodScore::new(-3), Err(EngineError::InvalidMood(-3))));
    }

    #[test]
    fn test_mood_score_clamped() {
        assert_eq!(MoodScore::clamped(0).get(), 1);
        assert_eq!(MoodScore::clamped(9).get(), 5);
        assert_eq!(MoodScore::clamped(3).get(), 3);
    }

    #[test]
    fn test_mood_score_labels() {
        assert_eq!(MoodScore::new(1).unwrap().label(), "Very Sad");
        assert_eq!(MoodScore::new(3).unwrap().label(), "Neutral");
        assert_eq!(MoodScore::new(5).unwrap().label(), "Very Happy");
    }

    #[test]
    fn test_mood_entry_rejects_out_of_range() {
        let json = r#"{"mood": 7, "timestamp": "2024-01-15T14:00:00Z"}"#;
        let parsed: Result<MoodEntry, _> = serde_json::from_str(json);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_mood_entry_deserialization() {
        let json = r#"{
            "mood": 2,
            "timestamp": "2024-01-15T14:00:00Z",
            "note": "long day",
            "activities": ["work", "sleep"]
        }"#;

        let entry: MoodEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.mood.get(), 2);
        assert_eq!(
            entry.timestamp,
            Utc.with_ymd_and_hms(2024, 1, 15, 14, 0, 0).unwrap()
        );
        assert_eq!(entry.note.as_deref(), Some("long day"));
        assert!(entry.tags.contains("work"));
        assert!(entry.tags.contains("sleep"));
    }

    #[test]
    fn test_mood_entry_from_mood_api_record() {
        // shape written by the mood endpoint: millisecond id, `notes`, `activities`
        let json = r#"{"id":"1700000000000","mood":3,"activities":["work"],"notes":"long day","timestamp":"2024-01-15T14:00:00.000Z"}"#;

        let entry: MoodEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.id, "1700000000000");
        assert_eq!(entry.mood.get(), 3);
        assert_eq!(entry.note.as_deref(), Some("long day"));
        assert!(entry.tags.contains("work"));
    }

    #[test]
    fn test_mood_entry_generates_id() {
        let entry: MoodEntry =
            serde_json::from_str(r#"{"mood": 4, "timestamp": "2024-01-15T14:00:00Z"}"#).unwrap();
        assert!(Uuid::parse_str(&entry.id).is_ok());
        assert_ne!(entry.id, MoodEntry::new(entry.mood, entry.timestamp).id);
    }

    #[test]
    fn test_mood_score_serializes_as_integer() {
        let entry = MoodEntry::new(MoodScore::new(4).unwrap(), Utc::now());
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["mood"], 4);
        assert!(value.get("note").is_none());
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::High > Severity::Watch);
        assert!(Severity::Watch > Severity::None);
        assert_eq!(serde_json::to_string(&Severity::Watch).unwrap(), "\"watch\"");
    }

    #[test]
    fn test_empty_baseline() {
        let baseline = BaselineStats::empty();
        assert_eq!(baseline.sample_count, 0);
        assert!(baseline.rolling_mean.is_none());
        assert_eq!(baseline.rolling_std_dev, 0.0);
        assert_eq!(baseline.trend, Trend::Stable);
        assert!(!baseline.has_samples());

        let value = serde_json::to_value(&baseline).unwrap();
        assert!(value["rolling_mean"].is_null());
    }

    #[test]
    fn test_intervention_history_caps_at_five() {
        let mut history = InterventionHistory::new();
        for i in 0..7 {
            history.record(format!("module_{}", i));
        }

        assert_eq!(history.len(), RECENT_INTERVENTION_CAPACITY);
        assert_eq!(history.ids()[0], "module_6");
        assert_eq!(history.ids()[4], "module_2");
        assert!(!history.contains("module_1"));
    }

    #[test]
    fn test_intervention_history_truncates_on_load() {
        let json = r#"["a", "b", "c", "d", "e", "f", "g"]"#;
        let history: InterventionHistory = serde_json::from_str(json).unwrap();
        assert_eq!(history.len(), 5);
        assert_eq!(history.ids()[0], "a");
    }

    #[test]
    fn test_intervention_duration_alias() {
        let json = r#"{
            "id": "breathing_478",
            "name": "4-7-8 Breathing",
            "description": "Calming breathing",
            "duration": 5,
            "instructions": ["Inhale"],
            "category": "breathing"
        }"#;

        let module: InterventionModule = serde_json::from_str(json).unwrap();
        assert_eq!(module.duration_minutes, 5);
        assert!(module.category.relieves_distress());
    }
}
