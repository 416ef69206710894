//! Micro-intervention selection
//!
//! Selection policy, applied in order:
//! 1. Skip recently used modules, unless that would leave nothing to choose.
//! 2. For low mood or a falling trend, prefer breathing and grounding modules.
//! 3. Pick the shortest module, breaking ties by catalog order.
//!
//! The selector is stateless. Callers record the chosen id in their
//! [`InterventionHistory`](crate::types::InterventionHistory).

use crate::error::EngineError;
use crate::types::{BaselineStats, InterventionModule, MoodScore, Trend};

/// Scores at or below this are treated as low mood
pub const DEFAULT_LOW_MOOD_THRESHOLD: u8 = 2;

/// Chooses a micro-intervention from a catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterventionSelector {
    low_mood_threshold: u8,
}

impl Default for InterventionSelector {
    fn default() -> Self {
        Self {
            low_mood_threshold: DEFAULT_LOW_MOOD_THRESHOLD,
        }
    }
}

impl InterventionSelector {
    pub fn new(low_mood_threshold: MoodScore) -> Self {
        Self {
            low_mood_threshold: low_mood_threshold.get(),
        }
    }

    pub fn low_mood_threshold(&self) -> u8 {
        self.low_mood_threshold
    }

    /// Whether the current state calls for relief-oriented modules
    pub fn needs_relief(&self, current_mood: MoodScore, baseline: &BaselineStats) -> bool {
        current_mood.get() <= self.low_mood_threshold || baseline.trend == Trend::Falling
    }

    /// Select a module; fails only when the catalog is empty
    pub fn select<'a, S: AsRef<str>>(
        &self,
        catalog: &'a [InterventionModule],
        current_mood: MoodScore,
        baseline: &BaselineStats,
        recent_ids: &[S],
    ) -> Result<&'a InterventionModule, EngineError> {
        if catalog.is_empty() {
            return Err(EngineError::EmptyCatalog);
        }

        let fresh: Vec<&InterventionModule> = catalog
            .iter()
            .filter(|module| !recent_ids.iter().any(|id| id.as_ref() == module.id))
            .collect();

        let candidates = if fresh.is_empty() {
            tracing::debug!("every module used recently, ignoring recency filter");
            catalog.iter().collect()
        } else {
            fresh
        };

        let candidates = if self.needs_relief(current_mood, baseline) {
            let relief: Vec<&InterventionModule> = candidates
                .iter()
                .copied()
                .filter(|module| module.category.relieves_distress())
                .collect();
            if relief.is_empty() {
                candidates
            } else {
                relief
            }
        } else {
            candidates
        };

        // min_by_key keeps the first of equal minima, which is catalog order
        let chosen = candidates
            .into_iter()
            .min_by_key(|module| module.duration_minutes)
            .ok_or(EngineError::EmptyCatalog)?;

        tracing::debug!(
            intervention = %chosen.id,
            mood = current_mood.get(),
            trend = ?baseline.trend,
            "selected intervention"
        );

        Ok(chosen)
    }
}

/// Select with the default low-mood threshold
pub fn select_intervention<'a, S: AsRef<str>>(
    catalog: &'a [InterventionModule],
    current_mood: MoodScore,
    baseline: &BaselineStats,
    recent_ids: &[S],
) -> Result<&'a InterventionModule, EngineError> {
    InterventionSelector::default().select(catalog, current_mood, baseline, recent_ids)
}
