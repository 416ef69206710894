//! Baseline management
//!
//! This module computes rolling mood baselines: mean, population standard
//! deviation and trend over a caller-supplied history. Baselines enable relative
//! interpretation of a new mood score against the user's own norm.
//!
//! The history is read in the order given (oldest first). It is never re-sorted,
//! so trend detection reflects the caller's insertion order.

use crate::error::EngineError;
use crate::types::{BaselineStats, MoodEntry, MoodScore, Trend};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

/// Default trend sensitivity, in standard deviations
pub const DEFAULT_TREND_SENSITIVITY: f64 = 0.5;

/// Minimum number of samples before a trend other than `Stable` is reported
pub const MIN_TREND_SAMPLES: usize = 3;

/// How much of the history a baseline covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Window {
    /// The entire history
    #[default]
    All,
    /// The newest `n` entries
    Last(NonZeroUsize),
}

impl Window {
    /// Window over the newest `n` entries; `n` must be positive
    pub fn last(n: usize) -> Result<Self, EngineError> {
        NonZeroUsize::new(n)
            .map(Window::Last)
            .ok_or_else(|| EngineError::InvalidWindow("window size must be at least 1".to_string()))
    }

    /// `None` means the entire history
    pub fn from_size(size: Option<usize>) -> Result<Self, EngineError> {
        match size {
            Some(n) => Self::last(n),
            None => Ok(Window::All),
        }
    }

    /// Slice of `items` covered by this window
    pub fn apply<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        match self {
            Window::All => items,
            Window::Last(n) => &items[items.len().saturating_sub(n.get())..],
        }
    }
}

/// Computes baseline snapshots from mood history
#[derive(Debug, Clone, PartialEq)]
pub struct BaselineTracker {
    window: Window,
    trend_sensitivity: f64,
}

impl Default for BaselineTracker {
    fn default() -> Self {
        Self::new(Window::All)
    }
}

impl BaselineTracker {
    /// Create a tracker over the given window with the default trend sensitivity
    pub fn new(window: Window) -> Self {
        Self {
            window,
            trend_sensitivity: DEFAULT_TREND_SENSITIVITY,
        }
    }

    /// Override how many standard deviations the thirds must differ by
    pub fn with_trend_sensitivity(mut self, sensitivity: f64) -> Self {
        self.trend_sensitivity = sensitivity;
        self
    }

    pub fn window(&self) -> Window {
        self.window
    }

    pub fn trend_sensitivity(&self) -> f64 {
        self.trend_sensitivity
    }

    /// Compute a fresh baseline snapshot
    pub fn compute(&self, history: &[MoodEntry]) -> BaselineStats {
        let windowed = self.window.apply(history);
        if windowed.is_empty() {
            return BaselineStats::empty();
        }

        let scores: Vec<f64> = windowed.iter().map(|entry| entry.mood.as_f64()).collect();
        let (mean, std_dev) = mean_and_std_dev(&scores);
        let trend = classify_trend(&scores, std_dev, self.trend_sensitivity);

        tracing::debug!(
            samples = scores.len(),
            mean,
            std_dev,
            ?trend,
            "computed mood baseline"
        );

        BaselineStats {
            rolling_mean: Some(mean),
            rolling_std_dev: std_dev,
            sample_count: saturating_count(scores.len()),
            trend,
            last_updated: windowed.last().map(|entry| entry.timestamp),
        }
    }
}

/// Compute a baseline over `history` with the default trend sensitivity
pub fn compute_baseline(history: &[MoodEntry], window: Window) -> BaselineStats {
    BaselineTracker::new(window).compute(history)
}

/// Raw deviation of `current` from the baseline mean, in mood points
pub fn deviation(current: MoodScore, baseline: &BaselineStats) -> Option<f64> {
    baseline.rolling_mean.map(|mean| current.as_f64() - mean)
}

/// Deviation of `current` in standard deviations
///
/// `None` without a baseline or when the baseline has no spread.
pub fn z_score(current: MoodScore, baseline: &BaselineStats) -> Option<f64> {
    match (deviation(current, baseline), baseline.rolling_std_dev) {
        (Some(delta), std_dev) if std_dev > 0.0 => Some(delta / std_dev),
        _ => None,
    }
}

/// Sample count as stored in `BaselineStats`, saturating at `u32::MAX`
fn saturating_count(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

/// Arithmetic mean of a non-empty slice
fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Mean and population standard deviation (divide by N)
fn mean_and_std_dev(values: &[f64]) -> (f64, f64) {
    let mean = mean(values);
    if values.len() <= 1 {
        return (mean, 0.0);
    }

    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / values.len() as f64;
    (mean, variance.sqrt())
}

/// Compare the newest third of the window against the oldest third
fn classify_trend(scores: &[f64], std_dev: f64, sensitivity: f64) -> Trend {
    if scores.len() < MIN_TREND_SAMPLES {
        return Trend::Stable;
    }

    let third = scores.len() / 3;
    let oldest = mean(&scores[..third]);
    let newest = mean(&scores[scores.len() - third..]);
    let threshold = sensitivity * std_dev;
    let delta = newest - oldest;

    if delta > threshold {
        Trend::Rising
    } else if delta < -threshold {
        Trend::Falling
    } else {
        Trend::Stable
    }
}
