//! Wellness Engine - On-device mood baseline and crisis triage engine
//!
//! The engine turns a user's mood check-ins and chat messages into signals an
//! app shell can act on: rolling baseline → crisis keyword scan → micro-intervention
//! selection. Every computation is a pure function of its inputs; the
//! [`WellnessProcessor`] only threads history between calls.
//!
//! ## Modules
//!
//! - **Baseline**: rolling mean, population standard deviation and trend over mood history
//! - **Crisis**: two-tier keyword scan (watch / high) with escalation resources
//! - **Intervention**: recency-aware selection from a static catalog

pub mod baseline;
pub mod catalog;
pub mod config;
pub mod crisis;
pub mod error;
pub mod intervention;
pub mod pipeline;
pub mod resources;
pub mod responder;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

#[cfg(feature = "cli")]
pub mod logging;

pub use baseline::{compute_baseline, BaselineTracker, Window};
pub use config::EngineConfig;
pub use crisis::{scan, CrisisLexicon, CrisisScanner};
pub use error::EngineError;
pub use intervention::{select_intervention, InterventionSelector};
pub use pipeline::{
    compute_baseline_json, scan_json, select_intervention_json, CheckIn, ChatTurn,
    WellnessProcessor,
};
pub use types::{
    BaselineStats, CrisisSignal, InterventionHistory, InterventionModule, MoodEntry, MoodScore,
    Severity, Trend,
};

/// Engine version reported by the CLI and FFI
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by diagnostics
pub const PRODUCER_NAME: &str = "wellness-engine";
