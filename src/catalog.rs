//! Built-in intervention catalog
//!
//! The catalog is a fixed, versioned table built once on first use and
//! read-only afterwards.

use crate::error::EngineError;
use crate::types::{InterventionCategory, InterventionModule};
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Version of the built-in catalog table
pub const CATALOG_VERSION: &str = "2024.1";

static DEFAULT_CATALOG: Lazy<Vec<InterventionModule>> = Lazy::new(build_default_catalog);

/// Cached built-in catalog
pub fn default_catalog() -> &'static [InterventionModule] {
    &DEFAULT_CATALOG
}

/// Look up a module by id
pub fn find<'a>(catalog: &'a [InterventionModule], id: &str) -> Option<&'a InterventionModule> {
    catalog.iter().find(|module| module.id == id)
}

/// Check that a catalog is non-empty with unique, non-blank ids and positive durations
pub fn validate_catalog(catalog: &[InterventionModule]) -> Result<(), EngineError> {
    if catalog.is_empty() {
        return Err(EngineError::EmptyCatalog);
    }

    let mut seen = HashSet::new();
    for module in catalog {
        if module.id.trim().is_empty() {
            return Err(EngineError::InvalidCatalog("module with blank id".to_string()));
        }
        if !seen.insert(module.id.as_str()) {
            return Err(EngineError::InvalidCatalog(format!(
                "duplicate module id: {}",
                module.id
            )));
        }
        if module.duration_minutes == 0 {
            return Err(EngineError::InvalidCatalog(format!(
                "module {} has zero duration",
                module.id
            )));
        }
    }

    Ok(())
}

fn module(
    id: &str,
    name: &str,
    description: &str,
    duration_minutes: u32,
    category: InterventionCategory,
    instructions: &[&str],
) -> InterventionModule {
    InterventionModule {
        id: id.into(),
        name: name.into(),
        description: description.into(),
        duration_minutes,
        instructions: instructions.iter().map(|step| step.to_string()).collect(),
        category,
    }
}

/// Build the catalog table
///
/// Prefer [`default_catalog`], which returns the cached copy.
pub fn build_default_catalog() -> Vec<InterventionModule> {
    vec![
        module(
            "breathing_478",
            "4-7-8 Breathing",
            "Calming breathing technique to reduce anxiety and stress",
            5,
            InterventionCategory::Breathing,
            &[
                "Sit comfortably with your back straight",
                "Exhale completely through your mouth",
                "Inhale through nose for 4 counts",
                "Hold your breath for 7 counts",
                "Exhale through mouth for 8 counts",
                "Repeat 3-4 times",
            ],
        ),
        module(
            "grounding_54321",
            "5-4-3-2-1 Grounding",
            "Grounding technique to manage anxiety and overwhelm",
            3,
            InterventionCategory::Grounding,
            &[
                "Name 5 things you can see",
                "Name 4 things you can touch",
                "Name 3 things you can hear",
                "Name 2 things you can smell",
                "Name 1 thing you can taste",
            ],
        ),
        module(
            "positive_affirmation",
            "Positive Affirmations",
            "Boost self-esteem and positive thinking",
            2,
            InterventionCategory::Affirmation,
            &[
                "I am worthy of love and respect",
                "I have the strength to overcome challenges",
                "I choose to focus on what I can control",
                "I am growing and learning every day",
                "I deserve happiness and peace",
            ],
        ),
        module(
            "mindful_meditation_2min",
            "2-Minute Mindful Meditation",
            "A short guided meditation to help you reset",
            2,
            InterventionCategory::Meditation,
            &[
                "Sit comfortably and close your eyes",
                "Focus on your breath, noticing each inhale and exhale",
                "If your mind wanders, gently bring your attention back to your breath",
                "Continue for 2 minutes",
            ],
        ),
        module(
            "box_breathing",
            "Box Breathing",
            "Even four-count breathing to steady a racing mind",
            4,
            InterventionCategory::Breathing,
            &[
                "Inhale through your nose for 4 counts",
                "Hold for 4 counts",
                "Exhale slowly for 4 counts",
                "Hold for 4 counts",
                "Repeat for 4 rounds",
            ],
        ),
        module(
            "body_scan",
            "Body Scan",
            "Release tension by moving attention through the body",
            6,
            InterventionCategory::Meditation,
            &[
                "Lie down or sit with your feet on the floor",
                "Bring attention to your toes and notice any sensation",
                "Slowly move your attention up through legs, torso, arms and head",
                "Breathe into any area that feels tight",
                "Finish with three slow breaths",
            ],
        ),
        module(
            "gratitude_list",
            "Three Good Things",
            "Notice small positives from today",
            4,
            InterventionCategory::Reflection,
            &[
                "Write down three things that went well today",
                "For each, note why it happened",
                "Read the list back slowly",
            ],
        ),
    ]
}
