//! Crisis support resources
//!
//! Static contact table shown alongside a crisis signal. The engine never
//! contacts anyone; it only tells the caller which entries to display.

use crate::types::{CrisisSignal, Severity};
use serde::Serialize;

/// A hotline or support service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrisisResource {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<&'static str>,
    /// Reachable right now by call or text
    pub immediate: bool,
}

static RESOURCES: &[CrisisResource] = &[
    CrisisResource {
        name: "988 Suicide & Crisis Lifeline (US)",
        description: "24/7 free and confidential support for people in distress.",
        phone: Some("988"),
        text: None,
        url: Some("https://988lifeline.org/"),
        immediate: true,
    },
    CrisisResource {
        name: "National Domestic Violence Hotline (US)",
        description: "24/7 confidential support for anyone affected by abuse.",
        phone: Some("1-800-799-7233"),
        text: None,
        url: Some("https://www.thehotline.org/"),
        immediate: true,
    },
    CrisisResource {
        name: "Crisis Helpline (India)",
        description: "Emotional support for people in distress or feeling suicidal.",
        phone: Some("+91-22-27546669"),
        text: None,
        url: None,
        immediate: true,
    },
    CrisisResource {
        name: "Crisis Text Line",
        description: "Text HOME to 741741 for free, 24/7 crisis counseling.",
        phone: None,
        text: Some("HOME to 741741"),
        url: Some("https://www.crisistextline.org/"),
        immediate: true,
    },
    CrisisResource {
        name: "International Helplines",
        description: "Find mental health hotlines by country.",
        phone: None,
        text: None,
        url: Some("https://www.opencounseling.com/suicide-hotlines"),
        immediate: true,
    },
    CrisisResource {
        name: "SAMHSA National Helpline (US)",
        description: "Substance Abuse and Mental Health Services Administration.",
        phone: Some("1-800-662-HELP"),
        text: None,
        url: Some("https://www.samhsa.gov/find-help/national-helpline"),
        immediate: false,
    },
    CrisisResource {
        name: "National Alliance on Mental Illness (NAMI)",
        description: "Education, support, and advocacy for mental health.",
        phone: None,
        text: None,
        url: Some("https://nami.org/Home"),
        immediate: false,
    },
];

/// Every known resource
pub fn crisis_resources() -> &'static [CrisisResource] {
    RESOURCES
}

/// Resources to surface for a signal
///
/// Nothing for `none`, immediate lines for `high`, the full table for `watch`.
pub fn escalation_resources(signal: &CrisisSignal) -> Vec<&'static CrisisResource> {
    match signal.severity {
        Severity::None => Vec::new(),
        Severity::Watch => RESOURCES.iter().collect(),
        Severity::High => RESOURCES.iter().filter(|r| r.immediate).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crisis::scan;

    #[test]
    fn test_no_resources_without_signal() {
        assert!(escalation_resources(&CrisisSignal::none()).is_empty());
    }

    #[test]
    fn test_high_severity_leads_with_988() {
        let resources = escalation_resources(&scan("I want to end my life"));
        assert_eq!(resources.len(), 5);
        assert_eq!(resources[0].phone, Some("988"));
        assert!(resources.iter().all(|r| r.immediate));

        let phones: Vec<_> = resources.iter().filter_map(|r| r.phone).collect();
        assert!(phones.contains(&"1-800-799-7233"));
        assert!(phones.contains(&"+91-22-27546669"));
    }

    #[test]
    fn test_watch_severity_lists_everything() {
        let resources = escalation_resources(&scan("feeling worthless"));
        assert_eq!(resources.len(), crisis_resources().len());
    }

    #[test]
    fn test_serialization_skips_missing_contact() {
        let nami = crisis_resources()
            .iter()
            .find(|r| r.name.contains("NAMI"))
            .unwrap();
        let value = serde_json::to_value(nami).unwrap();
        assert!(value.get("phone").is_none());
        assert_eq!(value["url"], "https://nami.org/Home");

        let india = crisis_resources()
            .iter()
            .find(|r| r.phone == Some("+91-22-27546669"))
            .unwrap();
        assert!(serde_json::to_value(india).unwrap().get("url").is_none());
    }
}
