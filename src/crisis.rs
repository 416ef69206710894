//! Crisis keyword scanning
//!
//! Classifies free text against a two-tier lexicon of crisis-risk language.
//! Matching is literal: case-insensitive, whitespace-normalized substring search
//! that only accepts matches on word boundaries. There is no stemming and no
//! fuzzy matching, so every classification can be traced to a lexicon entry.
//!
//! The scanner only classifies. Deciding what to do with a signal (showing a
//! hotline, pausing a chat) belongs to the caller.

use crate::types::{CrisisSignal, Severity};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Explicit self-harm or suicidal-intent phrases
pub const HIGH_SEVERITY_TERMS: &[&str] = &[
    "suicide",
    "suicidal",
    "kill myself",
    "killing myself",
    "end my life",
    "end it all",
    "take my own life",
    "want to die",
    "wanna die",
    "better off dead",
    "no reason to live",
    "self harm",
    "self-harm",
    "self harming",
    "self-harming",
    "hurt myself",
    "hurting myself",
    "harming myself",
    "cut myself",
    "cutting myself",
    "overdose",
];

/// Hopelessness and persistent-sadness markers
pub const WATCH_SEVERITY_TERMS: &[&str] = &[
    "hopeless",
    "hopelessness",
    "helpless",
    "worthless",
    "can't go on",
    "cannot go on",
    "no point",
    "nothing matters",
    "empty inside",
    "trapped",
    "a burden",
    "can't cope",
    "cannot cope",
    "depressed",
    "sad all the time",
    "so alone",
];

static DEFAULT_SCANNER: Lazy<CrisisScanner> = Lazy::new(CrisisScanner::default);

/// Two-tier crisis lexicon
///
/// Terms are stored normalized (lower-case, single spaces). A term listed in
/// both tiers is kept only in the high tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrisisLexicon {
    high: Vec<String>,
    watch: Vec<String>,
}

impl Default for CrisisLexicon {
    fn default() -> Self {
        Self::new(HIGH_SEVERITY_TERMS.iter().copied(), WATCH_SEVERITY_TERMS.iter().copied())
    }
}

impl CrisisLexicon {
    /// Build a lexicon from raw term lists
    pub fn new<H, W>(high: H, watch: W) -> Self
    where
        H: IntoIterator,
        H::Item: AsRef<str>,
        W: IntoIterator,
        W::Item: AsRef<str>,
    {
        let mut lexicon = Self {
            high: Vec::new(),
            watch: Vec::new(),
        };
        lexicon.extend(high, watch);
        lexicon
    }

    /// Append terms to both tiers
    pub fn with_additional<H, W>(mut self, high: H, watch: W) -> Self
    where
        H: IntoIterator,
        H::Item: AsRef<str>,
        W: IntoIterator,
        W::Item: AsRef<str>,
    {
        self.extend(high, watch);
        self
    }

    fn extend<H, W>(&mut self, high: H, watch: W)
    where
        H: IntoIterator,
        H::Item: AsRef<str>,
        W: IntoIterator,
        W::Item: AsRef<str>,
    {
        for term in high {
            let term = normalize(term.as_ref());
            if term.is_empty() || self.high.contains(&term) {
                continue;
            }
            self.watch.retain(|existing| existing != &term);
            self.high.push(term);
        }

        for term in watch {
            let term = normalize(term.as_ref());
            if term.is_empty() || self.high.contains(&term) || self.watch.contains(&term) {
                continue;
            }
            self.watch.push(term);
        }
    }

    pub fn high_terms(&self) -> &[String] {
        &self.high
    }

    pub fn watch_terms(&self) -> &[String] {
        &self.watch
    }

    /// Number of terms across both tiers
    pub fn len(&self) -> usize {
        self.high.len() + self.watch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.high.is_empty() && self.watch.is_empty()
    }

    /// Tier a term belongs to, `Severity::None` if it is not in the lexicon
    pub fn tier_of(&self, term: &str) -> Severity {
        let term = normalize(term);
        if self.high.contains(&term) {
            Severity::High
        } else if self.watch.contains(&term) {
            Severity::Watch
        } else {
            Severity::None
        }
    }

    fn tiers(&self) -> impl Iterator<Item = (&str, Severity)> {
        self.high
            .iter()
            .map(|term| (term.as_str(), Severity::High))
            .chain(self.watch.iter().map(|term| (term.as_str(), Severity::Watch)))
    }
}

/// Scans text against a crisis lexicon
#[derive(Debug, Clone, Default)]
pub struct CrisisScanner {
    lexicon: CrisisLexicon,
}

impl CrisisScanner {
    pub fn new(lexicon: CrisisLexicon) -> Self {
        Self { lexicon }
    }

    pub fn lexicon(&self) -> &CrisisLexicon {
        &self.lexicon
    }

    /// Classify a message
    pub fn scan(&self, text: &str) -> CrisisSignal {
        let haystack = normalize(text);
        if haystack.is_empty() {
            return CrisisSignal::none();
        }

        // (position of first match, term, tier); sort is stable so ties keep lexicon order
        let mut hits: Vec<(usize, &str, Severity)> = self
            .lexicon
            .tiers()
            .filter_map(|(term, tier)| find_term(&haystack, term).map(|pos| (pos, term, tier)))
            .collect();
        hits.sort_by_key(|(pos, _, _)| *pos);

        let severity = hits
            .iter()
            .map(|(_, _, tier)| *tier)
            .max()
            .unwrap_or(Severity::None);

        // Text and terms stay out of the logs
        tracing::debug!(matches = hits.len(), ?severity, "scanned message");

        CrisisSignal {
            matched: !hits.is_empty(),
            matched_terms: hits.into_iter().map(|(_, term, _)| term.to_string()).collect(),
            severity,
        }
    }
}

/// Scan `text` with the built-in lexicon
pub fn scan(text: &str) -> CrisisSignal {
    DEFAULT_SCANNER.scan(text)
}

/// Lower-case, unify apostrophes and collapse whitespace runs to single spaces
pub(crate) fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase().replace(['\u{2018}', '\u{2019}'], "'");
    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Byte offset of the first word-boundary match of `term` in `haystack`
///
/// Both arguments must already be normalized.
pub(crate) fn find_term(haystack: &str, term: &str) -> Option<usize> {
    if term.is_empty() {
        return None;
    }

    haystack.match_indices(term).map(|(pos, _)| pos).find(|&pos| {
        let before = haystack[..pos].chars().next_back();
        let after = haystack[pos + term.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}
