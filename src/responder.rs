//! Keyword-matched supportive replies
//!
//! Literal substring lookup only, so inflections like "stressful" still match.
//! The first matching topic wins.

use crate::crisis::normalize;
use serde::{Deserialize, Serialize};

/// Topic detected in a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportTopic {
    Anxiety,
    LowMood,
    Stress,
    Positive,
    General,
}

/// Reply text for a chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportReply {
    pub topic: SupportTopic,
    pub text: String,
}

const TOPIC_KEYWORDS: &[(SupportTopic, &[&str])] = &[
    (SupportTopic::Anxiety, &["anxious", "anxiety"]),
    (SupportTopic::LowMood, &["sad", "depressed"]),
    (SupportTopic::Stress, &["stress"]),
    (SupportTopic::Positive, &["good", "happy"]),
];

impl SupportTopic {
    /// Fixed reply for the topic
    pub fn reply_text(self) -> &'static str {
        match self {
            SupportTopic::Anxiety => "I understand you're feeling anxious. Try taking slow, deep breaths. Would you like me to guide you through a breathing exercise?",
            SupportTopic::LowMood => "I hear that you're feeling down. Your feelings are valid. What's one small thing that usually brings you comfort?",
            SupportTopic::Stress => "Stress can be overwhelming. Let's break it down - what's the main thing causing you stress right now?",
            SupportTopic::Positive => "That's wonderful to hear! It's important to celebrate the good moments. What made today special?",
            SupportTopic::General => "I'm here to listen and support you. Can you tell me more about what's on your mind?",
        }
    }
}

/// Detect the topic of a message
pub fn classify(message: &str) -> SupportTopic {
    let haystack = normalize(message);
    TOPIC_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| haystack.contains(kw)))
        .map(|(topic, _)| *topic)
        .unwrap_or(SupportTopic::General)
}

/// Build the reply for a message
pub fn respond(message: &str) -> SupportReply {
    let topic = classify(message);
    SupportReply {
        topic,
        text: topic.reply_text().to_string(),
    }
}
