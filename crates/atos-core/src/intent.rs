//! Question intent classification.
//!
//! The composer only answers a small fixed set of questions. Classification
//! sits behind [`IntentClassifier`] so the keyword matcher can be replaced
//! by a stricter parser without touching the composer.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref GAPS_PATTERN: Regex = Regex::new(
        r"(?i)\b(missing|gaps?|lacking|incomplete|what\s+(?:do\s+we|are\s+we)\s+(?:lack|need)|not\s+(?:captured|documented|recorded))\b"
    ).unwrap();

    static ref NEXT_ACTIONS_PATTERN: Regex = Regex::new(
        r"(?i)\b(next\s+(?:steps?|actions?|best\s+actions?)|what\s+should\s+(?:i|we)\s+do|what\s+now|to[\s-]?do|priorit(?:y|ies|ize))\b"
    ).unwrap();

    static ref EVIDENCE_PATTERN: Regex = Regex::new(
        r"(?i)\b(evidence|proof|prove|substantiate|support(?:ed|ing)?|documentation|photos?)\b"
    ).unwrap();
}

/// What a question is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// "What's missing?" surfaces every gap
    Gaps,
    /// "What should we do next?" surfaces the top recommendations
    NextActions,
    /// "What proves this?" surfaces the evidence behind the top items
    Evidence,
    /// Anything else gets the fixed refusal
    Unknown,
}

/// Maps free text to an [`Intent`].
pub trait IntentClassifier: Send + Sync {
    fn classify(&self, text: &str) -> Intent;
}

/// Keyword classifier over precompiled patterns.
///
/// Checked in order next actions, gaps, evidence; the first match wins.
/// "What do we need to do" asks for actions even though "what do we need"
/// alone asks for gaps.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordIntentClassifier;

impl KeywordIntentClassifier {
    pub fn new() -> Self {
        Self
    }
}

impl IntentClassifier for KeywordIntentClassifier {
    fn classify(&self, text: &str) -> Intent {
        if NEXT_ACTIONS_PATTERN.is_match(text) {
            Intent::NextActions
        } else if GAPS_PATTERN.is_match(text) {
            Intent::Gaps
        } else if EVIDENCE_PATTERN.is_match(text) {
            Intent::Evidence
        } else {
            Intent::Unknown
        }
    }
}
