//! Narrative composer.
//!
//! Turns ranked guidance plus an optional question into a readable answer.
//! Summary, why-this-matters and recommendation are copied verbatim from
//! the top-ranked item; the composer never writes a figure that is not
//! already in one of its input items.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use crate::intent::{Intent, IntentClassifier, KeywordIntentClassifier};
use crate::trace::Quote;
use crate::types::GuidanceItem;

/// Confidence reported when there is nothing to reason from.
pub const INSUFFICIENT_DATA_CONFIDENCE: f64 = 0.4;

pub const INSUFFICIENT_DATA_SUMMARY: &str = "Insufficient data to generate guidance.";

pub const INSUFFICIENT_DATA_WHY: &str =
    "No guidance items were produced for this case, so there is nothing to reason from.";

pub const INSUFFICIENT_DATA_NEXT_ACTION: &str =
    "Ingest additional inspections, claims and verifications, then re-run guidance.";

/// Fixed answer for questions outside the supported intents.
pub const REFUSAL: &str = "I can only reason from the evidence and structured facts captured \
                           for this case. Ask what is missing, what to do next, or what \
                           evidence supports the current guidance.";

/// Maximum recommendations surfaced for a next-actions question.
pub const MAX_NEXT_ACTIONS: usize = 3;

/// Composer output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeResponse {
    pub summary: String,

    pub why_this_matters: String,

    pub recommendation: String,

    pub confidence: f64,

    /// Present only when a question was asked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
}

impl NarrativeResponse {
    /// The fixed response for empty input.
    pub fn insufficient_data() -> Self {
        Self {
            summary: INSUFFICIENT_DATA_SUMMARY.to_string(),
            why_this_matters: INSUFFICIENT_DATA_WHY.to_string(),
            recommendation: INSUFFICIENT_DATA_NEXT_ACTION.to_string(),
            confidence: INSUFFICIENT_DATA_CONFIDENCE,
            answer: None,
            intent: None,
        }
    }

    /// Plain-text rendering used for chat replies.
    ///
    /// An answer, when present, leads; the primary item follows.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        if let Some(answer) = &self.answer {
            out.push_str(answer);
            out.push_str("\n\n");
        }
        let _ = write!(
            out,
            "{}\n\nWhy this matters: {}\n\nRecommendation: {}",
            self.summary, self.why_this_matters, self.recommendation
        );
        out
    }
}

/// Composes narratives from ranked guidance.
pub struct Composer {
    classifier: Box<dyn IntentClassifier>,
}

impl Composer {
    /// Composer with the keyword classifier.
    pub fn new() -> Self {
        Self::with_classifier(Box::new(KeywordIntentClassifier::new()))
    }

    pub fn with_classifier(classifier: Box<dyn IntentClassifier>) -> Self {
        Self { classifier }
    }

    /// Compose a response from already-ranked items.
    pub fn compose(&self, ranked: &[GuidanceItem], question: Option<&str>) -> NarrativeResponse {
        let Some(primary) = ranked.first() else {
            return NarrativeResponse::insufficient_data();
        };

        let mut response = NarrativeResponse {
            summary: primary.title.clone(),
            why_this_matters: primary.why_this_matters.clone(),
            recommendation: primary.recommendation.clone(),
            confidence: primary.confidence_score,
            answer: None,
            intent: None,
        };

        if let Some(question) = question.map(str::trim).filter(|q| !q.is_empty()) {
            let intent = self.classifier.classify(question);
            response.answer = Some(answer_for(intent, ranked));
            response.intent = Some(intent);
        }

        response
    }
}

impl Default for Composer {
    fn default() -> Self {
        Self::new()
    }
}

fn answer_for(intent: Intent, ranked: &[GuidanceItem]) -> String {
    match intent {
        Intent::Gaps => gaps(ranked),
        Intent::NextActions => next_actions(ranked),
        Intent::Evidence => evidence(ranked),
        Intent::Unknown => REFUSAL.to_string(),
    }
}

fn gaps(ranked: &[GuidanceItem]) -> String {
    let gaps: Vec<&GuidanceItem> = ranked.iter().filter(|i| i.is_gap()).collect();
    if gaps.is_empty() {
        return "No open gaps were found in the captured data.".to_string();
    }
    let mut out = format!("Open gaps ({}):", gaps.len());
    for item in gaps {
        let _ = write!(out, "\n- [{}] {}: {}", item.severity, item.title, item.recommendation);
    }
    out
}

fn next_actions(ranked: &[GuidanceItem]) -> String {
    let mut out = String::from("Next actions:");
    for (n, item) in ranked.iter().take(MAX_NEXT_ACTIONS).enumerate() {
        let _ = write!(out, "\n{}. {}", n + 1, item.recommendation);
    }
    out
}

fn evidence(ranked: &[GuidanceItem]) -> String {
    let mut out = String::from("Supporting facts from the case record:");
    for item in ranked.iter().take(MAX_NEXT_ACTIONS) {
        let _ = write!(out, "\n- {}", item.title);
        for source in &item.sources {
            let quoted = match &source.quote {
                Quote::Value(serde_json::Value::String(s)) => s.clone(),
                Quote::Value(v) => v.to_string(),
                Quote::Count(n) => format!("{} item(s)", n),
                Quote::Absent => "not recorded".to_string(),
            };
            let _ = write!(out, "\n    {}: {}", source.pointer, quoted);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::SourceRef;
    use crate::types::{GuidanceKind, Module, RuleFamily, Severity};

    fn item(id: &str, kind: GuidanceKind, severity: Severity) -> GuidanceItem {
        GuidanceItem {
            id: id.to_string(),
            module: Module::Evidence,
            family: RuleFamily::Evidence,
            kind,
            title: format!("Title {}", id),
            why_this_matters: format!("Why {}", id),
            recommendation: format!("Do {}", id),
            severity,
            confidence_score: 0.9,
            sources: vec![SourceRef::count("evidence", 0)],
        }
    }

    fn ranked() -> Vec<GuidanceItem> {
        vec![
            item("a", GuidanceKind::Risk, Severity::Critical),
            item("b", GuidanceKind::Gap, Severity::High),
            item("c", GuidanceKind::Action, Severity::Medium),
            item("d", GuidanceKind::Gap, Severity::Low),
        ]
    }

    #[test]
    fn test_empty_input_is_insufficient_data() {
        let composer = Composer::new();
        let response = composer.compose(&[], Some("what's missing?"));
        assert_eq!(response.confidence, 0.4);
        assert_eq!(response.summary, INSUFFICIENT_DATA_SUMMARY);
        assert!(response.recommendation.contains("inspections"));
        assert_eq!(response, composer.compose(&[], None));
    }

    #[test]
    fn test_primary_fields_copied_verbatim() {
        let items = ranked();
        let response = Composer::new().compose(&items, None);
        assert_eq!(response.summary, items[0].title);
        assert_eq!(response.why_this_matters, items[0].why_this_matters);
        assert_eq!(response.recommendation, items[0].recommendation);
        assert_eq!(response.confidence, items[0].confidence_score);
        assert!(response.answer.is_none());
    }

    #[test]
    fn test_gaps_question_lists_every_gap() {
        let response = Composer::new().compose(&ranked(), Some("What's missing?"));
        let answer = response.answer.unwrap();
        assert_eq!(response.intent, Some(Intent::Gaps));
        assert!(answer.contains("Title b"));
        assert!(answer.contains("Title d"));
        assert!(!answer.contains("Title a"));
    }

    #[test]
    fn test_next_actions_capped_at_three() {
        let response = Composer::new().compose(&ranked(), Some("next steps?"));
        let answer = response.answer.unwrap();
        assert!(answer.contains("1. Do a"));
        assert!(answer.contains("3. Do c"));
        assert!(!answer.contains("Do d"));
    }

    #[test]
    fn test_evidence_question_cites_sources() {
        let response = Composer::new().compose(&ranked(), Some("what proof supports this"));
        let answer = response.answer.unwrap();
        assert!(answer.contains("evidence: 0 item(s)"));
    }

    #[test]
    fn test_unknown_question_is_refused() {
        let response = Composer::new().compose(&ranked(), Some("Tell me a joke"));
        assert_eq!(response.answer.as_deref(), Some(REFUSAL));
        assert_eq!(response.summary, "Title a");
    }

    #[test]
    fn test_text_rendering_is_deterministic() {
        let composer = Composer::new();
        let a = composer.compose(&ranked(), Some("next steps")).to_text();
        let b = composer.compose(&ranked(), Some("next steps")).to_text();
        assert_eq!(a, b);
        assert!(a.starts_with("Next actions:"));
    }
}
