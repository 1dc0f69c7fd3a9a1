//! Deterministic fallback responses.
//!
//! Built from the engine's ranked guidance and the narrative composer, so
//! the same snapshot and message always produce the same reply.

use serde::{Deserialize, Serialize};
use std::fmt;

use atos_core::narrative::MAX_NEXT_ACTIONS;
use atos_core::{Composer, GuidanceItem, GuidanceKind};

use crate::adapter::{ConversationalResponse, ResponseConfidence, ResponseSource};
use crate::extraction::{InsightMarker, MAX_INSIGHTS};

/// Why the adapter served deterministic guidance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// No credential configured; an expected state
    NotConfigured,
    ProviderError,
    Timeout,
    EmptyCompletion,
    /// Generated text quoted figures absent from the case
    Ungrounded,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FallbackReason::NotConfigured => "not_configured",
            FallbackReason::ProviderError => "provider_error",
            FallbackReason::Timeout => "timeout",
            FallbackReason::EmptyCompletion => "empty_completion",
            FallbackReason::Ungrounded => "ungrounded",
        };
        f.write_str(s)
    }
}

/// Compose the deterministic reply for already-ranked guidance.
pub fn fallback_response(
    composer: &Composer,
    ranked: &[GuidanceItem],
    message: &str,
    reason: FallbackReason,
) -> ConversationalResponse {
    let question = Some(message.trim()).filter(|m| !m.is_empty());
    let narrative = composer.compose(ranked, question);

    let insights = ranked
        .iter()
        .filter(|item| item.kind != GuidanceKind::Action)
        .take(MAX_INSIGHTS)
        .map(|item| InsightMarker {
            kind: item.kind,
            text: item.title.clone(),
        })
        .collect();

    let actions = if ranked.is_empty() {
        vec![narrative.recommendation.clone()]
    } else {
        ranked
            .iter()
            .take(MAX_NEXT_ACTIONS)
            .map(|item| item.recommendation.clone())
            .collect()
    };

    ConversationalResponse {
        message: narrative.to_text(),
        insights,
        actions,
        confidence: ResponseConfidence::Low,
        source: ResponseSource::Fallback,
        fallback_reason: Some(reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atos_core::narrative::INSUFFICIENT_DATA_NEXT_ACTION;
    use atos_core::{generate_guidance, CaseSnapshot, Module};

    fn ranked() -> Vec<GuidanceItem> {
        let snapshot = CaseSnapshot::from_json(
            r#"{
                "caseId": "case-3",
                "stage": "EXECUTION",
                "property": {"id": "p-3", "name": "Oak Terrace"},
                "contractors": [{
                    "id": "ctr-9",
                    "name": "Apex Restoration",
                    "compliance": [{"category": "Workers Comp", "status": "expired", "daysRemaining": 0}]
                }]
            }"#,
        )
        .unwrap();
        generate_guidance(Module::Contractor, &snapshot)
    }

    #[test]
    fn test_fallback_is_low_confidence_and_tagged() {
        let response = fallback_response(&Composer::new(), &ranked(), "", FallbackReason::Timeout);
        assert_eq!(response.confidence, ResponseConfidence::Low);
        assert_eq!(response.source, ResponseSource::Fallback);
        assert_eq!(response.fallback_reason, Some(FallbackReason::Timeout));
        assert!(!response.message.is_empty());
    }

    #[test]
    fn test_fallback_leads_with_top_item() {
        let ranked = ranked();
        let response = fallback_response(&Composer::new(), &ranked, "", FallbackReason::NotConfigured);
        assert!(response.message.starts_with(&ranked[0].title));
        assert_eq!(response.actions[0], ranked[0].recommendation);
        assert!(response.actions.len() <= MAX_NEXT_ACTIONS);
        assert_eq!(response.insights[0].kind, GuidanceKind::Risk);
    }

    #[test]
    fn test_fallback_answers_question() {
        let response = fallback_response(
            &Composer::new(),
            &ranked(),
            "what should we do next?",
            FallbackReason::NotConfigured,
        );
        assert!(response.message.starts_with("Next actions:"));
    }

    #[test]
    fn test_fallback_with_no_items() {
        let response = fallback_response(&Composer::new(), &[], "anything", FallbackReason::NotConfigured);
        assert!(response.insights.is_empty());
        assert_eq!(response.actions, vec![INSUFFICIENT_DATA_NEXT_ACTION.to_string()]);
        assert!(!response.message.is_empty());
    }

    #[test]
    fn test_reason_display_matches_serde() {
        let json = serde_json::to_string(&FallbackReason::EmptyCompletion).unwrap();
        assert_eq!(json, format!("\"{}\"", FallbackReason::EmptyCompletion));
    }
}
