//! # atos-core
//!
//! Deterministic guidance engine for property-damage and insurance cases.
//!
//! Given a point-in-time [`CaseSnapshot`], this crate answers:
//! - What is missing from the case record?
//! - What is at risk, and how badly?
//! - What should happen next?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same snapshot always produces the same guidance
//! 2. **No LLM calls**: All evaluation is rule-based
//! 3. **Traceable**: Every item cites the snapshot fields it quotes
//! 4. **Never empty**: A module with nothing to report says so explicitly
//! 5. **Parallel-safe**: Module evaluators share no mutable state
//!
//! ## Example
//!
//! ```rust,ignore
//! use atos_core::{generate_guidance, CaseSnapshot, Module};
//!
//! let snapshot = CaseSnapshot::from_yaml_file("case.yaml")?;
//! for item in generate_guidance(Module::Insurance, &snapshot) {
//!     println!("[{}] {}: {}", item.severity, item.title, item.recommendation);
//! }
//! ```

pub mod evaluators;
pub mod insight;
pub mod intent;
pub mod narrative;
pub mod ranker;
pub mod snapshot;
pub mod thresholds;
pub mod trace;
pub mod types;

// Re-export main types at crate root
pub use evaluators::{evaluate, evaluate_all, evaluate_with, template_for, StageTemplate};
pub use insight::{raise_insights, Insight, InsightError};
pub use intent::{Intent, IntentClassifier, KeywordIntentClassifier};
pub use narrative::{Composer, NarrativeResponse};
pub use ranker::{rank, rank_all};
pub use snapshot::{CaseSnapshot, CaseStage, Peril, SnapshotError};
pub use thresholds::Thresholds;
pub use trace::{format_usd, Quote, SourceRef};
pub use types::{GuidanceItem, GuidanceKind, Module, RuleFamily, Severity, UnknownModule};

use thiserror::Error;

/// Errors surfaced by engine entry points that accept untyped input.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Insight error: {0}")]
    Insight(#[from] InsightError),

    #[error(transparent)]
    UnknownModule(#[from] UnknownModule),
}

/// Ranked guidance for one module.
///
/// This is the main entry point for the engine.
pub fn generate_guidance(module: Module, snapshot: &CaseSnapshot) -> Vec<GuidanceItem> {
    rank(evaluate(module, snapshot))
}

/// Ranked guidance across every module.
pub fn generate_all_guidance(snapshot: &CaseSnapshot, thresholds: &Thresholds) -> Vec<GuidanceItem> {
    rank_all(evaluate_all(snapshot, thresholds))
}

/// Deterministic narrative for one module, optionally answering a question.
pub fn generate_narrative(
    module: Module,
    snapshot: &CaseSnapshot,
    question: Option<&str>,
) -> NarrativeResponse {
    Composer::new().compose(&generate_guidance(module, snapshot), question)
}

/// Parse a JSON payload and produce ranked guidance.
///
/// # Arguments
///
/// * `module` - Module name, e.g. "insurance"
/// * `json` - Snapshot payload
pub fn generate_guidance_from_json(module: &str, json: &str) -> Result<Vec<GuidanceItem>, EngineError> {
    let module: Module = module.parse()?;
    let snapshot = CaseSnapshot::from_json(json)?;
    Ok(generate_guidance(module, &snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const HAIL_CASE: &str = r#"{
        "caseId": "case-204",
        "stage": "CLAIM",
        "eventType": "hail",
        "property": {
            "id": "prop-9",
            "name": "Cedar Ridge Apartments",
            "riskLevel": "high",
            "preLossValue": 6200000
        },
        "evidence": [],
        "claim": {
            "carrier": "Northwind Insurance",
            "policyNumber": "NW-5521",
            "status": "under_review",
            "claimedUsd": 1025000,
            "approvedUsd": 690000,
            "scopeDiscrepancies": [
                {
                    "id": "li-1",
                    "lineItem": "Roof replacement",
                    "submittedUsd": 1025000,
                    "carrierUsd": 690000,
                    "rationale": "Full tear-off required by code"
                },
                {
                    "id": "li-2",
                    "lineItem": "Gutters",
                    "submittedUsd": 40000,
                    "carrierUsd": 38000
                }
            ]
        },
        "contractors": [
            {
                "id": "ctr-1",
                "name": "Summit Roofing",
                "compliance": [
                    {"category": "General Liability", "status": "expiring", "daysRemaining": 15}
                ]
            }
        ]
    }"#;

    #[test]
    fn test_scope_discrepancy_scenario() {
        let items = generate_guidance_from_json("insurance", HAIL_CASE).unwrap();
        let big = items.iter().find(|i| i.id == "insurance.discrepancy.li-1").unwrap();
        assert!(matches!(big.severity, Severity::High | Severity::Critical));
        assert!(big.recommendation.contains("$335,000"));
        let small = items.iter().find(|i| i.id == "insurance.discrepancy.li-2").unwrap();
        assert_eq!(small.severity, Severity::Low);
    }

    #[test]
    fn test_discrepancy_amount_traces_to_line_item() {
        let snapshot = CaseSnapshot::from_json(HAIL_CASE).unwrap();
        let root = snapshot.to_value();
        let items = generate_guidance(Module::Insurance, &snapshot);
        let big = items.iter().find(|i| i.id == "insurance.discrepancy.li-1").unwrap();

        let read = |suffix: &str| {
            big.sources
                .iter()
                .find(|s| s.pointer.ends_with(suffix))
                .and_then(|s| s.resolve(&root))
                .and_then(|v| v.as_f64())
                .unwrap()
        };
        let delta = read("submittedUsd") - read("carrierUsd");
        assert!(big.recommendation.contains(&format_usd(delta)));
    }

    #[test]
    fn test_compliance_expiry_scenario() {
        let items = generate_guidance_from_json("contractor", HAIL_CASE).unwrap();
        let item = items.iter().find(|i| i.family == RuleFamily::Compliance).unwrap();
        assert!(matches!(item.severity, Severity::High | Severity::Critical));
        assert!(item.recommendation.contains("general liability"));
        assert!(item.recommendation.contains("renew"));
    }

    #[test]
    fn test_empty_evidence_scenario() {
        let items = generate_guidance_from_json("evidence", HAIL_CASE).unwrap();
        assert!(items.iter().any(|i| i.is_gap() && i.title.contains("measurement")));
        assert!(items.iter().any(|i| i.is_gap() && i.title.contains("context")));
    }

    #[test]
    fn test_stable_ranking_across_families() {
        // Two high gaps from the completeness rules, then a medium
        // corroboration gap; equal severities keep emission order.
        let snapshot = CaseSnapshot::from_json(HAIL_CASE).unwrap();
        let ranked = generate_guidance(Module::Evidence, &snapshot);
        let ids: Vec<&str> = ranked.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "evidence.evidence.missing-measurement",
                "evidence.evidence.missing-context",
                "evidence.evidence.uncorroborated-hail",
            ]
        );
    }

    #[test]
    fn test_stable_ranking_with_two_medium_families() {
        let snapshot = CaseSnapshot::from_json(HAIL_CASE).unwrap();
        let ranked = generate_guidance(Module::Insurance, &snapshot);
        let pos = |id: &str| ranked.iter().position(|i| i.id == id).unwrap();
        // Stage (medium) precedes recovery (medium) in emission and in rank.
        assert!(pos("insurance.stage.claim") < pos("insurance.recovery.recovery-gap"));
    }

    #[test]
    fn test_unknown_module_is_an_error() {
        let err = generate_guidance_from_json("payroll", HAIL_CASE).unwrap_err();
        assert!(matches!(err, EngineError::UnknownModule(_)));
    }

    #[test]
    fn test_narrative_for_module() {
        let snapshot = CaseSnapshot::from_json(HAIL_CASE).unwrap();
        let narrative = generate_narrative(Module::Insurance, &snapshot, None);
        assert_eq!(narrative.summary, "Scope discrepancy on Roof replacement");
    }

    #[test]
    fn test_all_guidance_is_ranked() {
        let snapshot = CaseSnapshot::from_json(HAIL_CASE).unwrap();
        let items = generate_all_guidance(&snapshot, &Thresholds::default());
        assert_eq!(items[0].severity, Severity::High);
        for pair in items.windows(2) {
            assert!(pair[0].severity.weight() >= pair[1].severity.weight());
        }
    }

    fn stage_strategy() -> impl Strategy<Value = CaseStage> {
        prop_oneof![
            Just(CaseStage::Intake),
            Just(CaseStage::Inspection),
            Just(CaseStage::Claim),
            Just(CaseStage::Execution),
            Just(CaseStage::Outcome),
        ]
    }

    fn snapshot_strategy() -> impl Strategy<Value = CaseSnapshot> {
        (
            stage_strategy(),
            prop::collection::vec((0.0f64..2_000_000.0, 0.0f64..2_000_000.0), 0..4),
            prop::option::of(0.0f64..2_000_000.0),
            any::<bool>(),
            0u8..=100,
        )
            .prop_map(|(stage, lines, paid, with_claim, progress)| {
                let json = serde_json::json!({
                    "caseId": "prop-case",
                    "stage": stage,
                    "property": {"id": "p", "name": "Generated Property"},
                    "claim": if with_claim {
                        serde_json::json!({
                            "carrier": "Carrier",
                            "policyNumber": "P-1",
                            "status": "submitted",
                            "claimedUsd": 1_000_000.0,
                            "paidUsd": paid,
                            "scopeDiscrepancies": lines.iter().enumerate().map(|(i, (s, c))| {
                                serde_json::json!({
                                    "id": format!("li-{}", i),
                                    "lineItem": "Line",
                                    "submittedUsd": s,
                                    "carrierUsd": c
                                })
                            }).collect::<Vec<_>>()
                        })
                    } else {
                        serde_json::Value::Null
                    },
                    "scopeAssignments": [{
                        "id": "sa-1",
                        "contractorId": "ctr-x",
                        "scope": "Drywall",
                        "status": "in_progress",
                        "progressPercent": progress
                    }]
                });
                CaseSnapshot::from_value(json).unwrap()
            })
    }

    proptest! {
        #[test]
        fn prop_guidance_is_never_empty(snapshot in snapshot_strategy()) {
            for module in Module::ALL {
                let items = generate_guidance(module, &snapshot);
                prop_assert!(!items.is_empty());
                for item in &items {
                    prop_assert!((0.0..=1.0).contains(&item.confidence_score));
                }
            }
        }

        #[test]
        fn prop_sources_verify(snapshot in snapshot_strategy()) {
            let root = snapshot.to_value();
            for module in Module::ALL {
                for item in evaluate(module, &snapshot) {
                    for source in &item.sources {
                        prop_assert!(source.verify(&root), "{} -> {}", item.id, source.pointer);
                    }
                }
            }
        }
    }
}
