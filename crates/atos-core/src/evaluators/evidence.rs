//! Evidence evaluator.
//!
//! **Question**: Is there enough verified evidence to substantiate the loss?
//!
//! | Condition | Severity |
//! |-----------|----------|
//! | No measurement-grade evidence | medium at INTAKE, high after |
//! | No context/wide evidence | medium at INTAKE, high after |
//! | Peril without corroborating tag | medium |
//! | Flagged evidence item | high, per item |
//! | Evidence awaiting verification | medium, aggregated |

use crate::snapshot::{CaseSnapshot, CaseStage, Peril, VerificationStatus};
use crate::trace::SourceRef;
use crate::types::{GuidanceKind, Module, RuleFamily, Severity};

use super::{stage, Findings};

/// Tags that mark measurement-grade evidence.
pub(crate) const MEASUREMENT_TAGS: &[&str] = &["measurement", "measure", "dimensions"];

/// Tags that mark context or wide shots.
pub(crate) const CONTEXT_TAGS: &[&str] = &["context", "wide", "overview"];

pub(crate) fn evaluate(snapshot: &CaseSnapshot, findings: &mut Findings) {
    completeness(snapshot, findings);
    if let Some(peril) = snapshot.event_type {
        corroboration(snapshot, peril, findings);
    }
    verification(snapshot, findings);
    stage::evaluate(Module::Evidence, snapshot, findings);
}

fn gap_severity(stage: CaseStage) -> Severity {
    if stage > CaseStage::Intake {
        Severity::High
    } else {
        Severity::Medium
    }
}

fn completeness(snapshot: &CaseSnapshot, findings: &mut Findings) {
    let total = snapshot.evidence.len();
    let severity = gap_severity(snapshot.stage);

    if !snapshot.evidence.iter().any(|e| e.has_any_tag(MEASUREMENT_TAGS)) {
        let item = findings
            .item(RuleFamily::Evidence, "missing-measurement")
            .kind(GuidanceKind::Gap)
            .severity(severity)
            .title("No measurement-grade evidence captured")
            .why(format!(
                "{} evidence item(s) on record at stage {}, none tagged as measurement. \
                 Quantities in the scope cannot be substantiated without it.",
                total, snapshot.stage
            ))
            .recommend(
                "Capture measurement-grade evidence (tape or laser measurements, roof \
                 diagrams) for each damaged area and tag it as measurement.",
            )
            .source(SourceRef::count("evidence", total))
            .source(SourceRef::value("stage", snapshot.stage))
            .build();
        findings.push(item);
    }

    if !snapshot.evidence.iter().any(|e| e.has_any_tag(CONTEXT_TAGS)) {
        let item = findings
            .item(RuleFamily::Evidence, "missing-context")
            .kind(GuidanceKind::Gap)
            .severity(severity)
            .title("No context or wide shots captured")
            .why(format!(
                "{} evidence item(s) on record at stage {}, none tagged as context or wide. \
                 Close-ups cannot be located on the property without them.",
                total, snapshot.stage
            ))
            .recommend(
                "Capture wide context shots of each elevation and affected area so \
                 close-up evidence can be placed on the property.",
            )
            .source(SourceRef::count("evidence", total))
            .source(SourceRef::value("stage", snapshot.stage))
            .build();
        findings.push(item);
    }
}

fn corroboration(snapshot: &CaseSnapshot, peril: Peril, findings: &mut Findings) {
    let wanted = peril.corroborating_tags();
    if wanted.is_empty() {
        return;
    }
    if snapshot.evidence.iter().any(|e| e.has_any_tag(wanted)) {
        return;
    }

    let item = findings
        .item(RuleFamily::Evidence, &format!("uncorroborated-{}", peril.as_str()))
        .kind(GuidanceKind::Gap)
        .severity(Severity::Medium)
        .title(format!("No {} damage corroboration in evidence", peril.as_str()))
        .why(format!(
            "The loss event is recorded as {}, but none of the {} evidence item(s) carry \
             a {} tag. The carrier can attribute the damage to another cause.",
            peril.as_str(),
            snapshot.evidence.len(),
            wanted.join("/")
        ))
        .recommend(format!(
            "Capture and tag evidence specific to {} damage ({}).",
            peril.as_str(),
            wanted.join(", ")
        ))
        .source(SourceRef::value("eventType", peril))
        .source(SourceRef::count("evidence", snapshot.evidence.len()))
        .build();
    findings.push(item);
}

fn verification(snapshot: &CaseSnapshot, findings: &mut Findings) {
    for (idx, evidence) in snapshot.evidence.iter().enumerate() {
        if evidence.verification != VerificationStatus::Flagged {
            continue;
        }
        let captured_by = evidence
            .captured_by
            .as_deref()
            .map(|who| format!(" captured by {}", who))
            .unwrap_or_default();
        let mut builder = findings
            .item(RuleFamily::Evidence, &format!("flagged-{}", evidence.id))
            .kind(GuidanceKind::Risk)
            .severity(Severity::High)
            .title(format!("Evidence {} is flagged", evidence.id))
            .why(format!(
                "Evidence {}{} failed verification. Flagged items weaken every \
                 finding that relies on them.",
                evidence.id, captured_by
            ))
            .recommend(format!(
                "Review evidence {} and either re-capture it or document why the flag \
                 is cleared before relying on it.",
                evidence.id
            ))
            .source(SourceRef::value(format!("evidence[{}].id", idx), &evidence.id))
            .source(SourceRef::value(
                format!("evidence[{}].verification", idx),
                evidence.verification,
            ));
        if let Some(who) = &evidence.captured_by {
            builder = builder.source(SourceRef::value(format!("evidence[{}].capturedBy", idx), who));
        }
        findings.push(builder.build());
    }

    let pending: Vec<(usize, &str)> = snapshot
        .evidence
        .iter()
        .enumerate()
        .filter(|(_, e)| e.verification == VerificationStatus::Pending)
        .map(|(idx, e)| (idx, e.id.as_str()))
        .collect();
    if pending.is_empty() {
        return;
    }

    let ids: Vec<&str> = pending.iter().map(|(_, id)| *id).collect();
    let mut builder = findings
        .item(RuleFamily::Evidence, "pending-verification")
        .kind(GuidanceKind::Gap)
        .severity(Severity::Medium)
        .title(format!("{} evidence item(s) awaiting verification", pending.len()))
        .why(format!(
            "Unverified evidence ({}) cannot be cited to the carrier with confidence.",
            ids.join(", ")
        ))
        .recommend("Complete verification of pending evidence before it is cited in the claim.");
    for (idx, id) in &pending {
        builder = builder.source(SourceRef::value(format!("evidence[{}].id", idx), id));
    }
    findings.push(builder.build());
}
