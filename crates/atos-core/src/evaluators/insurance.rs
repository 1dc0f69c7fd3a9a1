//! Insurance evaluator.
//!
//! **Question**: Is the claim on record, reconciled line by line, and
//! recovering what was claimed?
//!
//! Discrepancy severity follows the delta ratio (`delta / submitted`):
//!
//! | Ratio | Severity |
//! |-------|----------|
//! | < 10% | low (informational) |
//! | 10% – 25% | medium |
//! | > 25% | high |
//! | ≥ 50% | critical |

use crate::snapshot::{CaseSnapshot, CaseStage, ClaimRecord};
use crate::thresholds::Thresholds;
use crate::trace::{format_percent, format_usd, SourceRef};
use crate::types::{GuidanceKind, Module, RuleFamily, Severity};

use super::{stage, Findings};

pub(crate) fn evaluate(snapshot: &CaseSnapshot, thresholds: &Thresholds, findings: &mut Findings) {
    match &snapshot.claim {
        Some(claim) => {
            adjuster(claim, findings);
            stage::evaluate(Module::Insurance, snapshot, findings);
            discrepancies(claim, thresholds, findings);
            recovery(claim, thresholds, findings);
        }
        None => {
            missing_claim(snapshot, findings);
            stage::evaluate(Module::Insurance, snapshot, findings);
        }
    }
}

fn missing_claim(snapshot: &CaseSnapshot, findings: &mut Findings) {
    if snapshot.stage < CaseStage::Claim {
        return;
    }
    let item = findings
        .item(RuleFamily::Evidence, "no-claim")
        .kind(GuidanceKind::Gap)
        .severity(Severity::High)
        .title("No claim on record")
        .why(format!(
            "Case {} is at stage {} but no claim has been recorded, so carrier \
             positions and payments cannot be tracked.",
            snapshot.case_id, snapshot.stage
        ))
        .recommend(
            "Record the claim with carrier, policy number, status and claimed amount \
             before scope reconciliation begins.",
        )
        .source(SourceRef::absent("claim"))
        .source(SourceRef::value("caseId", &snapshot.case_id))
        .source(SourceRef::value("stage", snapshot.stage))
        .build();
    findings.push(item);
}

fn adjuster(claim: &ClaimRecord, findings: &mut Findings) {
    if claim.adjuster.is_some() {
        return;
    }
    let item = findings
        .item(RuleFamily::Evidence, "no-adjuster")
        .kind(GuidanceKind::Gap)
        .severity(Severity::Low)
        .title("No adjuster contact on the claim")
        .why(format!(
            "The {} claim under policy {} has no adjuster contact, so follow-ups have \
             no named counterpart.",
            claim.carrier, claim.policy_number
        ))
        .recommend(format!(
            "Request the assigned adjuster's name and contact details from {}.",
            claim.carrier
        ))
        .source(SourceRef::absent("claim.adjuster"))
        .source(SourceRef::value("claim.carrier", &claim.carrier))
        .source(SourceRef::value("claim.policyNumber", &claim.policy_number))
        .build();
    findings.push(item);
}

fn discrepancies(claim: &ClaimRecord, thresholds: &Thresholds, findings: &mut Findings) {
    for (idx, line) in claim.scope_discrepancies.iter().enumerate() {
        let delta = line.delta_usd();
        if delta <= 0.0 {
            continue;
        }
        let Some(ratio) = line.delta_ratio() else {
            continue;
        };

        let pointer = format!("claim.scopeDiscrepancies[{}]", idx);
        let rationale = line
            .rationale
            .as_deref()
            .map(|r| format!(" Submitted rationale: {}", r))
            .unwrap_or_default();

        let mut builder = findings
            .item(RuleFamily::Discrepancy, &line.id)
            .kind(GuidanceKind::Risk)
            .severity(thresholds.discrepancy_severity(ratio))
            .title(format!("Scope discrepancy on {}", line.line_item))
            .why(format!(
                "Line {} ({}) was submitted at {} and valued by the carrier at {}, \
                 a delta of {} ({} of the submitted value).",
                line.id,
                line.line_item,
                format_usd(line.submitted_usd),
                format_usd(line.carrier_usd),
                format_usd(delta),
                format_percent(ratio)
            ))
            .recommend(format!(
                "Reconcile line {} with the adjuster: document the {} difference with \
                 measurements and pricing support.{}",
                line.id,
                format_usd(delta),
                rationale
            ))
            .source(SourceRef::value(format!("{}.id", pointer), &line.id))
            .source(SourceRef::value(format!("{}.lineItem", pointer), &line.line_item))
            .source(SourceRef::value(
                format!("{}.submittedUsd", pointer),
                line.submitted_usd,
            ))
            .source(SourceRef::value(format!("{}.carrierUsd", pointer), line.carrier_usd));
        if let Some(r) = &line.rationale {
            builder = builder.source(SourceRef::value(format!("{}.rationale", pointer), r));
        }
        findings.push(builder.build());
    }
}

fn recovery(claim: &ClaimRecord, thresholds: &Thresholds, findings: &mut Findings) {
    let Some(claimed) = claim.claimed_usd.filter(|c| *c > 0.0) else {
        return;
    };
    // Paid wins; approved stands in until payment lands.
    let (recovered, field) = match (claim.paid_usd, claim.approved_usd) {
        (Some(paid), _) => (paid, "paidUsd"),
        (None, Some(approved)) => (approved, "approvedUsd"),
        (None, None) => return,
    };
    let ratio = recovered / claimed;
    if !thresholds.is_recovery_gap(ratio) {
        return;
    }

    let label = if field == "paidUsd" { "paid" } else { "approved" };
    let item = findings
        .item(RuleFamily::Recovery, "recovery-gap")
        .kind(GuidanceKind::Opportunity)
        .severity(Severity::Medium)
        .title("Recovery gap against the claimed amount")
        .why(format!(
            "{} of {} claimed has been {} ({}), leaving {} unrecovered.",
            format_usd(recovered),
            format_usd(claimed),
            label,
            format_percent(ratio),
            format_usd(claimed - recovered)
        ))
        .recommend(format!(
            "Reconcile the submitted rationale against {}'s valuation and pursue the \
             {} gap through supplement or appraisal.",
            claim.carrier,
            format_usd(claimed - recovered)
        ))
        .source(SourceRef::value("claim.claimedUsd", claimed))
        .source(SourceRef::value(format!("claim.{}", field), recovered))
        .source(SourceRef::value("claim.carrier", &claim.carrier))
        .build();
    findings.push(item);
}
