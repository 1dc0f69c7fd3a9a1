//! Property evaluator.
//!
//! **Question**: Is the property's damage documented well enough to stand up?
//!
//! Checks inspection coverage, chain-of-custody, severe damage on high-risk
//! properties, and a missing pre-loss valuation.

use crate::snapshot::{CaseSnapshot, CaseStage, DamageSeverity, RiskLevel};
use crate::trace::{format_usd, SourceRef};
use crate::types::{GuidanceKind, Module, RuleFamily, Severity};

use super::{stage, Findings};

pub(crate) fn evaluate(snapshot: &CaseSnapshot, findings: &mut Findings) {
    inspections(snapshot, findings);
    severe_damage(snapshot, findings);
    valuation(snapshot, findings);
    stage::evaluate(Module::Property, snapshot, findings);
}

fn inspections(snapshot: &CaseSnapshot, findings: &mut Findings) {
    if snapshot.inspections.is_empty() {
        let severity = if snapshot.stage > CaseStage::Intake {
            Severity::High
        } else {
            Severity::Medium
        };
        let item = findings
            .item(RuleFamily::Evidence, "no-inspection")
            .kind(GuidanceKind::Gap)
            .severity(severity)
            .title("No inspection on record")
            .why(format!(
                "{} is at stage {} with no inspection recorded. Damage severity and cost \
                 are unsupported until one is.",
                snapshot.property.name, snapshot.stage
            ))
            .recommend("Schedule an inspection and record inspector, severity, damage categories and estimated cost.")
            .source(SourceRef::absent("inspections"))
            .source(SourceRef::value("property.name", &snapshot.property.name))
            .source(SourceRef::value("stage", snapshot.stage))
            .build();
        findings.push(item);
        return;
    }

    for (idx, inspection) in snapshot.inspections.iter().enumerate() {
        if inspection.chain_of_custody {
            continue;
        }
        let item = findings
            .item(RuleFamily::Evidence, &format!("custody-{}", inspection.id))
            .kind(GuidanceKind::Risk)
            .severity(Severity::Medium)
            .title(format!("Inspection {} lacks chain-of-custody", inspection.id))
            .why(format!(
                "Inspection {} by {} has no chain-of-custody record, so its findings can \
                 be challenged by the carrier.",
                inspection.id, inspection.inspector
            ))
            .recommend(format!(
                "Have {} attest chain-of-custody for inspection {} and attach the capture log.",
                inspection.inspector, inspection.id
            ))
            .source(SourceRef::value(format!("inspections[{}].id", idx), &inspection.id))
            .source(SourceRef::value(
                format!("inspections[{}].inspector", idx),
                &inspection.inspector,
            ))
            .source(SourceRef::value(
                format!("inspections[{}].chainOfCustody", idx),
                inspection.chain_of_custody,
            ))
            .build();
        findings.push(item);
    }
}

fn severe_damage(snapshot: &CaseSnapshot, findings: &mut Findings) {
    let Some(risk) = snapshot.property.risk_level else {
        return;
    };
    if risk < RiskLevel::High {
        return;
    }

    let worst = snapshot
        .inspections
        .iter()
        .enumerate()
        .filter(|(_, i)| i.severity >= DamageSeverity::Major)
        .max_by_key(|(_, i)| i.severity);
    let Some((idx, inspection)) = worst else {
        return;
    };

    let cost = inspection
        .estimated_cost
        .map(|c| format!(" with an estimated cost of {}", format_usd(c)))
        .unwrap_or_default();

    let mut builder = findings
        .item(RuleFamily::Evidence, "severe-damage")
        .kind(GuidanceKind::Risk)
        .severity(Severity::High)
        .title("Severe damage on a high-risk property")
        .why(format!(
            "Inspection {} rates the damage {}{} on a property carrying a {} risk level.",
            inspection.id,
            inspection.severity.as_str(),
            cost,
            risk.as_str()
        ))
        .recommend(
            "Prioritize mitigation and temporary protection, and escalate the case for \
             senior review before the claim is scoped.",
        )
        .source(SourceRef::value("property.riskLevel", risk))
        .source(SourceRef::value(format!("inspections[{}].id", idx), &inspection.id))
        .source(SourceRef::value(
            format!("inspections[{}].severity", idx),
            inspection.severity,
        ));
    if let Some(c) = inspection.estimated_cost {
        builder = builder.source(SourceRef::value(format!("inspections[{}].estimatedCost", idx), c));
    }
    findings.push(builder.build());
}

fn valuation(snapshot: &CaseSnapshot, findings: &mut Findings) {
    if snapshot.property.pre_loss_value.is_some() {
        return;
    }
    let item = findings
        .item(RuleFamily::Evidence, "no-valuation")
        .kind(GuidanceKind::Gap)
        .severity(Severity::Low)
        .title("No pre-loss valuation recorded")
        .why(format!(
            "{} has no pre-loss value, so equity impact cannot be measured later.",
            snapshot.property.name
        ))
        .recommend("Record a pre-loss valuation from the most recent appraisal or assessment.")
        .source(SourceRef::absent("property.preLossValue"))
        .source(SourceRef::value("property.name", &snapshot.property.name))
        .build();
    findings.push(item);
}
