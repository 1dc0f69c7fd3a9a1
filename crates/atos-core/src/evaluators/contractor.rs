//! Contractor evaluator.
//!
//! **Question**: Can the assigned contractors keep working, and is their
//! progress verified?
//!
//! Compliance records that are expiring (high) or expired (critical) block
//! new scope. Execution rules cover blocked assignments, progress without
//! verification evidence, and high quality-risk work.

use crate::snapshot::{
    AssignmentStatus, CaseSnapshot, ComplianceStatus, QualityRisk, ScopeAssignment,
};
use crate::trace::SourceRef;
use crate::types::{GuidanceKind, Module, RuleFamily, Severity};

use super::{stage, Findings};

pub(crate) fn evaluate(snapshot: &CaseSnapshot, findings: &mut Findings) {
    stage::evaluate(Module::Contractor, snapshot, findings);
    compliance(snapshot, findings);
    for (idx, assignment) in snapshot.scope_assignments.iter().enumerate() {
        execution(snapshot, idx, assignment, findings);
    }
}

fn compliance(snapshot: &CaseSnapshot, findings: &mut Findings) {
    for (c_idx, contractor) in snapshot.contractors.iter().enumerate() {
        for (r_idx, record) in contractor.compliance.iter().enumerate() {
            let severity = match record.status {
                ComplianceStatus::Valid => continue,
                ComplianceStatus::Expiring => Severity::High,
                ComplianceStatus::Expired => Severity::Critical,
            };
            let category = record.category.to_lowercase();
            let pointer = format!("contractors[{}].compliance[{}]", c_idx, r_idx);

            let window = match (record.status, record.days_remaining) {
                (ComplianceStatus::Expiring, Some(days)) => format!(" and expires in {} day(s)", days),
                (ComplianceStatus::Expired, _) => " and has lapsed".to_string(),
                _ => String::new(),
            };

            let mut builder = findings
                .item(
                    RuleFamily::Compliance,
                    &format!("{}-{}", contractor.id, record.category_slug()),
                )
                .kind(GuidanceKind::Risk)
                .severity(severity)
                .title(format!(
                    "{} {} certificate is {}",
                    contractor.name,
                    record.category,
                    record.status.as_str()
                ))
                .why(format!(
                    "{}'s {} record is {}{}. Work performed without valid coverage \
                     exposes the owner and can void the scope.",
                    contractor.name,
                    category,
                    record.status.as_str(),
                    window
                ))
                .recommend(format!(
                    "Suspend new scope assignments to {} until the {} certificate is \
                     renewed; request the renewal now.",
                    contractor.name, category
                ))
                .source(SourceRef::value(format!("contractors[{}].name", c_idx), &contractor.name))
                .source(SourceRef::value(format!("{}.category", pointer), &record.category))
                .source(SourceRef::value(format!("{}.status", pointer), record.status));
            if let Some(days) = record.days_remaining {
                builder = builder.source(SourceRef::value(format!("{}.daysRemaining", pointer), days));
            }
            findings.push(builder.build());
        }
    }
}

fn execution(
    snapshot: &CaseSnapshot,
    idx: usize,
    assignment: &ScopeAssignment,
    findings: &mut Findings,
) {
    let pointer = format!("scopeAssignments[{}]", idx);
    let who = snapshot
        .contractor(&assignment.contractor_id)
        .map(|c| c.name.as_str())
        .unwrap_or(assignment.contractor_id.as_str());

    if assignment.status == AssignmentStatus::Blocked {
        let blocker = assignment
            .blocker
            .as_deref()
            .map(|b| format!(": {}", b))
            .unwrap_or_default();
        let ask = match &assignment.blocker_owner {
            Some(owner) => format!(
                "Escalate to {} to clear the blocker on {} and confirm a restart date.",
                owner, assignment.scope
            ),
            None => format!(
                "Escalate the blocker on {} and name an owner accountable for clearing it.",
                assignment.scope
            ),
        };
        let mut builder = findings
            .item(RuleFamily::Execution, &format!("blocked-{}", assignment.id))
            .kind(GuidanceKind::Risk)
            .severity(Severity::High)
            .title(format!("{} is blocked", assignment.scope))
            .why(format!(
                "Assignment {} ({}) for {} is blocked{}. Idle scope extends the loss \
                 period and carrying costs.",
                assignment.id, assignment.scope, who, blocker
            ))
            .recommend(ask)
            .source(SourceRef::value(format!("{}.id", pointer), &assignment.id))
            .source(SourceRef::value(format!("{}.scope", pointer), &assignment.scope))
            .source(SourceRef::value(format!("{}.status", pointer), assignment.status));
        if let Some(b) = &assignment.blocker {
            builder = builder.source(SourceRef::value(format!("{}.blocker", pointer), b));
        }
        if let Some(owner) = &assignment.blocker_owner {
            builder = builder.source(SourceRef::value(format!("{}.blockerOwner", pointer), owner));
        }
        findings.push(builder.build());
    }

    if assignment.progress_percent > 0 && assignment.verification_links == 0 {
        let item = findings
            .item(RuleFamily::Execution, &format!("unverified-{}", assignment.id))
            .kind(GuidanceKind::Gap)
            .severity(Severity::Medium)
            .title(format!("{} progress is unverified", assignment.scope))
            .why(format!(
                "{} reports {}% progress on {} with no linked verification evidence.",
                who, assignment.progress_percent, assignment.scope
            ))
            .recommend(format!(
                "Link photo or inspection evidence for the {}% reported on {} before \
                 approving the next draw.",
                assignment.progress_percent, assignment.scope
            ))
            .source(SourceRef::value(format!("{}.scope", pointer), &assignment.scope))
            .source(SourceRef::value(
                format!("{}.progressPercent", pointer),
                assignment.progress_percent,
            ))
            .source(SourceRef::value(
                format!("{}.verificationLinks", pointer),
                assignment.verification_links,
            ))
            .build();
        findings.push(item);
    }

    if assignment.quality_risk == QualityRisk::High {
        let item = findings
            .item(RuleFamily::Execution, &format!("quality-{}", assignment.id))
            .kind(GuidanceKind::Risk)
            .severity(Severity::Medium)
            .title(format!("{} carries high quality risk", assignment.scope))
            .why(format!(
                "Assignment {} for {} is rated high quality risk; defects found after \
                 close-out are harder to recover.",
                assignment.id, who
            ))
            .recommend(format!(
                "Schedule a quality inspection of {} before the next milestone is accepted.",
                assignment.scope
            ))
            .source(SourceRef::value(format!("{}.id", pointer), &assignment.id))
            .source(SourceRef::value(format!("{}.scope", pointer), &assignment.scope))
            .source(SourceRef::value(
                format!("{}.qualityRisk", pointer),
                assignment.quality_risk,
            ))
            .build();
        findings.push(item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluators::{evaluate, fixtures};
    use crate::snapshot::{CaseStage, ComplianceRecord, ContractorRecord};

    fn contractor(status: ComplianceStatus, days: Option<i64>) -> ContractorRecord {
        ContractorRecord {
            id: "ctr-1".to_string(),
            name: "Summit Roofing".to_string(),
            compliance: vec![ComplianceRecord {
                category: "General Liability".to_string(),
                expires_on: None,
                status,
                days_remaining: days,
            }],
        }
    }

    fn assignment(status: AssignmentStatus, progress: u8, links: u32) -> ScopeAssignment {
        ScopeAssignment {
            id: "sa-1".to_string(),
            contractor_id: "ctr-1".to_string(),
            scope: "Roof replacement".to_string(),
            status,
            progress_percent: progress,
            verification_links: links,
            quality_risk: QualityRisk::Low,
            blocker: None,
            blocker_owner: None,
        }
    }

    #[test]
    fn test_expiring_general_liability() {
        let mut snapshot = fixtures::quiet(CaseStage::Outcome);
        snapshot.contractors = vec![contractor(ComplianceStatus::Expiring, Some(15))];
        let items = evaluate(Module::Contractor, &snapshot);
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert!(matches!(item.severity, Severity::High | Severity::Critical));
        assert!(item.recommendation.contains("general liability"));
        assert!(item.recommendation.contains("renew"));
        assert!(item.why_this_matters.contains("15 day"));
        assert_eq!(item.id, "contractor.compliance.ctr-1-general-liability");
    }

    #[test]
    fn test_expired_is_critical() {
        let mut snapshot = fixtures::quiet(CaseStage::Outcome);
        snapshot.contractors = vec![contractor(ComplianceStatus::Expired, None)];
        let items = evaluate(Module::Contractor, &snapshot);
        assert_eq!(items[0].severity, Severity::Critical);
    }

    #[test]
    fn test_blocked_assignment_requests_owner() {
        let mut snapshot = fixtures::quiet(CaseStage::Outcome);
        snapshot.contractors = vec![contractor(ComplianceStatus::Valid, None)];
        snapshot.scope_assignments = vec![assignment(AssignmentStatus::Blocked, 0, 0)];
        let items = evaluate(Module::Contractor, &snapshot);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].severity, Severity::High);
        assert!(items[0].recommendation.contains("name an owner"));
        assert!(items[0].why_this_matters.contains("Summit Roofing"));

        snapshot.scope_assignments[0].blocker_owner = Some("D. Patel".to_string());
        let items = evaluate(Module::Contractor, &snapshot);
        assert!(items[0].recommendation.contains("D. Patel"));
    }

    #[test]
    fn test_progress_without_verification() {
        let mut snapshot = fixtures::quiet(CaseStage::Outcome);
        snapshot.scope_assignments = vec![assignment(AssignmentStatus::InProgress, 40, 0)];
        let items = evaluate(Module::Contractor, &snapshot);
        assert_eq!(items[0].id, "contractor.execution.unverified-sa-1");
        assert!(items[0].recommendation.contains("40%"));

        snapshot.scope_assignments[0].verification_links = 3;
        let items = evaluate(Module::Contractor, &snapshot);
        assert_eq!(items[0].family, RuleFamily::Fallback);
    }

    #[test]
    fn test_compliance_precedes_execution_and_stage_leads() {
        let mut snapshot = fixtures::quiet(CaseStage::Execution);
        snapshot.contractors = vec![contractor(ComplianceStatus::Expiring, Some(3))];
        let mut risky = assignment(AssignmentStatus::InProgress, 10, 1);
        risky.quality_risk = QualityRisk::High;
        snapshot.scope_assignments = vec![risky];
        let items = evaluate(Module::Contractor, &snapshot);
        let families: Vec<_> = items.iter().map(|i| i.family).collect();
        assert_eq!(
            families,
            vec![RuleFamily::Stage, RuleFamily::Compliance, RuleFamily::Execution]
        );
    }
}
