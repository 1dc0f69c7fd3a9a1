//! Equity evaluator.
//!
//! **Question**: Did the claim and the repair preserve the property's value?

use crate::snapshot::{CaseSnapshot, CaseStage, EquityFigures};
use crate::thresholds::Thresholds;
use crate::trace::{format_percent, format_usd, SourceRef};
use crate::types::{GuidanceKind, RuleFamily, Severity};

use super::Findings;

pub(crate) fn evaluate(snapshot: &CaseSnapshot, thresholds: &Thresholds, findings: &mut Findings) {
    let Some(equity) = &snapshot.equity else {
        missing(snapshot, findings);
        return;
    };
    recovery(equity, thresholds, findings);
    value_loss(equity, findings);
}

fn missing(snapshot: &CaseSnapshot, findings: &mut Findings) {
    if snapshot.stage <= CaseStage::Claim {
        return;
    }
    let item = findings
        .item(RuleFamily::Evidence, "no-equity")
        .kind(GuidanceKind::Gap)
        .severity(Severity::Medium)
        .title("No equity figures recorded")
        .why(format!(
            "{} is at stage {} without pre/post values, payout or repair cost, so the \
             outcome of the claim cannot be measured.",
            snapshot.property.name, snapshot.stage
        ))
        .recommend(
            "Record pre-loss and post-repair values, claim total, payout and repair cost \
             for this case.",
        )
        .source(SourceRef::absent("equity"))
        .source(SourceRef::value("property.name", &snapshot.property.name))
        .source(SourceRef::value("stage", snapshot.stage))
        .build();
    findings.push(item);
}

fn recovery(equity: &EquityFigures, thresholds: &Thresholds, findings: &mut Findings) {
    let Some(ratio) = equity.recovery_ratio() else {
        return;
    };
    if !thresholds.is_recovery_gap(ratio) {
        return;
    }
    let shortfall = equity.claim_total - equity.payout;
    let item = findings
        .item(RuleFamily::Recovery, "payout-gap")
        .kind(GuidanceKind::Opportunity)
        .severity(Severity::Medium)
        .title("Payout trails the claim total")
        .why(format!(
            "Payout of {} covers {} of the {} claim total, a shortfall of {}.",
            format_usd(equity.payout),
            format_percent(ratio),
            format_usd(equity.claim_total),
            format_usd(shortfall)
        ))
        .recommend(format!(
            "Reconcile the claim rationale against the carrier valuation and pursue the \
             {} shortfall before the case closes.",
            format_usd(shortfall)
        ))
        .source(SourceRef::value("equity.payout", equity.payout))
        .source(SourceRef::value("equity.claimTotal", equity.claim_total))
        .build();
    findings.push(item);
}

fn value_loss(equity: &EquityFigures, findings: &mut Findings) {
    // Post minus pre, never derivedGain.
    let change = equity.post_value - equity.pre_value;
    if change >= 0.0 {
        return;
    }

    let item = findings
        .item(RuleFamily::Recovery, "value-loss")
        .kind(GuidanceKind::Risk)
        .severity(Severity::High)
        .title("Property value is below its pre-loss level")
        .why(format!(
            "Post-repair value {} against a pre-loss value of {} is a change of {}.",
            format_usd(equity.post_value),
            format_usd(equity.pre_value),
            format_usd(change)
        ))
        .recommend(
            "Commission a post-repair appraisal and document unrepaired or diminished-value \
             items for a supplemental claim.",
        )
        .source(SourceRef::value("equity.postValue", equity.post_value))
        .source(SourceRef::value("equity.preValue", equity.pre_value))
        .build();
    findings.push(item);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluators::{evaluate, fixtures};
    use crate::types::Module;

    #[test]
    fn test_missing_equity_after_claim() {
        let mut snapshot = fixtures::quiet(CaseStage::Claim);
        snapshot.equity = None;
        let items = evaluate(Module::Equity, &snapshot);
        assert_eq!(items[0].family, RuleFamily::Fallback);

        snapshot.stage = CaseStage::Execution;
        let items = evaluate(Module::Equity, &snapshot);
        assert_eq!(items[0].id, "equity.evidence.no-equity");
        assert_eq!(items[0].severity, Severity::Medium);
    }

    #[test]
    fn test_payout_gap_is_opportunity() {
        let mut snapshot = fixtures::quiet(CaseStage::Outcome);
        if let Some(equity) = snapshot.equity.as_mut() {
            equity.payout = 600_000.0;
        }
        let items = evaluate(Module::Equity, &snapshot);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind, GuidanceKind::Opportunity);
        assert!(items[0].why_this_matters.contains("60.0%"));
        assert!(items[0].recommendation.contains("$400,000"));
    }

    #[test]
    fn test_recovery_at_threshold_is_not_a_gap() {
        let mut snapshot = fixtures::quiet(CaseStage::Outcome);
        if let Some(equity) = snapshot.equity.as_mut() {
            equity.payout = 750_000.0;
        }
        let items = evaluate(Module::Equity, &snapshot);
        assert_eq!(items[0].family, RuleFamily::Fallback);

        if let Some(equity) = snapshot.equity.as_mut() {
            equity.payout = 749_000.0;
        }
        let items = evaluate(Module::Equity, &snapshot);
        assert_eq!(items[0].id, "equity.recovery.payout-gap");
        assert!(items[0].why_this_matters.contains("74.9%"));
    }

    #[test]
    fn test_negative_gain_is_high_risk() {
        let mut snapshot = fixtures::quiet(CaseStage::Outcome);
        if let Some(equity) = snapshot.equity.as_mut() {
            equity.post_value = 3_700_000.0;
        }
        let items = evaluate(Module::Equity, &snapshot);
        let risk = items.iter().find(|i| i.id == "equity.recovery.value-loss").unwrap();
        assert_eq!(risk.severity, Severity::High);
        assert!(risk.why_this_matters.contains("-$300,000"));
    }

    #[test]
    fn test_value_loss_ignores_disagreeing_derived_gain() {
        let mut snapshot = fixtures::quiet(CaseStage::Outcome);
        if let Some(equity) = snapshot.equity.as_mut() {
            equity.derived_gain = Some(-100_000.0);
        }
        let items = evaluate(Module::Equity, &snapshot);
        assert!(items.iter().all(|i| i.id != "equity.recovery.value-loss"));

        if let Some(equity) = snapshot.equity.as_mut() {
            equity.post_value = 3_700_000.0;
            equity.derived_gain = Some(50_000.0);
        }
        let items = evaluate(Module::Equity, &snapshot);
        let risk = items.iter().find(|i| i.id == "equity.recovery.value-loss").unwrap();
        assert!(risk.why_this_matters.contains("a change of -$300,000"));
        assert!(!risk.why_this_matters.contains("100,000"));
        assert!(!risk.why_this_matters.contains("50,000"));
    }
}
