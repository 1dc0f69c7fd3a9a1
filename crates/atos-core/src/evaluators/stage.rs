//! Lifecycle-stage guidance.
//!
//! Each stage of INTAKE → INSPECTION → CLAIM → EXECUTION → OUTCOME owns one
//! template group. The engine never moves a case between stages; it only
//! reacts to the stage the snapshot reports. OUTCOME is terminal and has no
//! template.

use crate::snapshot::{CaseSnapshot, CaseStage};
use crate::trace::SourceRef;
use crate::types::{GuidanceKind, Module, RuleFamily, Severity};

use super::Findings;

/// Stage-specific recommendation template.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageTemplate {
    pub stage: CaseStage,

    /// Modules the template is surfaced in
    pub modules: &'static [Module],

    pub title: &'static str,

    pub why_this_matters: &'static str,

    pub recommendation: &'static str,
}

const INTAKE: StageTemplate = StageTemplate {
    stage: CaseStage::Intake,
    modules: &[Module::Property, Module::Evidence],
    title: "Intake: establish the evidentiary baseline",
    why_this_matters: "The case is at INTAKE. Everything decided later relies on what is \
                       captured before the first inspection.",
    recommendation: "Capture wide context shots and measurement-grade evidence of every \
                     affected area before scheduling the inspection.",
};

const INSPECTION: StageTemplate = StageTemplate {
    stage: CaseStage::Inspection,
    modules: &[Module::Property, Module::Evidence],
    title: "Inspection: run a structured damage checklist",
    why_this_matters: "The case is at INSPECTION. Unstructured findings are hard to defend \
                       once the claim is scoped.",
    recommendation: "Complete a structured damage checklist per elevation and damage \
                     category, recording chain-of-custody for each capture.",
};

const CLAIM: StageTemplate = StageTemplate {
    stage: CaseStage::Claim,
    modules: &[Module::Insurance],
    title: "Claim: reconcile the scope delta",
    why_this_matters: "The case is at CLAIM. Unreconciled scope differences become the \
                       carrier's number by default.",
    recommendation: "Reconcile every scope line item against the carrier estimate and \
                     attach a rationale to each contested difference.",
};

const EXECUTION: StageTemplate = StageTemplate {
    stage: CaseStage::Execution,
    modules: &[Module::Contractor],
    title: "Execution: verify progress against scope",
    why_this_matters: "The case is at EXECUTION. Progress that is not verified cannot be \
                       tied back to the approved scope.",
    recommendation: "Require verification evidence for each progress milestone before \
                     approving the next draw.",
};

/// The template group for a stage, if any.
pub fn template_for(stage: CaseStage) -> Option<&'static StageTemplate> {
    match stage {
        CaseStage::Intake => Some(&INTAKE),
        CaseStage::Inspection => Some(&INSPECTION),
        CaseStage::Claim => Some(&CLAIM),
        CaseStage::Execution => Some(&EXECUTION),
        CaseStage::Outcome => None,
    }
}

/// Emit the stage item for `module` if the current stage's group covers it.
pub(crate) fn evaluate(module: Module, snapshot: &CaseSnapshot, findings: &mut Findings) {
    let Some(template) = template_for(snapshot.stage) else {
        return;
    };
    if !template.modules.contains(&module) {
        return;
    }

    let item = findings
        .item(RuleFamily::Stage, &snapshot.stage.as_str().to_ascii_lowercase())
        .kind(GuidanceKind::Action)
        .severity(Severity::Medium)
        .title(template.title)
        .why(template.why_this_matters)
        .recommend(template.recommendation)
        .source(SourceRef::value("stage", snapshot.stage))
        .build();
    findings.push(item);
}
