//! Prompts for the conversational adapter.
//!
//! The system message is assembled in a fixed order:
//! 1. Persona and rules (shared by every module)
//! 2. Module addendum
//! 3. Serialized case snapshot
//! 4. Deterministic engine findings
//!
//! Conversation history and the user's message follow as separate turns.

use std::fmt::Write as _;

use atos_core::{CaseSnapshot, GuidanceItem, Module};

use crate::providers::{ChatMessage, Role};

/// Persona shared by every module.
pub const PERSONA_PROMPT: &str = r#"
You are ATOS, a guidance assistant for property-damage and insurance-claim cases.

You reason ONLY from the case snapshot and engine findings supplied below.
You do not invent facts, amounts, dates, parties, or documents.
You do not give legal advice or predict carrier decisions.

## Rules
1. Every dollar figure you write must appear in the snapshot or the findings
2. If the record does not answer the question, say what is missing and how to capture it
3. Lead with the most severe finding
4. Keep recommendations concrete: who acts, on what, by when if known

## Output Format
- One or two short paragraphs of explanation
- Flag notable items inline with "Risk:", "Opportunity:" or "Gap:"
- End with a numbered list of next actions (at most 5)
"#;

pub const PROPERTY_PROMPT: &str = r#"
## Module: Property

Focus on the property profile, inspection coverage and the recorded
condition of the asset. Call out inspections that are missing, stale, or
that found severe damage without follow-up.
"#;

pub const EVIDENCE_PROMPT: &str = r#"
## Module: Evidence

Focus on whether the evidence set is complete and verified: measurements,
contextual photos, peril corroboration and verification status. Name the
specific evidence that would close each gap.
"#;

pub const INSURANCE_PROMPT: &str = r#"
## Module: Insurance

Focus on the claim: carrier, adjuster contact, scope discrepancies between
submitted and carrier-approved line items, and how much of the claimed
amount has been recovered. Quote discrepancy amounts exactly as the
findings state them.
"#;

pub const CONTRACTOR_PROMPT: &str = r#"
## Module: Contractor

Focus on contractor compliance (insurance certificates, licenses) and
execution of scope assignments: blocked work, unverified progress and
quality risk. Never recommend new scope for a contractor with lapsed
compliance.
"#;

pub const EQUITY_PROMPT: &str = r#"
## Module: Equity

Focus on pre-loss and post-repair value, total claim payout and cost of
repair. Explain value gained or lost using only the recorded figures.
"#;

pub fn get_module_prompt(module: Module) -> &'static str {
    match module {
        Module::Property => PROPERTY_PROMPT,
        Module::Evidence => EVIDENCE_PROMPT,
        Module::Insurance => INSURANCE_PROMPT,
        Module::Contractor => CONTRACTOR_PROMPT,
        Module::Equity => EQUITY_PROMPT,
    }
}

/// Render ranked findings as a bulleted block.
pub fn render_findings(ranked: &[GuidanceItem]) -> String {
    if ranked.is_empty() {
        return "No engine findings.".to_string();
    }
    let mut out = String::new();
    for item in ranked {
        let _ = writeln!(
            out,
            "- [{}] {}: {} Recommendation: {}",
            item.severity, item.title, item.why_this_matters, item.recommendation
        );
    }
    out
}

/// Build the system prompt for one module.
pub fn build_system_prompt(module: Module, snapshot: &CaseSnapshot, ranked: &[GuidanceItem]) -> String {
    let snapshot_json = serde_json::to_string_pretty(&snapshot.to_value()).unwrap_or_default();
    format!(
        "{}\n{}\n## Case Snapshot\n```json\n{}\n```\n\n## Engine Findings (ranked)\n{}",
        PERSONA_PROMPT.trim_start(),
        get_module_prompt(module).trim_start(),
        snapshot_json,
        render_findings(ranked)
    )
}

/// Full message list for one completion.
pub fn build_messages(
    module: Module,
    snapshot: &CaseSnapshot,
    ranked: &[GuidanceItem],
    history: &[ChatMessage],
    message: &str,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(build_system_prompt(module, snapshot, ranked)));
    messages.extend(history.iter().filter(|m| m.role != Role::System).cloned());
    messages.push(ChatMessage::user(message));
    messages
}
