//! Best-effort structure extraction from generated text.
//!
//! Nothing here fails: text that matches no pattern yields empty lists and
//! the caller still returns the raw message.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use atos_core::GuidanceKind;

/// Maximum extracted actions.
pub const MAX_ACTIONS: usize = 5;

/// Maximum extracted insights.
pub const MAX_INSIGHTS: usize = 5;

/// Accepted action length in characters, inclusive.
pub const ACTION_MIN_CHARS: usize = 10;
pub const ACTION_MAX_CHARS: usize = 200;

lazy_static! {
    static ref LIST_ITEM: Regex = Regex::new(r"^\s*(?:\d+[.)]|[-*•])\s+(.+)$").unwrap();

    static ref MARKER: Regex = Regex::new(
        r"(?i)(?:^|[\s*_(\[])(risk|opportunity|gap)\s*\**\s*:\s*\**\s*(.+)$"
    ).unwrap();

    static ref RISK_WORDS: Regex = Regex::new(
        r"(?i)\b(risks?|exposure|lapsed?|expired|underpaid|shortfall|dispute[ds]?)\b"
    ).unwrap();

    static ref OPPORTUNITY_WORDS: Regex = Regex::new(
        r"(?i)\b(opportunit(?:y|ies)|recover(?:y|able)?|supplement(?:al)?|upside)\b"
    ).unwrap();

    static ref SENTENCE_END: Regex = Regex::new(r"[.!?](?:\s+|$)").unwrap();
}

/// A marker pulled out of generated text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightMarker {
    pub kind: GuidanceKind,

    pub text: String,
}

/// Insights from explicit `Risk:` / `Opportunity:` / `Gap:` markers.
///
/// With no explicit markers, sentences carrying risk or opportunity
/// keywords are used instead.
pub fn extract_insights(text: &str) -> Vec<InsightMarker> {
    let explicit = explicit_markers(text);
    if !explicit.is_empty() {
        return explicit;
    }
    keyword_sentences(text)
}

fn explicit_markers(text: &str) -> Vec<InsightMarker> {
    let mut found: Vec<InsightMarker> = Vec::new();
    for line in text.lines() {
        let Some(caps) = MARKER.captures(line) else {
            continue;
        };
        let kind = match caps[1].to_ascii_lowercase().as_str() {
            "risk" => GuidanceKind::Risk,
            "opportunity" => GuidanceKind::Opportunity,
            _ => GuidanceKind::Gap,
        };
        let body = clean(&caps[2]);
        if body.is_empty() || found.iter().any(|f| f.text == body) {
            continue;
        }
        found.push(InsightMarker { kind, text: body });
        if found.len() == MAX_INSIGHTS {
            break;
        }
    }
    found
}

fn keyword_sentences(text: &str) -> Vec<InsightMarker> {
    let mut found: Vec<InsightMarker> = Vec::new();
    for sentence in sentences(text) {
        let kind = if RISK_WORDS.is_match(sentence) {
            GuidanceKind::Risk
        } else if OPPORTUNITY_WORDS.is_match(sentence) {
            GuidanceKind::Opportunity
        } else {
            continue;
        };
        let body = clean(sentence);
        if !within_length(&body) || found.iter().any(|f| f.text == body) {
            continue;
        }
        found.push(InsightMarker { kind, text: body });
        if found.len() == MAX_INSIGHTS {
            break;
        }
    }
    found
}

/// Split on sentence punctuation, keeping the punctuation.
fn sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    for line in text.lines().filter(|l| !LIST_ITEM.is_match(l)) {
        let mut start = 0;
        for m in SENTENCE_END.find_iter(line) {
            out.push(line[start..m.start() + 1].trim());
            start = m.end();
        }
        if start < line.len() {
            out.push(line[start..].trim());
        }
    }
    out.retain(|s| !s.is_empty());
    out
}

/// Numbered or bulleted lines, excluding insight markers.
pub fn extract_actions(text: &str) -> Vec<String> {
    let mut actions: Vec<String> = Vec::new();
    for line in text.lines() {
        let Some(caps) = LIST_ITEM.captures(line) else {
            continue;
        };
        let body = clean(&caps[1]);
        if starts_with_marker(&body) || !within_length(&body) || actions.contains(&body) {
            continue;
        }
        actions.push(body);
        if actions.len() == MAX_ACTIONS {
            break;
        }
    }
    actions
}

fn starts_with_marker(body: &str) -> bool {
    let lower = body.trim_start_matches('*').to_ascii_lowercase();
    ["risk", "opportunity", "gap"].iter().any(|m| {
        lower
            .strip_prefix(*m)
            .is_some_and(|rest| rest.trim_start_matches('*').trim_start().starts_with(':'))
    })
}

fn within_length(body: &str) -> bool {
    (ACTION_MIN_CHARS..=ACTION_MAX_CHARS).contains(&body.chars().count())
}

/// Strip markdown emphasis and surrounding whitespace.
fn clean(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| c == '*' || c == '_')
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const REPLY: &str = "The carrier approved $690,000 against a $1,025,000 submission.\n\
        Risk: The roof line item is underpaid by $335,000.\n\
        Opportunity: A supplement with code-upgrade documentation may recover the difference.\n\
        \n\
        1. Request the carrier's line-by-line estimate.\n\
        2) Send the code-upgrade letter to the adjuster\n\
        - Ok\n\
        * Schedule a re-inspection with the roofing contractor.\n";

    #[test]
    fn test_explicit_markers() {
        let insights = extract_insights(REPLY);
        assert_eq!(insights.len(), 2);
        assert_eq!(insights[0].kind, GuidanceKind::Risk);
        assert!(insights[0].text.starts_with("The roof line item"));
        assert_eq!(insights[1].kind, GuidanceKind::Opportunity);
    }

    #[test]
    fn test_bold_markers() {
        let insights = extract_insights("**Gap:** No moisture readings were captured.");
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].kind, GuidanceKind::Gap);
        assert_eq!(insights[0].text, "No moisture readings were captured.");
    }

    #[test]
    fn test_keyword_fallback() {
        let text = "The general liability certificate has lapsed. Everything else looks fine. \
                    There is an opportunity to recover depreciation holdback.";
        let insights = extract_insights(text);
        assert_eq!(insights.len(), 2);
        assert_eq!(insights[0].kind, GuidanceKind::Risk);
        assert_eq!(insights[1].kind, GuidanceKind::Opportunity);
    }

    #[test]
    fn test_actions_filtered_and_ordered() {
        let actions = extract_actions(REPLY);
        assert_eq!(
            actions,
            vec![
                "Request the carrier's line-by-line estimate.",
                "Send the code-upgrade letter to the adjuster",
                "Schedule a re-inspection with the roofing contractor.",
            ]
        );
    }

    #[test]
    fn test_actions_capped_at_five() {
        let text: String = (1..=8)
            .map(|n| format!("{}. Follow up on item number {}\n", n, n))
            .collect();
        let actions = extract_actions(&text);
        assert_eq!(actions.len(), MAX_ACTIONS);
        assert!(actions[4].ends_with("5"));
    }

    #[test]
    fn test_overlong_action_dropped() {
        let text = format!("- {}\n- Call the adjuster today", "x".repeat(201));
        assert_eq!(extract_actions(&text), vec!["Call the adjuster today"]);
    }

    #[test]
    fn test_marker_bullets_are_not_actions() {
        let actions = extract_actions("- Risk: certificate expired last week\n- Renew the certificate now");
        assert_eq!(actions, vec!["Renew the certificate now"]);
    }

    #[test]
    fn test_plain_text_yields_nothing() {
        assert!(extract_actions("Nothing structured here.").is_empty());
        assert!(extract_insights("Nothing structured here.").is_empty());
    }

    proptest! {
        #[test]
        fn prop_extraction_never_panics(text in "\\PC{0,400}") {
            let actions = extract_actions(&text);
            prop_assert!(actions.len() <= MAX_ACTIONS);
            for action in &actions {
                prop_assert!(within_length(action));
            }
            prop_assert!(extract_insights(&text).len() <= MAX_INSIGHTS);
        }
    }
}
