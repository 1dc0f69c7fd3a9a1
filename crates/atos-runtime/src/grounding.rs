//! Dollar-figure grounding for generated text.
//!
//! A figure is grounded when it equals a number in the snapshot or a
//! dollar amount already quoted by the engine's findings (which covers
//! derived values such as discrepancy deltas).

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value as JsonValue;

use atos_core::{CaseSnapshot, GuidanceItem};

lazy_static! {
    static ref CURRENCY: Regex = Regex::new(
        r"(?i)\$\s?(\d{1,3}(?:,\d{3})+|\d+)(\.\d+)?(?:\s?(k|m|mm|million|thousand)\b)?"
    ).unwrap();
}

/// Relative tolerance for abbreviated figures such as `$1.03M`.
const ABBREVIATED_TOLERANCE: f64 = 0.005;

/// A dollar amount found in text.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub raw: String,
    pub amount: f64,
    pub abbreviated: bool,
}

/// Outcome of a grounding check.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroundingReport {
    pub checked: usize,
    pub ungrounded: Vec<String>,
}

impl GroundingReport {
    pub fn is_grounded(&self) -> bool {
        self.ungrounded.is_empty()
    }
}

/// Every dollar figure in `text`, in order of appearance.
pub fn currency_figures(text: &str) -> Vec<Figure> {
    CURRENCY
        .captures_iter(text)
        .filter_map(|caps| {
            let whole: f64 = caps[1].replace(',', "").parse().ok()?;
            let fraction: f64 = caps
                .get(2)
                .and_then(|m| format!("0{}", m.as_str()).parse().ok())
                .unwrap_or(0.0);
            let multiplier = match caps.get(3).map(|m| m.as_str().to_ascii_lowercase()) {
                Some(s) if s == "k" || s == "thousand" => 1_000.0,
                Some(_) => 1_000_000.0,
                None => 1.0,
            };
            Some(Figure {
                raw: caps[0].trim().to_string(),
                amount: (whole + fraction) * multiplier,
                abbreviated: caps.get(3).is_some(),
            })
        })
        .collect()
}

/// Check every dollar figure in `text` against the snapshot and findings.
pub fn check_grounding(text: &str, snapshot: &CaseSnapshot, ranked: &[GuidanceItem]) -> GroundingReport {
    let mut known = Vec::new();
    collect_numbers(&snapshot.to_value(), &mut known);
    for item in ranked {
        for field in [&item.title, &item.why_this_matters, &item.recommendation] {
            known.extend(currency_figures(field).into_iter().map(|f| f.amount));
        }
    }

    let figures = currency_figures(text);
    let ungrounded = figures
        .iter()
        .filter(|f| !known.iter().any(|k| matches_known(f, *k)))
        .map(|f| f.raw.clone())
        .collect();

    GroundingReport {
        checked: figures.len(),
        ungrounded,
    }
}

fn matches_known(figure: &Figure, known: f64) -> bool {
    if figure.abbreviated {
        known != 0.0 && ((figure.amount - known) / known).abs() <= ABBREVIATED_TOLERANCE
    } else {
        (figure.amount - known).abs() < 0.5 || (figure.amount - known.round()).abs() < 0.5
    }
}

fn collect_numbers(value: &JsonValue, out: &mut Vec<f64>) {
    match value {
        JsonValue::Number(n) => {
            if let Some(f) = n.as_f64() {
                out.push(f);
            }
        }
        JsonValue::Array(items) => items.iter().for_each(|v| collect_numbers(v, out)),
        JsonValue::Object(map) => map.values().for_each(|v| collect_numbers(v, out)),
        _ => {}
    }
}
