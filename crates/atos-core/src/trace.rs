//! Source references for guidance items.
//!
//! Every fact quoted in a guidance item must point back at a field of the
//! snapshot that produced it. A [`SourceRef`] records the field path and
//! what was read from it, so a reader (or a test) can re-resolve the path
//! against the serialized snapshot and confirm the quote.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// What a guidance item read from a snapshot field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Quote {
    /// The field's exact value
    Value(JsonValue),

    /// The number of entries in a list field
    Count(usize),

    /// The field is missing, null, or an empty list
    Absent,
}

/// A pointer into the snapshot supporting a guidance item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceRef {
    /// Dotted path in wire names (e.g., "claim.scopeDiscrepancies[0].carrierUsd")
    pub pointer: String,

    /// What was read at that path
    pub quote: Quote,
}

impl SourceRef {
    /// Reference a field value.
    pub fn value(pointer: impl Into<String>, value: impl Serialize) -> Self {
        Self {
            pointer: pointer.into(),
            quote: Quote::Value(serde_json::to_value(value).unwrap_or(JsonValue::Null)),
        }
    }

    /// Reference the length of a list field.
    pub fn count(pointer: impl Into<String>, count: usize) -> Self {
        Self {
            pointer: pointer.into(),
            quote: Quote::Count(count),
        }
    }

    /// Reference a field whose absence is the reported condition.
    pub fn absent(pointer: impl Into<String>) -> Self {
        Self {
            pointer: pointer.into(),
            quote: Quote::Absent,
        }
    }

    /// Resolve the pointer against a serialized snapshot.
    pub fn resolve<'a>(&self, root: &'a JsonValue) -> Option<&'a JsonValue> {
        root.pointer(&to_json_pointer(&self.pointer))
    }

    /// Check the quote against a serialized snapshot.
    pub fn verify(&self, root: &JsonValue) -> bool {
        let resolved = self.resolve(root);
        match &self.quote {
            Quote::Value(expected) => resolved == Some(expected),
            Quote::Count(n) => match resolved {
                Some(JsonValue::Array(items)) => items.len() == *n,
                None | Some(JsonValue::Null) => *n == 0,
                _ => false,
            },
            Quote::Absent => match resolved {
                None | Some(JsonValue::Null) => true,
                Some(JsonValue::Array(items)) => items.is_empty(),
                _ => false,
            },
        }
    }
}

/// Convert a dotted path with `[n]` indices into an RFC 6901 pointer.
fn to_json_pointer(path: &str) -> String {
    let mut pointer = String::new();
    for segment in path.split('.').filter(|s| !s.is_empty()) {
        let (name, rest) = match segment.find('[') {
            Some(idx) => segment.split_at(idx),
            None => (segment, ""),
        };
        if !name.is_empty() {
            pointer.push('/');
            pointer.push_str(&name.replace('~', "~0").replace('/', "~1"));
        }
        for index in rest.split(['[', ']']).filter(|s| !s.is_empty()) {
            pointer.push('/');
            pointer.push_str(index);
        }
    }
    pointer
}

/// Format a dollar amount as whole dollars with thousands separators.
///
/// This is the only formatter used for currency in guidance text.
pub fn format_usd(amount: f64) -> String {
    let rounded = amount.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

/// Format a ratio as a percentage with one decimal place.
pub fn format_percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}
