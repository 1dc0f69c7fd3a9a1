//! Guidance types shared by evaluators, the ranker and the composer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::trace::SourceRef;

/// The module a guidance request is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    Property,
    Evidence,
    Insurance,
    Contractor,
    Equity,
}

impl Module {
    /// All modules, in evaluation order.
    pub const ALL: [Module; 5] = [
        Module::Property,
        Module::Evidence,
        Module::Insurance,
        Module::Contractor,
        Module::Equity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Module::Property => "property",
            Module::Evidence => "evidence",
            Module::Insurance => "insurance",
            Module::Contractor => "contractor",
            Module::Equity => "equity",
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a module name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown module: '{0}'")]
pub struct UnknownModule(pub String);

impl FromStr for Module {
    type Err = UnknownModule;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "property" => Ok(Module::Property),
            "evidence" => Ok(Module::Evidence),
            "insurance" | "claim" => Ok(Module::Insurance),
            "contractor" | "contractors" | "execution" => Ok(Module::Contractor),
            "equity" => Ok(Module::Equity),
            other => Err(UnknownModule(other.to_string())),
        }
    }
}

/// Severity of a guidance item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Ranking weight: critical=4, high=3, medium=2, low=1.
    pub fn weight(&self) -> u8 {
        match self {
            Severity::Low => 1,
            Severity::Medium => 2,
            Severity::High => 3,
            Severity::Critical => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What sort of finding a guidance item reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuidanceKind {
    /// Something required is not captured
    Gap,
    /// Something captured is a problem
    Risk,
    /// Value left on the table
    Opportunity,
    /// Stage or cadence advice
    Action,
}

/// Rule family that produced an item.
///
/// Declaration order is emission order within one evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleFamily {
    Evidence,
    Stage,
    Discrepancy,
    Compliance,
    Execution,
    Recovery,
    Fallback,
}

impl RuleFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleFamily::Evidence => "evidence",
            RuleFamily::Stage => "stage",
            RuleFamily::Discrepancy => "discrepancy",
            RuleFamily::Compliance => "compliance",
            RuleFamily::Execution => "execution",
            RuleFamily::Recovery => "recovery",
            RuleFamily::Fallback => "fallback",
        }
    }

    /// Confidence attached to items of this family.
    ///
    /// Structural checks on captured data score higher than templated advice.
    pub fn base_confidence(&self) -> f64 {
        match self {
            RuleFamily::Evidence => 0.90,
            RuleFamily::Stage => 0.70,
            RuleFamily::Discrepancy => 0.92,
            RuleFamily::Compliance => 0.95,
            RuleFamily::Execution => 0.88,
            RuleFamily::Recovery => 0.80,
            RuleFamily::Fallback => 0.60,
        }
    }
}

/// A single piece of explainable guidance.
///
/// Produced fresh per evaluation and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GuidanceItem {
    /// Deterministic id: `<module>.<family>.<subject>`
    pub id: String,

    pub module: Module,

    pub family: RuleFamily,

    pub kind: GuidanceKind,

    pub title: String,

    pub why_this_matters: String,

    pub recommendation: String,

    pub severity: Severity,

    /// In [0, 1]
    pub confidence_score: f64,

    /// Snapshot fields quoted by this item
    #[serde(default)]
    pub sources: Vec<SourceRef>,
}

impl GuidanceItem {
    pub fn is_gap(&self) -> bool {
        self.kind == GuidanceKind::Gap
    }
}
