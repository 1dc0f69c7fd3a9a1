//! Case snapshot model and loading from YAML/JSON.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

use super::schema::validate_snapshot_schema;

/// Errors that can occur when loading a snapshot.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Failed to read snapshot file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Snapshot does not match schema: {}", .0.join("; "))]
    SchemaError(Vec<String>),

    #[error("Snapshot validation failed: {0}")]
    ValidationError(String),
}

/// Current lifecycle stage of a case.
///
/// Linear: INTAKE → INSPECTION → CLAIM → EXECUTION → OUTCOME. The stage is
/// supplied by the caller; the engine only reacts to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaseStage {
    #[serde(alias = "intake")]
    Intake,
    #[serde(alias = "inspection")]
    Inspection,
    #[serde(alias = "claim")]
    Claim,
    #[serde(alias = "execution")]
    Execution,
    #[serde(alias = "outcome")]
    Outcome,
}

impl CaseStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStage::Intake => "INTAKE",
            CaseStage::Inspection => "INSPECTION",
            CaseStage::Claim => "CLAIM",
            CaseStage::Execution => "EXECUTION",
            CaseStage::Outcome => "OUTCOME",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CaseStage::Outcome)
    }
}

impl std::fmt::Display for CaseStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Loss event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Peril {
    Hail,
    Wind,
    Water,
    Fire,
    Other,
}

impl Peril {
    pub fn as_str(&self) -> &'static str {
        match self {
            Peril::Hail => "hail",
            Peril::Wind => "wind",
            Peril::Water => "water",
            Peril::Fire => "fire",
            Peril::Other => "other",
        }
    }

    /// Evidence tags that corroborate this peril.
    pub fn corroborating_tags(&self) -> &'static [&'static str] {
        match self {
            Peril::Hail => &["hail", "impact", "bruising"],
            Peril::Wind => &["wind", "uplift", "creasing"],
            Peril::Water => &["water", "moisture", "leak"],
            Peril::Fire => &["fire", "smoke", "char"],
            Peril::Other => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

/// Property identity, occupancy, risk and valuation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PropertyProfile {
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub address: Option<String>,

    #[serde(default)]
    pub occupancy: Option<String>,

    #[serde(default)]
    pub risk_level: Option<RiskLevel>,

    #[serde(default)]
    pub pre_loss_value: Option<f64>,

    #[serde(default)]
    pub replacement_cost: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    Photo,
    Video,
    Document,
    Note,
    Report,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Verified,
    #[default]
    Pending,
    Flagged,
}

/// A captured piece of evidence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceItem {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: EvidenceKind,

    #[serde(default)]
    pub captured_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub captured_by: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub verification: VerificationStatus,
}

impl EvidenceItem {
    /// Case-insensitive check against any of the given tags.
    pub fn has_any_tag(&self, wanted: &[&str]) -> bool {
        self.tags
            .iter()
            .any(|t| wanted.iter().any(|w| t.trim().eq_ignore_ascii_case(w)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageSeverity {
    Minor,
    Moderate,
    Major,
    Severe,
    Catastrophic,
}

impl DamageSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            DamageSeverity::Minor => "minor",
            DamageSeverity::Moderate => "moderate",
            DamageSeverity::Major => "major",
            DamageSeverity::Severe => "severe",
            DamageSeverity::Catastrophic => "catastrophic",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Inspection {
    pub id: String,

    pub inspector: String,

    #[serde(default)]
    pub date: Option<NaiveDate>,

    pub severity: DamageSeverity,

    #[serde(default)]
    pub damage_categories: Vec<String>,

    #[serde(default)]
    pub estimated_cost: Option<f64>,

    #[serde(default)]
    pub chain_of_custody: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    Draft,
    Submitted,
    UnderReview,
    Approved,
    PartiallyApproved,
    Denied,
    Paid,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdjusterContact {
    pub name: String,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    #[serde(default)]
    pub at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub channel: Option<String>,

    pub summary: String,
}

/// A scope line item where the submitted and carrier values differ.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScopeDiscrepancy {
    pub id: String,

    pub line_item: String,

    pub submitted_usd: f64,

    pub carrier_usd: f64,

    #[serde(default)]
    pub rationale: Option<String>,
}

impl ScopeDiscrepancy {
    /// submitted − carrier
    pub fn delta_usd(&self) -> f64 {
        self.submitted_usd - self.carrier_usd
    }

    /// delta / submitted, or `None` when nothing was submitted.
    pub fn delta_ratio(&self) -> Option<f64> {
        if self.submitted_usd > 0.0 {
            Some(self.delta_usd() / self.submitted_usd)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRecord {
    pub carrier: String,

    pub policy_number: String,

    pub status: ClaimStatus,

    #[serde(default)]
    pub claimed_usd: Option<f64>,

    #[serde(default)]
    pub approved_usd: Option<f64>,

    #[serde(default)]
    pub paid_usd: Option<f64>,

    #[serde(default)]
    pub adjuster: Option<AdjusterContact>,

    #[serde(default)]
    pub interactions: Vec<Interaction>,

    #[serde(default)]
    pub scope_discrepancies: Vec<ScopeDiscrepancy>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    Valid,
    Expiring,
    Expired,
}

impl ComplianceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceStatus::Valid => "valid",
            ComplianceStatus::Expiring => "expiring",
            ComplianceStatus::Expired => "expired",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceRecord {
    pub category: String,

    #[serde(default)]
    pub expires_on: Option<NaiveDate>,

    pub status: ComplianceStatus,

    #[serde(default)]
    pub days_remaining: Option<i64>,
}

impl ComplianceRecord {
    /// Lowercased category with whitespace runs joined by `-`.
    pub fn category_slug(&self) -> String {
        self.category
            .split_whitespace()
            .map(str::to_ascii_lowercase)
            .collect::<Vec<_>>()
            .join("-")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContractorRecord {
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub compliance: Vec<ComplianceRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    NotStarted,
    InProgress,
    Blocked,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QualityRisk {
    #[default]
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScopeAssignment {
    pub id: String,

    pub contractor_id: String,

    pub scope: String,

    pub status: AssignmentStatus,

    #[serde(default)]
    pub progress_percent: u8,

    #[serde(default)]
    pub verification_links: u32,

    #[serde(default)]
    pub quality_risk: QualityRisk,

    #[serde(default)]
    pub blocker: Option<String>,

    #[serde(default)]
    pub blocker_owner: Option<String>,
}

/// Equity figures for a case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EquityFigures {
    pub pre_value: f64,

    pub post_value: f64,

    pub claim_total: f64,

    pub payout: f64,

    pub repair_cost: f64,

    #[serde(default)]
    pub derived_gain: Option<f64>,

    #[serde(default)]
    pub derived_roi: Option<f64>,
}

impl EquityFigures {
    /// Supplied gain, else post − pre.
    pub fn gain(&self) -> f64 {
        self.derived_gain
            .unwrap_or(self.post_value - self.pre_value)
    }

    /// Supplied ROI, else gain / repair cost.
    pub fn roi(&self) -> Option<f64> {
        self.derived_roi.or_else(|| {
            if self.repair_cost > 0.0 {
                Some(self.gain() / self.repair_cost)
            } else {
                None
            }
        })
    }

    /// payout / claim total, or `None` when nothing was claimed.
    pub fn recovery_ratio(&self) -> Option<f64> {
        if self.claim_total > 0.0 {
            Some(self.payout / self.claim_total)
        } else {
            None
        }
    }
}

/// Point-in-time, read-only view of one case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CaseSnapshot {
    pub case_id: String,

    pub stage: CaseStage,

    #[serde(default)]
    pub event_type: Option<Peril>,

    pub property: PropertyProfile,

    #[serde(default)]
    pub evidence: Vec<EvidenceItem>,

    #[serde(default)]
    pub inspections: Vec<Inspection>,

    #[serde(default)]
    pub claim: Option<ClaimRecord>,

    #[serde(default)]
    pub contractors: Vec<ContractorRecord>,

    #[serde(default)]
    pub scope_assignments: Vec<ScopeAssignment>,

    #[serde(default)]
    pub equity: Option<EquityFigures>,
}

impl CaseSnapshot {
    /// Parse a snapshot from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let value: JsonValue = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Parse a snapshot from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, SnapshotError> {
        let value: JsonValue = serde_yaml::from_str(yaml)?;
        Self::from_value(value)
    }

    /// Parse a snapshot from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parse a snapshot from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Build a snapshot from an untyped payload.
    ///
    /// The payload is checked against the snapshot schema first, so a
    /// missing required field fails here instead of inside an evaluator.
    pub fn from_value(value: JsonValue) -> Result<Self, SnapshotError> {
        validate_snapshot_schema(&value).map_err(SnapshotError::SchemaError)?;
        let snapshot: CaseSnapshot = serde_json::from_value(value)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Serialize to the wire shape used by source pointers.
    pub fn to_value(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }

    /// Look up a contractor by id.
    pub fn contractor(&self, id: &str) -> Option<&ContractorRecord> {
        self.contractors.iter().find(|c| c.id == id)
    }

    /// Checks the schema cannot express.
    fn validate(&self) -> Result<(), SnapshotError> {
        let mut seen = HashSet::new();
        for item in &self.evidence {
            if !seen.insert(item.id.as_str()) {
                return Err(SnapshotError::ValidationError(format!(
                    "Duplicate evidence ID: {}",
                    item.id
                )));
            }
        }

        if let Some(claim) = &self.claim {
            let amounts = [claim.claimed_usd, claim.approved_usd, claim.paid_usd];
            if amounts.iter().flatten().any(|v| *v < 0.0) {
                return Err(SnapshotError::ValidationError(
                    "claim amounts must be non-negative".to_string(),
                ));
            }
            let lines = claim.scope_discrepancies.iter().map(|d| d.id.clone());
            unique("scope discrepancy ID", lines)?;
            for item in &claim.scope_discrepancies {
                if item.submitted_usd < 0.0 || item.carrier_usd < 0.0 {
                    return Err(SnapshotError::ValidationError(format!(
                        "scope discrepancy {} has a negative amount",
                        item.id
                    )));
                }
            }
        }

        let inspections = self.inspections.iter().map(|i| i.id.clone());
        unique("inspection ID", inspections)?;

        let contractors = self.contractors.iter().map(|c| c.id.clone());
        unique("contractor ID", contractors)?;

        // Compliance guidance is keyed by contractor and category.
        let compliance = self.contractors.iter().flat_map(|c| {
            c.compliance
                .iter()
                .map(move |r| format!("{}-{}", c.id, r.category_slug()))
        });
        unique("compliance record", compliance)?;

        let assignments = self.scope_assignments.iter().map(|a| a.id.clone());
        unique("scope assignment ID", assignments)?;

        for assignment in &self.scope_assignments {
            if assignment.progress_percent > 100 {
                return Err(SnapshotError::ValidationError(format!(
                    "scope assignment {} progress {}% exceeds 100%",
                    assignment.id, assignment.progress_percent
                )));
            }
        }

        Ok(())
    }
}

fn unique(what: &str, keys: impl Iterator<Item = String>) -> Result<(), SnapshotError> {
    let mut seen = HashSet::new();
    for key in keys {
        if seen.contains(&key) {
            return Err(SnapshotError::ValidationError(format!(
                "Duplicate {}: {}",
                what, key
            )));
        }
        seen.insert(key);
    }
    Ok(())
}
