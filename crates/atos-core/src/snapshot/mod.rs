//! Case snapshot contract.
//!
//! A snapshot is the only input to the engine: an immutable view of one
//! case's facts supplied by the data-access layer. This module handles
//! parsing YAML/JSON snapshots and validating them at the boundary.

mod model;
mod schema;

pub use model::{
    AdjusterContact, AssignmentStatus, CaseSnapshot, CaseStage, ClaimRecord, ClaimStatus,
    ComplianceRecord, ComplianceStatus, ContractorRecord, DamageSeverity, EquityFigures,
    EvidenceItem, EvidenceKind, Inspection, Interaction, Peril, PropertyProfile, QualityRisk,
    RiskLevel, ScopeAssignment, ScopeDiscrepancy, SnapshotError, VerificationStatus,
};
pub use schema::{is_valid_snapshot, validate_snapshot_schema};
