//! JSON Schema validation for case snapshots.
//!
//! Snapshots arrive from the data-access layer as untyped payloads. They are
//! checked against `schema/case_snapshot.schema.json` before deserialization
//! so that a missing required field is reported at the boundary.

use std::sync::OnceLock;
use thiserror::Error;

/// Embedded snapshot schema (loaded at compile time).
const SNAPSHOT_SCHEMA_JSON: &str = include_str!("../../../../schema/case_snapshot.schema.json");

/// Compiled JSON Schema validator (initialized once, reused).
static COMPILED_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

/// Errors from schema validation.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Failed to load schema: {0}")]
    LoadError(String),
}

fn get_validator() -> Result<&'static jsonschema::Validator, SchemaError> {
    let result = COMPILED_SCHEMA.get_or_init(|| {
        let schema_value: serde_json::Value = match serde_json::from_str(SNAPSHOT_SCHEMA_JSON) {
            Ok(v) => v,
            Err(e) => return Err(format!("Invalid schema JSON: {}", e)),
        };

        match jsonschema::options().build(&schema_value) {
            Ok(v) => Ok(v),
            Err(e) => Err(format!("Failed to compile schema: {}", e)),
        }
    });

    match result {
        Ok(v) => Ok(v),
        Err(e) => Err(SchemaError::LoadError(e.clone())),
    }
}

/// Validate a snapshot payload against the schema.
///
/// Returns every violation as `"<message> at <instance path>"`.
pub fn validate_snapshot_schema(snapshot_json: &serde_json::Value) -> Result<(), Vec<String>> {
    let validator = get_validator().map_err(|e| vec![e.to_string()])?;

    let errors: Vec<String> = validator
        .iter_errors(snapshot_json)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check if a payload is a valid snapshot.
pub fn is_valid_snapshot(snapshot_json: &serde_json::Value) -> bool {
    get_validator()
        .map(|v| v.is_valid(snapshot_json))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> serde_json::Value {
        serde_json::json!({
            "caseId": "case-1",
            "stage": "INTAKE",
            "property": { "id": "p-1", "name": "Harbor Point" }
        })
    }

    #[test]
    fn test_minimal_snapshot_passes() {
        assert!(validate_snapshot_schema(&minimal()).is_ok());
    }

    #[test]
    fn test_missing_stage_fails() {
        let mut value = minimal();
        value.as_object_mut().unwrap().remove("stage");
        let errors = validate_snapshot_schema(&value).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("stage")));
    }

    #[test]
    fn test_unknown_stage_fails() {
        let mut value = minimal();
        value["stage"] = serde_json::json!("ARCHIVED");
        assert!(validate_snapshot_schema(&value).is_err());
    }

    #[test]
    fn test_discrepancy_requires_amounts() {
        let mut value = minimal();
        value["claim"] = serde_json::json!({
            "carrier": "Acme Mutual",
            "policyNumber": "POL-1",
            "status": "submitted",
            "scopeDiscrepancies": [
                { "id": "li-1", "lineItem": "Roof", "submittedUsd": 1000 }
            ]
        });
        assert!(validate_snapshot_schema(&value).is_err());
    }

    #[test]
    fn test_negative_amount_fails() {
        let mut value = minimal();
        value["equity"] = serde_json::json!({
            "preValue": 100, "postValue": 120, "claimTotal": 10,
            "payout": -5, "repairCost": 8
        });
        assert!(validate_snapshot_schema(&value).is_err());
    }

    #[test]
    fn test_null_claim_is_allowed() {
        let mut value = minimal();
        value["claim"] = serde_json::Value::Null;
        assert!(is_valid_snapshot(&value));
    }

    #[test]
    fn test_progress_over_100_fails() {
        let mut value = minimal();
        value["scopeAssignments"] = serde_json::json!([{
            "id": "sa-1", "contractorId": "c-1", "scope": "Roof",
            "status": "in_progress", "progressPercent": 140
        }]);
        assert!(!is_valid_snapshot(&value));
    }
}
