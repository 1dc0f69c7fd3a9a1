//! Tunable thresholds for the scope-discrepancy and recovery rules.

use serde::{Deserialize, Serialize};

use crate::types::Severity;

/// Delta ratio at or above which a discrepancy is medium.
pub const DISCREPANCY_MEDIUM_RATIO: f64 = 0.10;

/// Delta ratio above which a discrepancy is high.
pub const DISCREPANCY_HIGH_RATIO: f64 = 0.25;

/// Delta ratio at or above which a discrepancy is critical.
pub const DISCREPANCY_CRITICAL_RATIO: f64 = 0.50;

/// Recovered/claimed ratio below which a recovery gap is reported.
pub const RECOVERY_RATIO: f64 = 0.75;

/// Thresholds applied by the evaluators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub discrepancy_medium: f64,
    pub discrepancy_high: f64,
    pub discrepancy_critical: f64,
    pub recovery_ratio: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            discrepancy_medium: DISCREPANCY_MEDIUM_RATIO,
            discrepancy_high: DISCREPANCY_HIGH_RATIO,
            discrepancy_critical: DISCREPANCY_CRITICAL_RATIO,
            recovery_ratio: RECOVERY_RATIO,
        }
    }
}

impl Thresholds {
    /// Map a discrepancy delta ratio onto a severity band.
    ///
    /// Below medium is informational (low). The high band is strictly
    /// above its threshold.
    pub fn discrepancy_severity(&self, ratio: f64) -> Severity {
        if ratio >= self.discrepancy_critical {
            Severity::Critical
        } else if ratio > self.discrepancy_high {
            Severity::High
        } else if ratio >= self.discrepancy_medium {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    /// Whether a recovered/claimed ratio is a recovery gap.
    pub fn is_recovery_gap(&self, ratio: f64) -> bool {
        ratio < self.recovery_ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discrepancy_bands() {
        let t = Thresholds::default();
        assert_eq!(t.discrepancy_severity(0.05), Severity::Low);
        assert_eq!(t.discrepancy_severity(0.10), Severity::Medium);
        assert_eq!(t.discrepancy_severity(0.25), Severity::Medium);
        assert_eq!(t.discrepancy_severity(0.327), Severity::High);
        assert_eq!(t.discrepancy_severity(0.50), Severity::Critical);
    }

    #[test]
    fn test_recovery_gap() {
        let t = Thresholds::default();
        assert!(t.is_recovery_gap(0.70));
        assert!(!t.is_recovery_gap(0.75));
    }

    #[test]
    fn test_partial_override_from_json() {
        let t: Thresholds = serde_json::from_str(r#"{"recovery_ratio": 0.9}"#).unwrap();
        assert_eq!(t.recovery_ratio, 0.9);
        assert_eq!(t.discrepancy_high, DISCREPANCY_HIGH_RATIO);
    }
}
