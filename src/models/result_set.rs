//! Result models for paycheck calculations.
//!
//! This module contains the [`ResultSet`] produced by one evaluation pass,
//! the per-formula [`EvaluationIssue`] records, and the [`PaycheckResult`]
//! envelope that packages a result set with its audit metadata.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::EmployeeInput;

/// Severity of a recorded evaluation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    /// The formula completed but substituted a default (e.g., a missing
    /// configuration path resolved to zero).
    Warning,
    /// The formula failed and its field was degraded to zero.
    Error,
}

/// A recorded issue from evaluating a single formula.
///
/// Issues never abort the calculation; they exist so operators and test
/// suites can detect degraded fields and unintended zero-substitutions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationIssue {
    /// The name of the formula the issue occurred in.
    pub formula: String,
    /// Whether the field degraded or merely defaulted.
    pub severity: IssueSeverity,
    /// Human-readable description of the cause.
    pub message: String,
}

/// The complete, rounded output of one calculation pass.
///
/// Every formula in the evaluation order gets a value; fields whose formula
/// failed carry `0` and a matching [`EvaluationIssue`]. Values are rounded
/// to 2 decimal places, half away from zero. For identical inputs and
/// configuration the result set is identical.
///
/// # Example
///
/// ```
/// use paycheck_engine::models::ResultSet;
///
/// let results = ResultSet::default();
/// assert!(results.get("net_salary").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    /// Rounded value per formula name.
    pub values: BTreeMap<String, Decimal>,
    /// Issues recorded during the pass, in evaluation order.
    #[serde(default)]
    pub issues: Vec<EvaluationIssue>,
}

impl ResultSet {
    /// Returns the value computed for a formula, if it was evaluated.
    pub fn get(&self, name: &str) -> Option<Decimal> {
        self.values.get(name).copied()
    }

    /// Returns true if any issue of the given severity was recorded.
    pub fn has_issues(&self, severity: IssueSeverity) -> bool {
        self.issues.iter().any(|i| i.severity == severity)
    }

    /// Returns the issues recorded for a specific formula.
    pub fn issues_for(&self, name: &str) -> impl Iterator<Item = &EvaluationIssue> {
        self.issues.iter().filter(move |i| i.formula == name)
    }
}

/// The complete result of a paycheck calculation.
///
/// Packages the [`ResultSet`] with a snapshot of the input and a
/// fingerprint of the configuration used, for later audit or history by an
/// external collaborator. The engine itself persists nothing.
///
/// # Example
///
/// ```
/// use paycheck_engine::models::{EmployeeInput, PaycheckResult, ResultSet};
/// use chrono::Utc;
/// use rust_decimal::Decimal;
/// use uuid::Uuid;
///
/// let result = PaycheckResult {
///     calculation_id: Uuid::new_v4(),
///     timestamp: Utc::now(),
///     engine_version: "0.1.0".to_string(),
///     input: EmployeeInput {
///         employee_name: "Ana Souza".to_string(),
///         base_salary: Decimal::new(300000, 2),
///         dependents_count: 0,
///         reference_month: "2024-06".to_string(),
///     },
///     config_fingerprint: String::new(),
///     results: ResultSet::default(),
/// };
/// assert_eq!(result.engine_version, "0.1.0");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaycheckResult {
    /// Unique identifier for this calculation.
    pub calculation_id: Uuid,
    /// When the calculation was performed.
    pub timestamp: DateTime<Utc>,
    /// The version of the engine that produced this result.
    pub engine_version: String,
    /// Snapshot of the input the calculation ran against.
    pub input: EmployeeInput,
    /// SHA-256 hex digest of the configuration used.
    pub config_fingerprint: String,
    /// The computed, rounded values and recorded issues.
    pub results: ResultSet,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn create_test_result_set() -> ResultSet {
        let mut values = BTreeMap::new();
        values.insert("base_salary".to_string(), dec("3000.00"));
        values.insert("net_salary".to_string(), dec("2498.39"));
        ResultSet {
            values,
            issues: vec![EvaluationIssue {
                formula: "health_plan_value".to_string(),
                severity: IssueSeverity::Warning,
                message: "config.deductions.health_plan.amount resolved to 0 (missing path)"
                    .to_string(),
            }],
        }
    }

    #[test]
    fn test_get_returns_computed_value() {
        let results = create_test_result_set();
        assert_eq!(results.get("net_salary"), Some(dec("2498.39")));
        assert_eq!(results.get("unknown"), None);
    }

    #[test]
    fn test_has_issues_by_severity() {
        let results = create_test_result_set();
        assert!(results.has_issues(IssueSeverity::Warning));
        assert!(!results.has_issues(IssueSeverity::Error));
    }

    #[test]
    fn test_issues_for_filters_by_formula() {
        let results = create_test_result_set();
        assert_eq!(results.issues_for("health_plan_value").count(), 1);
        assert_eq!(results.issues_for("net_salary").count(), 0);
    }

    #[test]
    fn test_result_set_serialization_is_stable() {
        // BTreeMap keys serialize in sorted order, so two identical result
        // sets produce byte-identical JSON.
        let a = serde_json::to_string(&create_test_result_set()).unwrap();
        let b = serde_json::to_string(&create_test_result_set()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_issue_severity_serialization() {
        assert_eq!(
            serde_json::to_string(&IssueSeverity::Warning).unwrap(),
            "\"warning\""
        );
        assert_eq!(
            serde_json::to_string(&IssueSeverity::Error).unwrap(),
            "\"error\""
        );
    }

    #[test]
    fn test_paycheck_result_round_trip() {
        let result = PaycheckResult {
            calculation_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            engine_version: "0.1.0".to_string(),
            input: EmployeeInput {
                employee_name: "Ana Souza".to_string(),
                base_salary: dec("3000.00"),
                dependents_count: 1,
                reference_month: "2024-06".to_string(),
            },
            config_fingerprint: "ab".repeat(32),
            results: create_test_result_set(),
        };

        let json = serde_json::to_string(&result).unwrap();
        let deserialized: PaycheckResult = serde_json::from_str(&json).unwrap();
        assert_eq!(result, deserialized);
    }
}
