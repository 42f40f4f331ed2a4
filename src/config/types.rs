//! Configuration types for the paycheck calculation engine.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files. A configuration is an
//! immutable snapshot for the duration of one calculation: the engine
//! never mutates it, and edits produce a new configuration value.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use sha2::{Digest, Sha256};

/// Which calculation model a bracket table is used with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    /// Income-tax style: the containing bracket's rate applies to the whole
    /// value, less that bracket's flat deduction.
    WithDeduction,
    /// Contribution style: marginal rates accumulate across every bracket
    /// the value passes through; no flat deduction.
    Progressive,
}

/// One row of a progressive rate table.
///
/// Covers the contiguous range `min..=max` with an associated rate and,
/// for income-tax style tables, a flat deduction. `max` of `None` marks an
/// unbounded top bracket and is only valid on the last row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bracket {
    /// Lower bound of the range (inclusive).
    pub min: Decimal,
    /// Upper bound of the range (inclusive); `None` means unbounded.
    #[serde(default, serialize_with = "serialize_upper_bound")]
    pub max: Option<Decimal>,
    /// Rate applied within this bracket, in `0..=1`.
    pub rate: Decimal,
    /// Flat deduction for income-tax style tables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deduction: Option<Decimal>,
}

/// Serializes an unbounded upper bound as `Decimal::MAX` so that formula
/// scripts can compare against `bracket.max` without a special case.
fn serialize_upper_bound<S: Serializer>(
    max: &Option<Decimal>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serde::Serialize::serialize(&max.unwrap_or(Decimal::MAX), serializer)
}

impl Bracket {
    /// Returns the effective upper bound, `Decimal::MAX` when unbounded.
    pub fn upper(&self) -> Decimal {
        self.max.unwrap_or(Decimal::MAX)
    }

    /// Returns true if `value` falls within this bracket (both bounds
    /// inclusive).
    pub fn contains(&self, value: Decimal) -> bool {
        self.min <= value && value <= self.upper()
    }
}

/// An ordered sequence of brackets forming a contiguous partition.
///
/// Created from configuration, replaced wholesale on a configuration
/// update, and read-only during evaluation. Callers must validate a table
/// (see [`crate::config::validate_bracket_table`]) whenever configuration
/// changes; the calculation path trusts the tables it receives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BracketTable {
    /// The brackets, sorted ascending by `min`.
    pub brackets: Vec<Bracket>,
}

impl BracketTable {
    /// Returns the number of brackets in the table.
    pub fn len(&self) -> usize {
        self.brackets.len()
    }

    /// Returns true if the table has no brackets.
    pub fn is_empty(&self) -> bool {
        self.brackets.is_empty()
    }

    /// Returns the first bracket containing `value`.
    ///
    /// At a shared boundary the lower bracket wins: a value exactly equal
    /// to an upper bound belongs to the bracket that bound was assigned to.
    pub fn containing(&self, value: Decimal) -> Option<&Bracket> {
        self.brackets.iter().find(|b| b.contains(value))
    }
}

/// A rate-based benefit deduction (e.g., transport voucher).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenefitRate {
    /// Whether the deduction applies at all.
    pub enabled: bool,
    /// Fraction of the base salary withheld.
    pub rate: Decimal,
    /// Upper cap on the withheld amount; zero means uncapped.
    pub max_amount: Decimal,
}

/// A fixed-amount benefit deduction (e.g., meal voucher, health plan).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenefitAmount {
    /// Whether the deduction applies at all.
    pub enabled: bool,
    /// The fixed amount withheld per month.
    pub amount: Decimal,
}

/// The allowance subtracted from the income-tax base per dependent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependentAllowance {
    /// Amount deducted from the taxable base for each dependent.
    pub deduction_per_dependent: Decimal,
}

/// Benefit deduction rules plus the dependent allowance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeductionRules {
    /// Transport voucher withholding (rate of base salary, optional cap).
    pub transport_voucher: BenefitRate,
    /// Meal voucher withholding.
    pub meal_voucher: BenefitAmount,
    /// Food voucher withholding.
    pub food_voucher: BenefitAmount,
    /// Health plan withholding.
    pub health_plan: BenefitAmount,
    /// Dependent allowance for the income-tax base.
    pub dependents: DependentAllowance,
}

/// The complete payroll configuration.
///
/// Owned exclusively by the calling application; the engine treats it as
/// an immutable snapshot for the duration of one calculation call.
///
/// Formula bodies are ordinary strings in the engine's expression language
/// and may reference `input.*`, `config.*`, and `result.*` paths. The
/// `evaluation_order` lists the formulas to evaluate, in dependency order;
/// it is statically checked when a calculation is prepared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollConfig {
    /// Income-tax brackets (with flat deductions).
    pub income_tax_brackets: BracketTable,
    /// Social-contribution table (progressive accumulation).
    pub contribution_table: BracketTable,
    /// Employer deposit rate applied to the base salary.
    pub deposit_rate: Decimal,
    /// Benefit deduction rules and the dependent allowance.
    pub deductions: DeductionRules,
    /// Formula bodies by name.
    pub formulas: BTreeMap<String, String>,
    /// The order formulas are evaluated in.
    pub evaluation_order: Vec<String>,
}

impl PayrollConfig {
    /// Returns a SHA-256 hex digest of the serialized configuration.
    ///
    /// Recorded with every calculation so an external history collaborator
    /// can tell which configuration produced a result without storing the
    /// full configuration alongside each entry. Struct fields and ordered
    /// maps serialize deterministically, so identical configurations
    /// produce identical fingerprints.
    pub fn fingerprint(&self) -> String {
        let bytes =
            serde_json::to_vec(self).expect("payroll configuration always serializes to JSON");
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        format!("{:x}", hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn bracket(min: &str, max: Option<&str>, rate: &str, deduction: Option<&str>) -> Bracket {
        Bracket {
            min: dec(min),
            max: max.map(dec),
            rate: dec(rate),
            deduction: deduction.map(dec),
        }
    }

    fn create_test_table() -> BracketTable {
        BracketTable {
            brackets: vec![
                bracket("0", Some("1903.98"), "0", Some("0")),
                bracket("1903.98", Some("2826.65"), "0.075", Some("142.80")),
                bracket("2826.65", None, "0.15", Some("354.80")),
            ],
        }
    }

    #[test]
    fn test_upper_bound_of_unbounded_bracket() {
        let b = bracket("4664.68", None, "0.275", Some("869.36"));
        assert_eq!(b.upper(), Decimal::MAX);
        assert!(b.contains(dec("1000000000")));
    }

    #[test]
    fn test_containing_prefers_lower_bracket_at_boundary() {
        let table = create_test_table();
        let at_boundary = table.containing(dec("1903.98")).unwrap();
        assert_eq!(at_boundary.rate, dec("0"));

        let above_boundary = table.containing(dec("1903.99")).unwrap();
        assert_eq!(above_boundary.rate, dec("0.075"));
    }

    #[test]
    fn test_containing_handles_zero_and_large_values() {
        let table = create_test_table();
        assert_eq!(table.containing(dec("0")).unwrap().rate, dec("0"));
        assert_eq!(table.containing(dec("99999")).unwrap().rate, dec("0.15"));
    }

    #[test]
    fn test_bracket_table_deserializes_from_plain_list() {
        let yaml = r#"
- min: 0
  max: 1412.00
  rate: 0.075
- min: 1412.00
  max: 2666.68
  rate: 0.09
"#;
        let table: BracketTable = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.brackets[0].deduction, None);
        assert_eq!(table.brackets[1].max, Some(dec("2666.68")));
    }

    #[test]
    fn test_unbounded_max_serializes_as_decimal_max() {
        let b = bracket("4664.68", None, "0.275", Some("869.36"));
        let json = serde_json::to_value(&b).unwrap();
        assert_eq!(
            json["max"],
            serde_json::to_value(Decimal::MAX).unwrap(),
            "formula scripts compare against bracket.max, so the snapshot needs a real number"
        );
    }

    #[test]
    fn test_fingerprint_is_stable_and_sensitive() {
        let config_yaml = r#"
income_tax_brackets:
  - { min: 0, max: 1903.98, rate: 0, deduction: 0 }
contribution_table:
  - { min: 0, max: 1412.00, rate: 0.075 }
deposit_rate: 0.08
deductions:
  transport_voucher: { enabled: true, rate: 0.06, max_amount: 0 }
  meal_voucher: { enabled: true, amount: 0 }
  food_voucher: { enabled: true, amount: 0 }
  health_plan: { enabled: false, amount: 0 }
  dependents: { deduction_per_dependent: 189.59 }
formulas:
  base_salary: "input.base_salary"
evaluation_order:
  - base_salary
"#;
        let config: PayrollConfig = serde_yaml::from_str(config_yaml).unwrap();
        let fingerprint = config.fingerprint();
        assert_eq!(fingerprint.len(), 64);
        assert_eq!(fingerprint, config.fingerprint());

        let mut edited = config.clone();
        edited.deposit_rate = dec("0.09");
        assert_ne!(fingerprint, edited.fingerprint());
    }
}
