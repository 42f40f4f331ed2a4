//! Paycheck calculation orchestration.
//!
//! Thin layer over [`FormulaGraph`]: prepares the graph (fatal on a
//! structurally broken configuration), runs it, and packages the result
//! set with its audit metadata. The result set value is a pure function
//! of the input and configuration; only the envelope's id and timestamp
//! differ between calls.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::config::PayrollConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{EmployeeInput, PaycheckResult};

use super::graph::FormulaGraph;

/// Calculates a full paycheck breakdown for one employee.
///
/// # Errors
///
/// Fails only on structural problems: a negative base salary
/// ([`EngineError::InvalidInput`]) or a configuration whose formula set
/// or evaluation order is broken (see [`FormulaGraph::build`]). A
/// configuration that is structurally sound but contains failing formula
/// bodies still succeeds, with the affected fields zeroed and recorded as
/// issues on the result set.
///
/// # Example
///
/// ```no_run
/// use paycheck_engine::calculation::calculate;
/// use paycheck_engine::config::ConfigLoader;
/// use paycheck_engine::models::EmployeeInput;
/// use rust_decimal::Decimal;
///
/// let loader = ConfigLoader::load("./config/brazil_clt").unwrap();
/// let input = EmployeeInput {
///     employee_name: "Ana Souza".to_string(),
///     base_salary: Decimal::new(300000, 2),
///     dependents_count: 0,
///     reference_month: "2024-06".to_string(),
/// };
/// let result = calculate(&input, loader.config()).unwrap();
/// println!("net: {}", result.results.get("net_salary").unwrap());
/// ```
pub fn calculate(input: &EmployeeInput, config: &PayrollConfig) -> EngineResult<PaycheckResult> {
    if input.base_salary < Decimal::ZERO {
        return Err(EngineError::InvalidInput {
            field: "base_salary".to_string(),
            message: "cannot be negative".to_string(),
        });
    }

    let graph = FormulaGraph::build(config)?;
    let results = graph.run_all(input, config);

    info!(
        reference_month = %input.reference_month,
        formulas = graph.order().len(),
        issues = results.issues.len(),
        "paycheck calculated"
    );

    Ok(PaycheckResult {
        calculation_id: Uuid::new_v4(),
        timestamp: Utc::now(),
        engine_version: env!("CARGO_PKG_VERSION").to_string(),
        input: input.clone(),
        config_fingerprint: config.fingerprint(),
        results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn create_test_input(base_salary: &str) -> EmployeeInput {
        EmployeeInput {
            employee_name: "Ana Souza".to_string(),
            base_salary: dec(base_salary),
            dependents_count: 0,
            reference_month: "2024-06".to_string(),
        }
    }

    fn create_test_config() -> PayrollConfig {
        serde_yaml::from_str(
            r#"
income_tax_brackets:
  - { min: 0, max: null, rate: 0, deduction: 0 }
contribution_table:
  - { min: 0, max: 7786.02, rate: 0.075 }
deposit_rate: 0.08
deductions:
  transport_voucher: { enabled: false, rate: 0.06, max_amount: 0 }
  meal_voucher: { enabled: false, amount: 0 }
  food_voucher: { enabled: false, amount: 0 }
  health_plan: { enabled: false, amount: 0 }
  dependents: { deduction_per_dependent: 189.59 }
formulas:
  base_salary: "input.base_salary"
  deposit_value: "input.base_salary * config.deposit_rate"
  net_salary: "result.base_salary - result.deposit_value"
evaluation_order:
  - base_salary
  - deposit_value
  - net_salary
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_calculate_produces_envelope_with_fingerprint() {
        let config = create_test_config();
        let result = calculate(&create_test_input("2000.00"), &config).unwrap();

        assert_eq!(result.engine_version, env!("CARGO_PKG_VERSION"));
        assert_eq!(result.config_fingerprint, config.fingerprint());
        assert_eq!(result.input.base_salary, dec("2000.00"));
        assert_eq!(result.results.get("deposit_value"), Some(dec("160.00")));
        assert_eq!(result.results.get("net_salary"), Some(dec("1840.00")));
    }

    #[test]
    fn test_calculate_is_idempotent_on_result_values() {
        let config = create_test_config();
        let input = create_test_input("3000.00");

        let first = calculate(&input, &config).unwrap();
        let second = calculate(&input, &config).unwrap();

        // The result sets are value-identical; only the envelope's id and
        // timestamp differ.
        assert_eq!(first.results, second.results);
        assert_eq!(first.config_fingerprint, second.config_fingerprint);
        assert_ne!(first.calculation_id, second.calculation_id);
    }

    #[test]
    fn test_calculate_rejects_negative_base_salary() {
        let config = create_test_config();
        let result = calculate(&create_test_input("-1.00"), &config);
        assert!(matches!(
            result,
            Err(EngineError::InvalidInput { field, .. }) if field == "base_salary"
        ));
    }

    #[test]
    fn test_calculate_refuses_structurally_broken_config() {
        let mut config = create_test_config();
        config.formulas.clear();
        let result = calculate(&create_test_input("3000.00"), &config);
        assert!(matches!(
            result,
            Err(EngineError::MissingSection { section }) if section == "formulas"
        ));
    }

    #[test]
    fn test_calculate_succeeds_with_degraded_formula() {
        let mut config = create_test_config();
        config
            .formulas
            .insert("deposit_value".to_string(), "1 / 0".to_string());

        let result = calculate(&create_test_input("2000.00"), &config).unwrap();
        assert_eq!(result.results.get("deposit_value"), Some(Decimal::ZERO));
        // net_salary now subtracts the degraded zero.
        assert_eq!(result.results.get("net_salary"), Some(dec("2000.00")));
        assert!(!result.results.issues.is_empty());
    }
}
