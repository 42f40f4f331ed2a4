//! The formula dependency graph and its single-pass evaluation.
//!
//! Building a [`FormulaGraph`] compiles every formula body and statically
//! checks the evaluation order, so a configuration with a forward
//! reference or a cycle is rejected before any calculation runs. Running
//! the graph walks the order once: each formula sees only previously
//! computed `result.*` names, failures degrade the one field to zero, and
//! the run always completes.

use std::collections::{BTreeMap, HashSet};

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::warn;

use crate::config::PayrollConfig;
use crate::error::{EngineError, EngineResult};
use crate::formula::{EvalError, Namespace, Program, evaluate};
use crate::models::{EmployeeInput, EvaluationIssue, IssueSeverity, ResultSet};

/// A formula body after compilation.
///
/// A body that fails to parse stays in the graph as a broken entry: by
/// contract a single bad formula degrades its own field at run time
/// instead of failing the whole configuration.
#[derive(Debug, Clone)]
enum CompiledFormula {
    Ready(Program),
    Broken(EvalError),
}

/// The named formulas plus the fixed order they are evaluated in.
#[derive(Debug, Clone)]
pub struct FormulaGraph {
    order: Vec<String>,
    formulas: BTreeMap<String, CompiledFormula>,
}

impl FormulaGraph {
    /// Compiles the configuration's formulas and checks the evaluation
    /// order.
    ///
    /// # Errors
    ///
    /// - [`EngineError::MissingSection`] if the formula map or the
    ///   evaluation order is empty;
    /// - [`EngineError::UnknownFormula`] if the order names a formula
    ///   with no body;
    /// - [`EngineError::ForwardReference`] if a formula reads a
    ///   `result.*` name that is not computed strictly earlier in the
    ///   order (this also rejects every dependency cycle).
    pub fn build(config: &PayrollConfig) -> EngineResult<Self> {
        if config.formulas.is_empty() {
            return Err(EngineError::MissingSection {
                section: "formulas".to_string(),
            });
        }
        if config.evaluation_order.is_empty() {
            return Err(EngineError::MissingSection {
                section: "evaluation_order".to_string(),
            });
        }

        let mut formulas = BTreeMap::new();
        for (name, body) in &config.formulas {
            let compiled = match Program::parse(body) {
                Ok(program) => CompiledFormula::Ready(program),
                Err(error) => CompiledFormula::Broken(error),
            };
            formulas.insert(name.clone(), compiled);
        }

        let mut computed: HashSet<&str> = HashSet::new();
        for name in &config.evaluation_order {
            let formula = formulas
                .get(name)
                .ok_or_else(|| EngineError::UnknownFormula { name: name.clone() })?;

            if let CompiledFormula::Ready(program) = formula {
                for dependency in program.result_references() {
                    if !computed.contains(dependency.as_str()) {
                        return Err(EngineError::ForwardReference {
                            formula: name.clone(),
                            dependency,
                        });
                    }
                }
            }
            computed.insert(name);
        }

        Ok(Self {
            order: config.evaluation_order.clone(),
            formulas,
        })
    }

    /// The evaluation order the graph was built with.
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Evaluates every formula once, in order, and rounds the results.
    ///
    /// The namespace's `result` view grows as the walk proceeds, so later
    /// names are invisible to earlier formulas. A failing formula records
    /// an [`IssueSeverity::Error`] issue and degrades to `0`; missing
    /// namespace paths record [`IssueSeverity::Warning`] issues. After
    /// the full pass every value is rounded to 2 decimal places, half
    /// away from zero.
    pub fn run_all(&self, input: &EmployeeInput, config: &PayrollConfig) -> ResultSet {
        let mut namespace = Namespace::new(input, config);
        let mut values = BTreeMap::new();
        let mut issues = Vec::new();

        for name in &self.order {
            let value = match self.formulas.get(name) {
                Some(CompiledFormula::Ready(program)) => match evaluate(program, &namespace) {
                    Ok(outcome) => {
                        for warning in outcome.warnings {
                            issues.push(EvaluationIssue {
                                formula: name.clone(),
                                severity: IssueSeverity::Warning,
                                message: warning,
                            });
                        }
                        outcome.value
                    }
                    Err(error) => {
                        warn!(formula = %name, error = %error, "formula failed; field degraded to 0");
                        issues.push(EvaluationIssue {
                            formula: name.clone(),
                            severity: IssueSeverity::Error,
                            message: error.to_string(),
                        });
                        Decimal::ZERO
                    }
                },
                Some(CompiledFormula::Broken(error)) => {
                    warn!(formula = %name, error = %error, "formula body does not parse; field degraded to 0");
                    issues.push(EvaluationIssue {
                        formula: name.clone(),
                        severity: IssueSeverity::Error,
                        message: error.to_string(),
                    });
                    Decimal::ZERO
                }
                // Unreachable after build(), kept total for safety.
                None => Decimal::ZERO,
            };

            namespace.record_result(name, value);
            values.insert(name.clone(), value);
        }

        for value in values.values_mut() {
            *value = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        }

        ResultSet { values, issues }
    }
}
