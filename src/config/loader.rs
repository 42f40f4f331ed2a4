//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading payroll
//! configurations from YAML files. Loading is the configuration-update
//! path: both bracket tables and the formula evaluation order are
//! validated here, so the calculation path can trust the configuration it
//! receives.

use std::fs;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::calculation::FormulaGraph;
use crate::error::{EngineError, EngineResult};

use super::types::{BracketTable, DeductionRules, PayrollConfig, TableKind};
use super::validator::validate_bracket_table;

/// Tax and contribution tables file structure (`tables.yaml`).
#[derive(Debug, Clone, Deserialize)]
struct TablesConfig {
    income_tax_brackets: BracketTable,
    contribution_table: BracketTable,
    deposit_rate: Decimal,
}

/// Formula definitions file structure (`formulas.yaml`).
#[derive(Debug, Clone, Deserialize)]
struct FormulasConfig {
    evaluation_order: Vec<String>,
    formulas: std::collections::BTreeMap<String, String>,
}

/// Loads and provides access to a payroll configuration.
///
/// # Directory Structure
///
/// The configuration directory should have the following structure:
/// ```text
/// config/brazil_clt/
/// ├── tables.yaml      # Tax brackets, contribution table, deposit rate
/// ├── deductions.yaml  # Benefit deduction rules, dependent allowance
/// └── formulas.yaml    # Formula bodies and evaluation order
/// ```
///
/// # Example
///
/// ```no_run
/// use paycheck_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/brazil_clt").unwrap();
/// println!("deposit rate: {}", loader.config().deposit_rate);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: PayrollConfig,
}

impl ConfigLoader {
    /// Loads and validates configuration from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration directory (e.g., "./config/brazil_clt")
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - Any required file is missing or contains invalid YAML
    /// - Either bracket table fails structural validation
    /// - The formula set or evaluation order is structurally broken
    ///   (empty, unknown names, forward references)
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let tables = Self::load_yaml::<TablesConfig>(&path.join("tables.yaml"))?;
        let deductions = Self::load_yaml::<DeductionRules>(&path.join("deductions.yaml"))?;
        let formulas = Self::load_yaml::<FormulasConfig>(&path.join("formulas.yaml"))?;

        validate_bracket_table(&tables.income_tax_brackets, TableKind::WithDeduction).map_err(
            |source| EngineError::InvalidBracketTable {
                table: "income_tax_brackets".to_string(),
                source,
            },
        )?;
        validate_bracket_table(&tables.contribution_table, TableKind::Progressive).map_err(
            |source| EngineError::InvalidBracketTable {
                table: "contribution_table".to_string(),
                source,
            },
        )?;

        let config = PayrollConfig {
            income_tax_brackets: tables.income_tax_brackets,
            contribution_table: tables.contribution_table,
            deposit_rate: tables.deposit_rate,
            deductions,
            formulas: formulas.formulas,
            evaluation_order: formulas.evaluation_order,
        };

        // Rejects empty formula sets, unknown names in the order, and
        // forward references, before the configuration is accepted.
        FormulaGraph::build(&config)?;

        Ok(Self { config })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the loaded configuration.
    pub fn config(&self) -> &PayrollConfig {
        &self.config
    }

    /// Consumes the loader and returns the configuration.
    pub fn into_config(self) -> PayrollConfig {
        self.config
    }
}
