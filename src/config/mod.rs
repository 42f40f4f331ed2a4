//! Configuration loading, types, and validation for the paycheck engine.
//!
//! This module provides the strongly-typed payroll configuration (bracket
//! tables, deduction rules, formula definitions), the YAML loader, and the
//! structural bracket-table validator that guards the configuration-update
//! path.
//!
//! # Example
//!
//! ```no_run
//! use paycheck_engine::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load("./config/brazil_clt").unwrap();
//! println!("formulas: {}", loader.config().formulas.len());
//! ```

mod loader;
mod types;
mod validator;

pub use loader::ConfigLoader;
pub use types::{
    BenefitAmount, BenefitRate, Bracket, BracketTable, DeductionRules, DependentAllowance,
    PayrollConfig, TableKind,
};
pub use validator::{BracketValidationError, validate_bracket_table};
