//! Error types for the paycheck calculation engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all fatal error conditions. Recoverable per-formula failures are a
//! separate type, [`crate::formula::EvalError`], because they degrade a
//! single field instead of failing the calculation.

use thiserror::Error;

use crate::config::BracketValidationError;

/// The main error type for the paycheck calculation engine.
///
/// All fatal operations in the engine return this error type, making it
/// easy to handle errors consistently throughout the application.
///
/// # Example
///
/// ```
/// use paycheck_engine::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/file.yaml".to_string(),
/// };
/// assert_eq!(error.to_string(), "Configuration file not found: /missing/file.yaml");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A bracket table failed structural validation.
    #[error("Invalid bracket table '{table}': {source}")]
    InvalidBracketTable {
        /// Which table failed (e.g., "income_tax_brackets").
        table: String,
        /// The underlying validation failure.
        #[source]
        source: BracketValidationError,
    },

    /// The configuration is missing a required section.
    ///
    /// This is fatal for a calculation: a structurally incomplete
    /// configuration must be refused rather than calculated with defaults.
    #[error("Configuration is missing required section: {section}")]
    MissingSection {
        /// The missing section (e.g., "formulas", "evaluation_order").
        section: String,
    },

    /// The evaluation order names a formula that does not exist.
    #[error("Evaluation order references unknown formula: {name}")]
    UnknownFormula {
        /// The formula name that was not found.
        name: String,
    },

    /// A formula depends on a result that is not computed before it.
    #[error(
        "Formula '{formula}' references 'result.{dependency}' before it is computed in the evaluation order"
    )]
    ForwardReference {
        /// The formula containing the premature reference.
        formula: String,
        /// The referenced result name.
        dependency: String,
    },

    /// An input field was invalid or contained inconsistent data.
    #[error("Invalid input field '{field}': {message}")]
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
