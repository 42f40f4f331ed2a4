//! Core data models for the paycheck calculation engine.
//!
//! This module contains all the domain models used throughout the engine.

mod employee_input;
mod result_set;

pub use employee_input::EmployeeInput;
pub use result_set::{EvaluationIssue, IssueSeverity, PaycheckResult, ResultSet};
