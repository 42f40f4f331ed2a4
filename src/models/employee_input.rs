//! Employee input model.
//!
//! This module defines the per-calculation input snapshot. Fields arrive
//! already parsed (currency masking and form handling are external
//! concerns) and are immutable for the duration of one evaluation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The per-employee input for a single paycheck calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeInput {
    /// The employee's display name.
    pub employee_name: String,
    /// The gross base salary for the reference month.
    pub base_salary: Decimal,
    /// Number of dependents counted for the dependent allowance.
    #[serde(default)]
    pub dependents_count: u32,
    /// The reference month in `YYYY-MM` form.
    pub reference_month: String,
}

impl EmployeeInput {
    /// Returns true if the reference month has the expected `YYYY-MM` shape.
    ///
    /// # Examples
    ///
    /// ```
    /// use paycheck_engine::models::EmployeeInput;
    /// use rust_decimal::Decimal;
    ///
    /// let input = EmployeeInput {
    ///     employee_name: "Ana Souza".to_string(),
    ///     base_salary: Decimal::new(300000, 2),
    ///     dependents_count: 0,
    ///     reference_month: "2024-06".to_string(),
    /// };
    /// assert!(input.has_valid_reference_month());
    /// ```
    pub fn has_valid_reference_month(&self) -> bool {
        let bytes = self.reference_month.as_bytes();
        bytes.len() == 7
            && bytes[..4].iter().all(u8::is_ascii_digit)
            && bytes[4] == b'-'
            && bytes[5..].iter().all(u8::is_ascii_digit)
    }
}
