//! Request types for the paycheck engine API.
//!
//! This module defines the JSON request structures for the `/calculate`
//! and `/validate-brackets` endpoints.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{Bracket, BracketTable, TableKind};
use crate::models::EmployeeInput;

/// Request body for the `/calculate` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationRequest {
    /// The employee input for the calculation.
    pub input: EmployeeInputRequest,
}

/// Employee input in a calculation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeInputRequest {
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

impl From<EmployeeInputRequest> for EmployeeInput {
    fn from(req: EmployeeInputRequest) -> Self {
        EmployeeInput {
            employee_name: req.employee_name,
            base_salary: req.base_salary,
            dependents_count: req.dependents_count,
            reference_month: req.reference_month,
        }
    }
}

/// Request body for the `/validate-brackets` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRequest {
    /// Which calculation model the table is intended for.
    pub kind: TableKind,
    /// The brackets to validate.
    pub brackets: Vec<Bracket>,
}

impl ValidationRequest {
    /// Assembles the submitted brackets into a table.
    pub fn table(&self) -> BracketTable {
        BracketTable {
            brackets: self.brackets.clone(),
        }
    }
}
