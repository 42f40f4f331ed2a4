//! HTTP API module for the paycheck calculation engine.
//!
//! This module provides the REST endpoints consumed by external
//! collaborators: `/calculate` for running a paycheck breakdown and
//! `/validate-brackets` for checking an edited bracket table before it
//! is persisted.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{CalculationRequest, EmployeeInputRequest, ValidationRequest};
pub use response::{ApiError, ValidationResponse};
pub use state::AppState;
