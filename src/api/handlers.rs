//! HTTP request handlers for the paycheck engine API.
//!
//! This module contains the handler functions for all API endpoints.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::post,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::calculation::calculate;
use crate::config::validate_bracket_table;
use crate::models::EmployeeInput;

use super::request::{CalculationRequest, ValidationRequest};
use super::response::{ApiError, ApiErrorResponse, ValidationResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/calculate", post(calculate_handler))
        .route("/validate-brackets", post(validate_brackets_handler))
        .with_state(state)
}

/// Handler for POST /calculate endpoint.
///
/// Accepts an employee input and returns the full paycheck breakdown
/// computed against the application's configuration.
async fn calculate_handler(
    State(state): State<AppState>,
    payload: Result<Json<CalculationRequest>, JsonRejection>,
) -> impl IntoResponse {
    // Generate correlation ID for request tracking
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing calculation request");

    let request = match reject_bad_json(payload, correlation_id) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let input: EmployeeInput = request.input.into();

    match calculate(&input, state.config()) {
        Ok(result) => {
            info!(
                correlation_id = %correlation_id,
                calculation_id = %result.calculation_id,
                issues = result.results.issues.len(),
                "Calculation completed successfully"
            );
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                Json(result),
            )
                .into_response()
        }
        Err(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "Calculation refused"
            );
            let api_error: ApiErrorResponse = err.into();
            (
                api_error.status,
                [(header::CONTENT_TYPE, "application/json")],
                Json(api_error.error),
            )
                .into_response()
        }
    }
}

/// Handler for POST /validate-brackets endpoint.
///
/// Checks a submitted bracket table against the structural invariants, so
/// a configuration editor can reject bad tables before persisting them.
/// The response reports the first violation found; a structurally bad
/// table is not an HTTP error.
async fn validate_brackets_handler(
    payload: Result<Json<ValidationRequest>, JsonRejection>,
) -> impl IntoResponse {
    let correlation_id = Uuid::new_v4();

    let request = match reject_bad_json(payload, correlation_id) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let response = match validate_bracket_table(&request.table(), request.kind) {
        Ok(()) => ValidationResponse::ok(),
        Err(violation) => {
            info!(
                correlation_id = %correlation_id,
                violation = %violation,
                "Bracket table rejected"
            );
            ValidationResponse::rejected(violation.to_string())
        }
    };

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        Json(response),
    )
        .into_response()
}

/// Maps a JSON extraction failure to a structured error response.
fn reject_bad_json<T>(
    payload: Result<Json<T>, JsonRejection>,
    correlation_id: Uuid,
) -> Result<T, axum::response::Response> {
    match payload {
        Ok(Json(request)) => Ok(request),
        Err(rejection) => {
            let error = match rejection {
                JsonRejection::JsonDataError(err) => {
                    // Get the body text which contains the detailed error from serde
                    let body_text = err.body_text();
                    warn!(
                        correlation_id = %correlation_id,
                        error = %body_text,
                        "JSON data error"
                    );
                    // Check if it's a missing field error
                    if body_text.contains("missing field") {
                        ApiError::new("VALIDATION_ERROR", body_text)
                    } else {
                        ApiError::malformed_json(body_text)
                    }
                }
                JsonRejection::JsonSyntaxError(err) => {
                    warn!(
                        correlation_id = %correlation_id,
                        error = %err,
                        "JSON syntax error"
                    );
                    ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
                }
                JsonRejection::MissingJsonContentType(_) => ApiError::new(
                    "MISSING_CONTENT_TYPE",
                    "Content-Type must be application/json",
                ),
                _ => ApiError::malformed_json("Failed to parse request body"),
            };
            Err((
                StatusCode::BAD_REQUEST,
                [(header::CONTENT_TYPE, "application/json")],
                Json(error),
            )
                .into_response())
        }
    }
}
