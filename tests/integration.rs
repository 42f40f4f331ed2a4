//! Integration tests for the paycheck calculation engine.
//!
//! This test suite covers the full gross-to-net scenarios against the
//! shipped Brazil CLT 2024 configuration, including:
//! - Contribution and income-tax calculation across brackets
//! - Exemption below the income-tax threshold
//! - Dependent allowance
//! - Missing-path defaulting with recorded warnings
//! - Bracket table validation over HTTP
//! - Structurally broken configurations
//! - Idempotence of the result values

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use std::str::FromStr;
use tower::ServiceExt;

use paycheck_engine::api::{AppState, create_router};
use paycheck_engine::calculation::{apply_progressive, apply_with_deduction, calculate};
use paycheck_engine::config::{ConfigLoader, PayrollConfig};
use paycheck_engine::models::EmployeeInput;

// =============================================================================
// Test Helpers
// =============================================================================

fn load_default_config() -> PayrollConfig {
    ConfigLoader::load("./config/brazil_clt")
        .expect("Failed to load config")
        .into_config()
}

fn create_router_for_test() -> Router {
    create_router(AppState::new(load_default_config()))
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn create_input(base_salary: &str, dependents_count: u32) -> EmployeeInput {
    EmployeeInput {
        employee_name: "Ana Souza".to_string(),
        base_salary: dec(base_salary),
        dependents_count,
        reference_month: "2024-06".to_string(),
    }
}

async fn post_json(router: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

fn calculate_request(base_salary: &str, dependents_count: u32) -> Value {
    json!({
        "input": {
            "employee_name": "Ana Souza",
            "base_salary": base_salary,
            "dependents_count": dependents_count,
            "reference_month": "2024-06"
        }
    })
}

/// Reads one value out of the response's results map.
fn result_value(body: &Value, name: &str) -> Decimal {
    let raw = body["results"]["values"][name]
        .as_str()
        .unwrap_or_else(|| panic!("missing result value '{}'", name));
    Decimal::from_str(raw).unwrap()
}

// =============================================================================
// Gross-to-net scenarios (library level)
// =============================================================================

#[test]
fn test_scenario_base_3000_no_dependents() {
    let config = load_default_config();
    let result = calculate(&create_input("3000.00", 0), &config).unwrap();
    let results = &result.results;

    assert_eq!(results.get("base_salary"), Some(dec("3000.00")));
    assert_eq!(results.get("contribution_base"), Some(dec("3000.00")));
    // 1412.00*0.075 + (2666.68-1412.00)*0.09 + (3000-2666.68)*0.12
    assert_eq!(results.get("contribution_value"), Some(dec("258.82")));
    assert_eq!(results.get("dependents_deduction"), Some(dec("0.00")));
    assert_eq!(results.get("income_tax_base"), Some(dec("2741.18")));
    // 2741.1804 * 0.075 - 142.80, rounded
    assert_eq!(results.get("income_tax_value"), Some(dec("62.79")));
    assert_eq!(results.get("deposit_value"), Some(dec("240.00")));
    assert_eq!(results.get("transport_voucher_value"), Some(dec("180.00")));
    assert_eq!(results.get("total_deductions"), Some(dec("501.61")));
    assert_eq!(results.get("net_salary"), Some(dec("2498.39")));
    assert_eq!(results.get("total_employer_cost"), Some(dec("3240.00")));
    assert!(results.issues.is_empty());
}

#[test]
fn test_scenario_base_1800_is_exempt_from_income_tax() {
    let config = load_default_config();
    let result = calculate(&create_input("1800.00", 0), &config).unwrap();
    let results = &result.results;

    // 1412.00*0.075 + (1800-1412.00)*0.09
    assert_eq!(results.get("contribution_value"), Some(dec("140.82")));
    // 1659.18 is below the 1903.98 exemption threshold.
    assert_eq!(results.get("income_tax_value"), Some(dec("0.00")));
    assert_eq!(results.get("net_salary"), Some(dec("1551.18")));
}

#[test]
fn test_scenario_dependents_reduce_the_taxable_base() {
    let config = load_default_config();
    let result = calculate(&create_input("3000.00", 2), &config).unwrap();
    let results = &result.results;

    assert_eq!(results.get("dependents_deduction"), Some(dec("379.18")));
    // 3000 - 258.8196 - 379.18
    assert_eq!(results.get("income_tax_base"), Some(dec("2362.00")));
    // 2362.0004 * 0.075 - 142.80, rounded
    assert_eq!(results.get("income_tax_value"), Some(dec("34.35")));
}

#[test]
fn test_scenario_salary_above_contribution_ceiling() {
    let config = load_default_config();
    let result = calculate(&create_input("10000.00", 0), &config).unwrap();
    let results = &result.results;

    assert_eq!(results.get("contribution_base"), Some(dec("7786.02")));
    // The contribution stops growing at the table ceiling.
    let ceiling = calculate(&create_input("7786.02", 0), &config).unwrap();
    assert_eq!(
        results.get("contribution_value"),
        ceiling.results.get("contribution_value")
    );
    // 10000 falls in the unbounded 27.5% bracket.
    assert!(results.get("income_tax_value").unwrap() > dec("1000"));
}

#[test]
fn test_default_formulas_agree_with_bracket_operations() {
    let config = load_default_config();
    for salary in ["1500.00", "2500.00", "3000.00", "5000.00", "9000.00"] {
        let result = calculate(&create_input(salary, 0), &config).unwrap();
        let results = &result.results;

        let base = dec(salary).min(dec("7786.02"));
        let expected_contribution = apply_progressive(base, &config.contribution_table);
        assert_eq!(
            results.get("contribution_value"),
            Some(round2(expected_contribution)),
            "contribution mismatch for salary {}",
            salary
        );

        let tax_base = dec(salary) - expected_contribution;
        let expected_tax = apply_with_deduction(tax_base, &config.income_tax_brackets);
        assert_eq!(
            results.get("income_tax_value"),
            Some(round2(expected_tax)),
            "income tax mismatch for salary {}",
            salary
        );
    }
}

fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

#[test]
fn test_missing_config_path_degrades_to_zero_and_completes() {
    let mut config = load_default_config();
    config.formulas.insert(
        "experimental_levy".to_string(),
        "input.base_salary * config.missing_field.rate".to_string(),
    );
    config
        .evaluation_order
        .push("experimental_levy".to_string());

    let result = calculate(&create_input("3000.00", 0), &config).unwrap();
    let results = &result.results;

    assert_eq!(results.get("experimental_levy"), Some(dec("0.00")));
    let issue = results.issues_for("experimental_levy").next().unwrap();
    assert!(issue.message.contains("config.missing_field.rate"));
    // The rest of the paycheck is unaffected.
    assert_eq!(results.get("net_salary"), Some(dec("2498.39")));
}

#[test]
fn test_calculation_is_idempotent() {
    let config = load_default_config();
    let input = create_input("3000.00", 1);

    let first = calculate(&input, &config).unwrap();
    let second = calculate(&input, &config).unwrap();

    assert_eq!(first.results, second.results);
    assert_eq!(
        serde_json::to_string(&first.results).unwrap(),
        serde_json::to_string(&second.results).unwrap()
    );
}

// =============================================================================
// HTTP endpoint tests
// =============================================================================

#[tokio::test]
async fn test_calculate_endpoint_returns_full_breakdown() {
    let (status, body) = post_json(
        create_router_for_test(),
        "/calculate",
        calculate_request("3000.00", 0),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(result_value(&body, "contribution_value"), dec("258.82"));
    assert_eq!(result_value(&body, "income_tax_value"), dec("62.79"));
    assert_eq!(result_value(&body, "net_salary"), dec("2498.39"));
    assert!(body["calculation_id"].is_string());
    assert_eq!(body["config_fingerprint"].as_str().unwrap().len(), 64);
    assert_eq!(body["input"]["employee_name"], "Ana Souza");
}

#[tokio::test]
async fn test_calculate_endpoint_rejects_negative_salary() {
    let (status, body) = post_json(
        create_router_for_test(),
        "/calculate",
        calculate_request("-100.00", 0),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");
    assert!(body["message"].as_str().unwrap().contains("base_salary"));
}

#[tokio::test]
async fn test_calculate_endpoint_rejects_missing_field() {
    let (status, body) = post_json(
        create_router_for_test(),
        "/calculate",
        json!({ "input": { "employee_name": "Ana Souza" } }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_calculate_endpoint_refuses_incomplete_configuration() {
    let mut config = load_default_config();
    config.formulas.clear();
    let router = create_router(AppState::new(config));

    let (status, body) = post_json(router, "/calculate", calculate_request("3000.00", 0)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "INCOMPLETE_CONFIGURATION");
    assert!(body["message"].as_str().unwrap().contains("formulas"));
}

#[tokio::test]
async fn test_calculate_endpoint_refuses_misordered_configuration() {
    let mut config = load_default_config();
    // net_salary reads total_deductions, which now runs after it.
    let order = &mut config.evaluation_order;
    let net = order.iter().position(|n| n == "net_salary").unwrap();
    let total = order.iter().position(|n| n == "total_deductions").unwrap();
    order.swap(net, total);
    let router = create_router(AppState::new(config));

    let (status, body) = post_json(router, "/calculate", calculate_request("3000.00", 0)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "FORWARD_REFERENCE");
}

#[tokio::test]
async fn test_validate_endpoint_accepts_contiguous_table() {
    let (status, body) = post_json(
        create_router_for_test(),
        "/validate-brackets",
        json!({
            "kind": "progressive",
            "brackets": [
                { "min": "0", "max": "1412.00", "rate": "0.075" },
                { "min": "1412.00", "max": "2666.68", "rate": "0.09" }
            ]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "valid": true }));
}

#[tokio::test]
async fn test_validate_endpoint_rejects_gap_naming_bracket_2() {
    let (status, body) = post_json(
        create_router_for_test(),
        "/validate-brackets",
        json!({
            "kind": "progressive",
            "brackets": [
                { "min": "0", "max": "1000", "rate": "0.1" },
                { "min": "1001", "max": "2000", "rate": "0.2" }
            ]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], json!(false));
    assert!(body["error"].as_str().unwrap().contains("bracket 2"));
}

#[tokio::test]
async fn test_validate_endpoint_rejects_missing_deduction_for_income_tax() {
    let (status, body) = post_json(
        create_router_for_test(),
        "/validate-brackets",
        json!({
            "kind": "with_deduction",
            "brackets": [
                { "min": "0", "max": "1903.98", "rate": "0" }
            ]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], json!(false));
    assert!(body["error"].as_str().unwrap().contains("deduction"));
}

#[tokio::test]
async fn test_endpoints_share_one_configuration_snapshot() {
    let router = create_router_for_test();

    let (_, first) = post_json(router.clone(), "/calculate", calculate_request("3000.00", 0)).await;
    let (_, second) = post_json(router, "/calculate", calculate_request("3000.00", 0)).await;

    assert_eq!(first["config_fingerprint"], second["config_fingerprint"]);
    assert_eq!(first["results"]["values"], second["results"]["values"]);
    assert_ne!(first["calculation_id"], second["calculation_id"]);
}
