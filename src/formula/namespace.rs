//! The restricted variable namespace formulas evaluate against.
//!
//! A [`Namespace`] holds read-only JSON snapshots of the employee input
//! and the payroll configuration, plus the results computed so far in the
//! current pass. Formulas can read these three roots and nothing else;
//! the snapshots are taken once per calculation, so an in-flight
//! evaluation never observes a configuration edit.

use rust_decimal::Decimal;
use serde_json::Value as JsonValue;

use crate::config::PayrollConfig;
use crate::models::EmployeeInput;

/// The outcome of resolving a dotted path against the namespace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution<'a> {
    /// The path resolved to a value.
    Value(&'a JsonValue),
    /// The root exists but some segment is absent.
    Missing,
    /// The base identifier is not a namespace root.
    UnknownRoot,
}

/// Read-only views of `input`, `config`, and `result` for one evaluation.
#[derive(Debug, Clone)]
pub struct Namespace {
    input: JsonValue,
    config: JsonValue,
    result: serde_json::Map<String, JsonValue>,
}

impl Namespace {
    /// Builds the namespace from immutable snapshots of the input and
    /// configuration. The `result` view starts empty; values become
    /// visible as [`Namespace::record_result`] is called between
    /// formulas.
    pub fn new(input: &EmployeeInput, config: &PayrollConfig) -> Self {
        Self {
            input: serde_json::to_value(input).expect("employee input serializes to JSON"),
            config: serde_json::to_value(config).expect("payroll configuration serializes to JSON"),
            result: serde_json::Map::new(),
        }
    }

    /// Makes a computed value visible to later formulas under `result.<name>`.
    pub fn record_result(&mut self, name: &str, value: Decimal) {
        // Decimals live as strings in the snapshots, same as serde writes
        // them, so lookups parse every number the same way.
        self.result
            .insert(name.to_string(), JsonValue::String(value.to_string()));
    }

    /// Resolves a dotted path against the three roots.
    ///
    /// `result` paths have exactly one segment (the formula name); deeper
    /// paths resolve as missing, matching the best-effort semantics of
    /// configuration access.
    pub fn resolve(&self, base: &str, segments: &[String]) -> Resolution<'_> {
        match base {
            "input" => walk(&self.input, segments),
            "config" => walk(&self.config, segments),
            "result" => match segments {
                [name] => self
                    .result
                    .get(name)
                    .map_or(Resolution::Missing, Resolution::Value),
                _ => Resolution::Missing,
            },
            _ => Resolution::UnknownRoot,
        }
    }
}

fn walk<'a>(root: &'a JsonValue, segments: &[String]) -> Resolution<'a> {
    let mut current = root;
    for segment in segments {
        match current.get(segment) {
            Some(next) => current = next,
            None => return Resolution::Missing,
        }
    }
    Resolution::Value(current)
}
