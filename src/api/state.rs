//! Application state for the paycheck engine API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use crate::config::PayrollConfig;

/// Shared application state.
///
/// Holds the payroll configuration behind an `Arc`: handlers read it as
/// an immutable snapshot, so concurrent calculations against the same
/// configuration are safe.
#[derive(Clone)]
pub struct AppState {
    /// The active payroll configuration.
    config: Arc<PayrollConfig>,
}

impl AppState {
    /// Creates a new application state with the given configuration.
    pub fn new(config: PayrollConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &PayrollConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_is_clone() {
        // Verify AppState can be cloned (required for axum state)
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }
}
