//! Provider health as tracked per conversation

use serde::{Deserialize, Serialize};

/// Number of error messages retained in `last_errors`
pub const MAX_RECORDED_ERRORS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderStatus {
    Ready,
    Processing,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderHealth {
    pub status: ProviderStatus,
    pub last_errors: Vec<String>,
}

impl Default for ProviderHealth {
    fn default() -> Self {
        Self {
            status: ProviderStatus::Ready,
            last_errors: Vec::new(),
        }
    }
}

impl ProviderHealth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Health at startup given configuration validation errors
    pub fn from_config_errors(errors: &[String]) -> Self {
        let mut health = Self::default();
        if !errors.is_empty() {
            health.status = ProviderStatus::Error;
            for error in errors {
                health.record_error(error.clone());
            }
        }
        health
    }

    pub fn begin_turn(&mut self) {
        self.status = ProviderStatus::Processing;
    }

    pub fn complete_turn(&mut self) {
        self.status = ProviderStatus::Ready;
    }

    pub fn fail_turn(&mut self, message: impl Into<String>) {
        self.status = ProviderStatus::Error;
        self.record_error(message);
    }

    /// Remember an error without changing the status
    pub fn record_error(&mut self, message: impl Into<String>) {
        self.last_errors.push(message.into());
        if self.last_errors.len() > MAX_RECORDED_ERRORS {
            let overflow = self.last_errors.len() - MAX_RECORDED_ERRORS;
            self.last_errors.drain(..overflow);
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == ProviderStatus::Ready
    }
}
