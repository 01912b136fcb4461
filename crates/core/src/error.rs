//! Error types shared across crates

use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Transport-level failure talking to the text-generation provider
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider answered with a non-2xx status
    #[error("Provider returned HTTP {status}: {body}")]
    ProviderStatus { status: u16, body: String },

    #[error("Provider timed out after {0:?}")]
    Timeout(Duration),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unknown form field: {section}.{field}")]
    UnknownField { section: String, field: String },

    #[error("Speech error: {0}")]
    Speech(String),
}

impl Error {
    /// Errors the extraction and classification paths recover from locally
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Provider(_) | Error::ProviderStatus { .. } | Error::Timeout(_) | Error::Parse(_)
        )
    }
}
