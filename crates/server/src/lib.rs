//! FIR Assistant Server
//!
//! HTTP endpoints over conversations: submit utterances, edit form fields,
//! read the form, tags and classification.

pub mod http;
pub mod metrics;
pub mod session;
pub mod state;

pub use http::create_router;
pub use metrics::{init_metrics, record_turn};
pub use session::{Session, SessionManager};
pub use state::AppState;

use thiserror::Error;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Session error: {0}")]
    Session(String),

    #[error("Session limit reached")]
    SessionLimit,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ServerError> for axum::http::StatusCode {
    fn from(err: ServerError) -> Self {
        match err {
            ServerError::Session(_) => axum::http::StatusCode::NOT_FOUND,
            ServerError::SessionLimit => axum::http::StatusCode::SERVICE_UNAVAILABLE,
            ServerError::InvalidRequest(_) => axum::http::StatusCode::BAD_REQUEST,
            ServerError::Internal(_) => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<fir_assist_agent::AgentError> for ServerError {
    fn from(err: fir_assist_agent::AgentError) -> Self {
        use fir_assist_agent::AgentError;
        match err {
            AgentError::EmptyUtterance => ServerError::InvalidRequest(err.to_string()),
            AgentError::Core(fir_assist_core::Error::UnknownField { .. }) => {
                ServerError::InvalidRequest(err.to_string())
            },
            other => ServerError::Internal(other.to_string()),
        }
    }
}
