//! Protocol-level errors: a stable machine-readable code, a human-readable
//! message, and the HTTP status the transport should use.

use orgsim_core::SimError;
use serde::Serialize;
use thiserror::Error;

#[derive(Clone, Debug, Error, Serialize)]
#[error("{code}: {message}")]
pub struct ApiError {
    pub code:        &'static str,
    pub message:     String,
    #[serde(skip)]
    pub http_status: u16,
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self { code: "not_found", message: message.into(), http_status: 404 }
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self { code: "invalid_params", message: message.into(), http_status: 400 }
    }

    pub fn not_running() -> Self {
        Self {
            code:        "not_running",
            message:     "no simulation is running".into(),
            http_status: 409,
        }
    }

    pub fn already_running() -> Self {
        Self {
            code:        "already_running",
            message:     "a simulation is already running".into(),
            http_status: 409,
        }
    }
}

impl From<SimError> for ApiError {
    fn from(e: SimError) -> Self {
        let (code, http_status) = match &e {
            SimError::UnknownAgent(_) => ("unknown_agent", 404),
            SimError::UnknownCommunication(_) | SimError::UnknownTopic(_) => ("not_found", 404),
            SimError::InvalidArgument(_) => ("invalid_params", 400),
            SimError::AlreadyRunning => ("already_running", 409),
            SimError::NotRunning => ("not_running", 409),
            SimError::Overloaded => ("overloaded", 503),
            SimError::Internal(_) => ("internal", 500),
        };
        Self { code, message: e.to_string(), http_status }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
