/// Error types for follower-service
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Graph store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Unexpected row shape from graph store: {0}")]
    MalformedRow(String),

    #[error("Graph store operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Could not connect to graph store after {attempts} attempts: {last_error}")]
    StartupConnectFailure { attempts: u32, last_error: String },

    #[error("Startup aborted by shutdown signal after {attempts} attempts")]
    StartupAborted { attempts: u32 },
}

impl GraphError {
    pub fn validation(msg: impl Into<String>) -> Self {
        GraphError::Validation(msg.into())
    }

    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        GraphError::StoreUnavailable(err.to_string())
    }

    /// Steady-state failures that surface to callers as internal errors.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(
            self,
            GraphError::StoreUnavailable(_) | GraphError::MalformedRow(_) | GraphError::Timeout(_)
        )
    }
}

impl From<neo4rs::Error> for GraphError {
    fn from(err: neo4rs::Error) -> Self {
        GraphError::StoreUnavailable(err.to_string())
    }
}

impl From<neo4rs::DeError> for GraphError {
    fn from(err: neo4rs::DeError) -> Self {
        GraphError::MalformedRow(err.to_string())
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl ResponseError for GraphError {
    fn error_response(&self) -> HttpResponse {
        let code = self.status_code();
        let message = match self {
            GraphError::Validation(msg) => msg.clone(),
            _ => self.to_string(),
        };

        HttpResponse::build(code).json(ErrorResponse {
            error: message,
            code: code.as_u16(),
        })
    }

    fn status_code(&self) -> StatusCode {
        match self {
            GraphError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Result type alias for graph operations
pub type GraphResult<T> = Result<T, GraphError>;
