//! Error taxonomy for the feature pipelines.
//!
//! Every failure inside a feature pipeline collapses into [`AgentError`] at the
//! handler boundary and is converted there into the uniform `{"detail": ...}`
//! envelope. Nothing is retried or recovered locally.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Filling a prompt template failed.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no value supplied for placeholder '{name}'")]
    MissingField { name: String },

    #[error("unterminated placeholder starting at byte {at}")]
    UnterminatedPlaceholder { at: usize },
}

/// The outbound call to the completion backend failed or produced an unusable
/// reply.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("request to completion backend failed: {0}")]
    Transport(Box<dyn std::error::Error + Send + Sync>),

    #[error("completion backend returned status {status}")]
    Status { status: u16 },

    #[error("completion backend reply was not a chat completion: {0}")]
    Envelope(#[source] serde_json::Error),

    #[error("completion backend reply carried no message content")]
    MissingContent,

    #[error("completion backend did not reply within {0} seconds")]
    Timeout(u64),
}

/// Coercing raw model text into a schema-conformant value failed.
///
/// `Malformed` carries a bounded excerpt of the offending text rather than the
/// full reply, so error payloads stay small no matter what the model sent.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("reply was not valid JSON: {source}. Reply content: {excerpt}")]
    Malformed {
        #[source]
        source: serde_json::Error,
        excerpt: String,
    },

    #[error("expected {expected} at the top level, got {actual}")]
    UnexpectedShape {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("field '{field}': {violation}")]
    ValidationFailed { field: String, violation: String },
}

/// Failure of one feature pipeline end to end.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("prompt rendering failed: {0}")]
    Render(#[from] RenderError),

    #[error("completion request failed: {0}")]
    Completion(#[from] CompletionError),

    #[error("response extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("no schema registered for feature '{0}'")]
    MissingSchema(&'static str),

    #[error("{0} is disabled: it requires a vision-capable completion backend")]
    FeatureDisabled(&'static str),
}

/// The uniform failure envelope returned by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl IntoResponse for AgentError {
    fn into_response(self) -> Response {
        let status = match self {
            AgentError::FeatureDisabled(_) => StatusCode::NOT_IMPLEMENTED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
