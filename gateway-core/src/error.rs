//! Error taxonomy for the dispatch core. Each component returns its own typed error; the edge
//! adapter in `server::handler` is the single place that maps the taxonomy onto HTTP status.

use std::collections::HashMap;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrieError {
    #[error("conflicting parameter name at this position: existing `{existing}`, new `{new}`")]
    ConflictingParam { existing: String, new: String },
    #[error("terminal already occupied by slug `{0}`")]
    DuplicateTerminal(String),
}

#[derive(Debug, Error)]
pub enum ShapingError {
    #[error("validation failed")]
    ValidationFailed(HashMap<String, Vec<FieldError>>),
    #[error("template render error: {0}")]
    TemplateError(String),
    #[error("unknown upstream id `{0}`")]
    UnknownUpstream(String),
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct FieldError {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("circuit open for upstream `{0}`")]
    CircuitOpen(String),
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("upstream timed out")]
    UpstreamTimeout,
    #[error("upstream returned status {status}")]
    UpstreamStatus { status: u16, body: Vec<u8> },
    #[error("request canceled")]
    Canceled,
    #[error("internal dispatch error: {0}")]
    Internal(String),
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache key derivation failed: {0}")]
    KeyError(String),
}

/// The single error type the HTTP edge handler understands.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("route not found")]
    NotFound,
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error(transparent)]
    Shaping(#[from] ShapingError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Trie(#[from] TrieError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Maps the taxonomy onto an HTTP status code. This is the only place in the crate that
    /// performs this mapping (see design notes on error propagation).
    pub fn status_code(&self) -> u16 {
        match self {
            GatewayError::NotFound => 404,
            GatewayError::MethodNotAllowed => 405,
            GatewayError::Shaping(ShapingError::ValidationFailed(_)) => 422,
            GatewayError::Shaping(_) => 500,
            GatewayError::Dispatch(DispatchError::CircuitOpen(_)) => 503,
            GatewayError::Dispatch(DispatchError::UpstreamTimeout) => 408,
            GatewayError::Dispatch(DispatchError::Canceled) => 408,
            GatewayError::Dispatch(DispatchError::UpstreamUnavailable(_)) => 502,
            GatewayError::Dispatch(DispatchError::UpstreamStatus { status, .. }) => *status,
            GatewayError::Dispatch(DispatchError::Internal(_)) => 500,
            GatewayError::Cache(_) => 500,
            GatewayError::Trie(_) => 500,
            GatewayError::Internal(_) => 500,
        }
    }
}
