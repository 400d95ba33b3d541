//! Error types shared by every filingscope component

use serde::Serialize;
use thiserror::Error;

use crate::models::MatchCandidate;

#[derive(Error, Debug)]
pub enum FilingError {
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream registry unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Identifier '{query}' is ambiguous ({} candidates)", candidates.len())]
    AmbiguousIdentifier {
        query: String,
        candidates: Vec<MatchCandidate>,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to parse upstream JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure category reported alongside outbound error payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCategory {
    InvalidIdentifier,
    NotFound,
    UpstreamUnavailable,
    Timeout,
    AmbiguousIdentifier,
}

/// Structured `{ error, category }` payload returned to consumers
#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub error: String,
    pub category: ErrorCategory,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub candidates: Vec<MatchCandidate>,
}

impl FilingError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            FilingError::InvalidIdentifier(_) => ErrorCategory::InvalidIdentifier,
            FilingError::NotFound(_) => ErrorCategory::NotFound,
            FilingError::UpstreamUnavailable(_) => ErrorCategory::UpstreamUnavailable,
            FilingError::Timeout(_) => ErrorCategory::Timeout,
            FilingError::AmbiguousIdentifier { .. } => ErrorCategory::AmbiguousIdentifier,
            FilingError::Http(e) if e.is_timeout() => ErrorCategory::Timeout,
            FilingError::Http(_) | FilingError::Json(_) => ErrorCategory::UpstreamUnavailable,
        }
    }

    pub fn to_payload(&self) -> ErrorPayload {
        let candidates = match self {
            FilingError::AmbiguousIdentifier { candidates, .. } => candidates.clone(),
            _ => Vec::new(),
        };
        ErrorPayload {
            error: self.to_string(),
            category: self.category(),
            candidates,
        }
    }
}

pub type Result<T> = std::result::Result<T, FilingError>;
