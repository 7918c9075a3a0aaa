//! Errors recorded by pipeline stages.
//!
//! # Design Decisions
//! - `ErrorKind` is a closed set; the status mapper matches on it exhaustively
//! - A `PipelineError` is immutable once created
//! - `ErrorList` is append-only and keeps occurrence order

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a failure recorded by an upstream stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The client request could not be turned into an upstream request.
    BadRequest,
    /// No (or invalid) credentials were presented.
    Unauthenticated,
    /// Credentials were valid but do not grant access.
    Unauthorized,
    /// No route or resource matched the request.
    NotFound,
    PayloadTooLarge,
    RateLimited,
    /// The upstream call was attempted but could not be completed.
    UnableToCompleteRequest,
    /// The upstream could not be connected to.
    UpstreamUnreachable,
    /// A circuit breaker refused to call the upstream.
    CircuitOpen,
    RequestTimedOut,
    Unknown,
}

impl ErrorKind {
    /// Every kind, in declaration order.
    pub const ALL: [ErrorKind; 11] = [
        ErrorKind::BadRequest,
        ErrorKind::Unauthenticated,
        ErrorKind::Unauthorized,
        ErrorKind::NotFound,
        ErrorKind::PayloadTooLarge,
        ErrorKind::RateLimited,
        ErrorKind::UnableToCompleteRequest,
        ErrorKind::UpstreamUnreachable,
        ErrorKind::CircuitOpen,
        ErrorKind::RequestTimedOut,
        ErrorKind::Unknown,
    ];

    /// Built-in status for this kind, used unless configuration overrides it.
    pub fn default_status(self) -> StatusCode {
        match self {
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorKind::Unauthorized => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::UnableToCompleteRequest => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::UpstreamUnreachable => StatusCode::BAD_GATEWAY,
            ErrorKind::CircuitOpen => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::RequestTimedOut => StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::Unauthenticated => "unauthenticated",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::NotFound => "not_found",
            ErrorKind::PayloadTooLarge => "payload_too_large",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::UnableToCompleteRequest => "unable_to_complete_request",
            ErrorKind::UpstreamUnreachable => "upstream_unreachable",
            ErrorKind::CircuitOpen => "circuit_open",
            ErrorKind::RequestTimedOut => "request_timed_out",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failure recorded by a pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct PipelineError {
    kind: ErrorKind,
    message: String,
}

impl PipelineError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Diagnostic text. Never sent to the client.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors in the order they occurred.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorList(Vec<PipelineError>);

impl ErrorList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: PipelineError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn first(&self) -> Option<&PipelineError> {
        self.0.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PipelineError> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[PipelineError] {
        &self.0
    }

    /// Returns true if any recorded error has the given kind.
    pub fn contains_kind(&self, kind: ErrorKind) -> bool {
        self.0.iter().any(|e| e.kind == kind)
    }
}

impl From<Vec<PipelineError>> for ErrorList {
    fn from(errors: Vec<PipelineError>) -> Self {
        Self(errors)
    }
}

impl FromIterator<PipelineError> for ErrorList {
    fn from_iter<I: IntoIterator<Item = PipelineError>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ErrorList {
    type Item = &'a PipelineError;
    type IntoIter = std::slice::Iter<'a, PipelineError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_statuses_are_client_or_server_errors() {
        for kind in ErrorKind::ALL {
            let code = kind.default_status().as_u16();
            assert!((400..=599).contains(&code), "{kind} maps to {code}");
        }
    }

    #[test]
    fn test_error_display_includes_kind_and_message() {
        let err = PipelineError::new(ErrorKind::UpstreamUnreachable, "connection refused");
        assert_eq!(err.to_string(), "upstream_unreachable: connection refused");
    }

    #[test]
    fn test_error_list_keeps_occurrence_order() {
        let mut list = ErrorList::new();
        list.push(PipelineError::new(ErrorKind::NotFound, "a"));
        list.push(PipelineError::new(ErrorKind::Unknown, "b"));

        let kinds: Vec<_> = list.iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, vec![ErrorKind::NotFound, ErrorKind::Unknown]);
        assert!(list.contains_kind(ErrorKind::Unknown));
        assert!(!list.contains_kind(ErrorKind::RateLimited));
    }

    #[test]
    fn test_kind_deserializes_from_snake_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            kind: ErrorKind,
        }
        let w: Wrapper = toml::from_str(r#"kind = "request_timed_out""#).unwrap();
        assert_eq!(w.kind, ErrorKind::RequestTimedOut);
    }
}
