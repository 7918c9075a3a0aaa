//! Per-request state shared between pipeline stages and the responder.

use std::fmt;

use crate::context::error::{ErrorList, PipelineError};
use crate::context::upstream::UpstreamResponse;

/// The slots a stage can write into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKey {
    ErrorFlag,
    Errors,
    UpstreamResponse,
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StateKey::ErrorFlag => "error_flag",
            StateKey::Errors => "errors",
            StateKey::UpstreamResponse => "upstream_response",
        };
        f.write_str(name)
    }
}

/// Failure to read or write a state slot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    #[error("no value stored for {0}")]
    NotFound(StateKey),
    #[error("{0} was already set for this request")]
    AlreadySet(StateKey),
}

/// State owned by exactly one in-flight request.
///
/// Created when the request enters the pipeline and dropped once the
/// responder has written the response. It is handed to stages explicitly,
/// so nothing here is shared between concurrent requests.
#[derive(Debug, Default)]
pub struct RequestContext {
    request_id: String,
    error_flag: Option<bool>,
    errors: Option<ErrorList>,
    upstream_response: Option<UpstreamResponse>,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            ..Self::default()
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Append an error and raise the error flag.
    pub fn record_error(&mut self, error: PipelineError) {
        tracing::debug!(
            request_id = %self.request_id,
            kind = %error.kind(),
            "Pipeline error recorded"
        );
        self.errors.get_or_insert_with(ErrorList::new).push(error);
        self.error_flag = Some(true);
    }

    /// Write the error flag explicitly.
    ///
    /// Once written the flag cannot change, except that `record_error`
    /// always raises it.
    pub fn set_error_flag(&mut self, flag: bool) -> Result<(), StateError> {
        if self.error_flag.is_some() {
            return Err(StateError::AlreadySet(StateKey::ErrorFlag));
        }
        self.error_flag = Some(flag);
        Ok(())
    }

    pub fn set_upstream_response(&mut self, response: UpstreamResponse) -> Result<(), StateError> {
        if self.upstream_response.is_some() {
            return Err(StateError::AlreadySet(StateKey::UpstreamResponse));
        }
        self.upstream_response = Some(response);
        Ok(())
    }

    pub fn error_flag(&self) -> Result<bool, StateError> {
        self.error_flag.ok_or(StateError::NotFound(StateKey::ErrorFlag))
    }

    pub fn errors(&self) -> Result<&ErrorList, StateError> {
        self.errors.as_ref().ok_or(StateError::NotFound(StateKey::Errors))
    }

    /// True when at least one error has been recorded.
    pub fn has_errors(&self) -> bool {
        self.errors.as_ref().is_some_and(|e| !e.is_empty())
    }

    pub fn has_upstream_response(&self) -> bool {
        self.upstream_response.is_some()
    }

    /// Move the upstream response out; its body is read at most once.
    pub fn take_upstream_response(&mut self) -> Result<UpstreamResponse, StateError> {
        self.upstream_response
            .take()
            .ok_or(StateError::NotFound(StateKey::UpstreamResponse))
    }
}
