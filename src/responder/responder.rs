//! Terminal pipeline stage: turns the request context into the response.
//!
//! # State Machine
//! ```text
//! Start → Branch ──errors──▶ ErrorPath   ─┐
//!               └─no errors─▶ SuccessPath ─┴─▶ Written → Terminal
//! ```
//!
//! # Design Decisions
//! - The header filter runs exactly once, on exactly one header set
//! - `FinalResponse` is consumed by the write, so it is written at most once
//! - A missing error flag means "no errors"; a missing upstream response
//!   with no errors is an internal inconsistency, answered with a bare 500

use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, StatusCode};

use crate::config::schema::ResponderConfig;
use crate::context::{ErrorList, RequestContext};
use crate::responder::headers::{OutputHeaderFilter, RemoveHeaders};
use crate::responder::mapper::{ErrorStatusMapper, TableMapper};
use crate::responder::sink::{ResponseSink, SinkError};

#[derive(Debug, thiserror::Error)]
pub enum ResponderError {
    /// Neither errors nor an upstream response were recorded.
    #[error("no errors recorded and no upstream response available")]
    InternalInconsistency,
    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// The response sent to the client, built once per request.
#[derive(Debug)]
pub struct FinalResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Body,
}

impl FinalResponse {
    /// Write status, then headers, then the body.
    pub async fn write_to<S: ResponseSink + ?Sized>(self, sink: &mut S) -> Result<(), SinkError> {
        sink.set_status(self.status)?;
        sink.set_headers(self.headers)?;
        sink.write_body(self.body).await
    }
}

/// Which branch produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    PipelineError,
    Upstream,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::PipelineError => "pipeline_error",
            Outcome::Upstream => "upstream",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Responder {
    mapper: Arc<dyn ErrorStatusMapper>,
    filter: Arc<dyn OutputHeaderFilter>,
}

impl Responder {
    pub fn new(mapper: Arc<dyn ErrorStatusMapper>, filter: Arc<dyn OutputHeaderFilter>) -> Self {
        Self { mapper, filter }
    }

    /// Build a responder from validated configuration.
    pub fn from_config(config: &ResponderConfig) -> Result<Self, axum::http::header::InvalidHeaderName> {
        let filter = RemoveHeaders::from_config(&config.header_filter)?;
        let mapper = TableMapper::from_config(&config.status_mapping);
        Ok(Self::new(Arc::new(mapper), Arc::new(filter)))
    }

    /// Decide the response for this request without writing it.
    pub fn prepare(&self, mut ctx: RequestContext) -> Result<(Outcome, FinalResponse), ResponderError> {
        if Self::has_errors(&ctx) {
            let empty = ErrorList::new();
            let errors = ctx.errors().unwrap_or(&empty);
            for error in errors {
                tracing::warn!(
                    request_id = %ctx.request_id(),
                    kind = %error.kind(),
                    message = %error.message(),
                    "Pipeline error"
                );
            }
            let mut status = self.mapper.map(errors);
            if !(status.is_client_error() || status.is_server_error()) {
                tracing::error!(
                    request_id = %ctx.request_id(),
                    status = status.as_u16(),
                    "Status mapper returned a non-error status"
                );
                status = StatusCode::INTERNAL_SERVER_ERROR;
            }
            tracing::debug!(
                request_id = %ctx.request_id(),
                errors = errors.len(),
                status = status.as_u16(),
                "Responding with mapped error status"
            );
            let response = FinalResponse {
                status,
                headers: self.filter.filter(&HeaderMap::new()),
                body: Body::empty(),
            };
            return Ok((Outcome::PipelineError, response));
        }

        let upstream = match ctx.take_upstream_response() {
            Ok(upstream) => upstream,
            Err(_) => {
                tracing::error!(
                    request_id = %ctx.request_id(),
                    "No errors recorded and no upstream response available"
                );
                return Err(ResponderError::InternalInconsistency);
            }
        };

        let response = FinalResponse {
            status: upstream.status,
            headers: self.filter.filter(&upstream.headers),
            body: upstream.body,
        };
        Ok((Outcome::Upstream, response))
    }

    /// Decide and write the response, exactly once.
    ///
    /// On `InternalInconsistency` a bare 500 has already been written to the
    /// sink when the error is returned; the caller only logs it.
    pub async fn respond<S: ResponseSink + ?Sized>(
        &self,
        ctx: RequestContext,
        sink: &mut S,
    ) -> Result<Outcome, ResponderError> {
        match self.prepare(ctx) {
            Ok((outcome, response)) => {
                response.write_to(sink).await?;
                Ok(outcome)
            }
            Err(ResponderError::InternalInconsistency) => {
                let response = FinalResponse {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    headers: self.filter.filter(&HeaderMap::new()),
                    body: Body::empty(),
                };
                response.write_to(sink).await?;
                Err(ResponderError::InternalInconsistency)
            }
            Err(e) => Err(e),
        }
    }

    fn has_errors(ctx: &RequestContext) -> bool {
        let flag = ctx.error_flag().ok();
        let recorded = ctx.has_errors();
        if flag == Some(false) && recorded {
            tracing::warn!(
                request_id = %ctx.request_id(),
                "Error flag is false but errors were recorded"
            );
        }
        takes_error_path(flag, recorded)
    }
}

/// The flag decides when set; without it, a non-empty error list does.
/// A recorded error is never answered with an upstream success.
fn takes_error_path(flag: Option<bool>, errors_recorded: bool) -> bool {
    match flag {
        Some(true) => true,
        Some(false) | None => errors_recorded,
    }
}

impl Default for Responder {
    fn default() -> Self {
        Self::new(Arc::new(TableMapper::default()), Arc::new(RemoveHeaders::default()))
    }
}
