//! Request pipeline.
//!
//! # Data Flow
//! ```text
//! Request
//!     → Pipeline::handle creates the RequestContext
//!     → stages run in order, each writing into the context
//!       (the first recorded error stops the remaining stages)
//!     → Responder writes the single response through an AxumSink
//! ```
//!
//! # Design Decisions
//! - Explicit sequential composition: stages never call each other
//! - The context is an argument, never ambient state
//! - No retries here; a stage that wants them owns them

pub mod forwarder;

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::context::RequestContext;
use crate::http::request::request_id;
use crate::observability::metrics;
use crate::responder::{AxumSink, Responder, ResponderError};

pub use forwarder::UpstreamForwarder;

/// One unit of upstream processing.
#[async_trait]
pub trait PipelineStage: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// Record an error or a response in `ctx`. May take the request body.
    async fn run(&self, request: &mut Request<Body>, ctx: &mut RequestContext);
}

/// Ordered stages followed by the responder.
#[derive(Debug, Clone)]
pub struct Pipeline {
    stages: Vec<Arc<dyn PipelineStage>>,
    responder: Responder,
}

impl Pipeline {
    pub fn new(responder: Responder) -> Self {
        Self {
            stages: Vec::new(),
            responder,
        }
    }

    pub fn with_stage(mut self, stage: Arc<dyn PipelineStage>) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage for this request, then respond exactly once.
    pub async fn handle(&self, mut request: Request<Body>) -> Response {
        let start_time = Instant::now();
        let method = request.method().to_string();
        let mut ctx = RequestContext::new(request_id(&request));

        for stage in &self.stages {
            stage.run(&mut request, &mut ctx).await;
            if ctx.has_errors() {
                tracing::debug!(
                    request_id = %ctx.request_id(),
                    stage = stage.name(),
                    "Stage recorded an error; skipping remaining stages"
                );
                break;
            }
        }
        drop(request);

        let request_id = ctx.request_id().to_string();
        let mut sink = AxumSink::new();
        let outcome = match self.responder.respond(ctx, &mut sink).await {
            Ok(outcome) => outcome.as_str(),
            Err(ResponderError::InternalInconsistency) => {
                metrics::record_internal_inconsistency();
                "internal_inconsistency"
            }
            Err(e) => {
                tracing::error!(request_id = %request_id, error = %e, "Failed to write response");
                metrics::record_response(&method, 500, "sink_error", start_time);
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        };

        let response = sink.into_response();
        metrics::record_response(&method, response.status().as_u16(), outcome, start_time);
        tracing::debug!(
            request_id = %request_id,
            status = response.status().as_u16(),
            outcome,
            "Response ready"
        );
        response
    }
}
