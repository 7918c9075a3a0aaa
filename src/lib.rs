//! Terminal response stage for a reverse-proxy pipeline.
//!
//! Pipeline stages record either an upstream response or errors in a
//! per-request [`RequestContext`]; the [`Responder`] turns that into the one
//! response the client receives.

pub mod config;
pub mod context;
pub mod http;
pub mod observability;
pub mod pipeline;
pub mod responder;

pub use config::schema::GatewayConfig;
pub use context::{ErrorKind, ErrorList, PipelineError, RequestContext, UpstreamResponse};
pub use http::HttpServer;
pub use pipeline::{Pipeline, PipelineStage};
pub use responder::{Responder, ResponderError};
