//! Upstream forwarding stage.
//!
//! # Responsibilities
//! - Rewrite the request URI onto the configured upstream
//! - Send it with a connect timeout and an overall deadline
//! - Record the response, or classify the failure as a pipeline error
//!
//! # Design Decisions
//! - One attempt only; retries belong to a dedicated stage
//! - The response body is not buffered; it streams through the responder

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{Request, Uri};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;

use crate::config::GatewayConfig;
use crate::context::{ErrorKind, PipelineError, RequestContext, UpstreamResponse};
use crate::pipeline::PipelineStage;

/// Forwards the request to a single upstream.
#[derive(Debug, Clone)]
pub struct UpstreamForwarder {
    client: Client<HttpConnector, Body>,
    authority: Authority,
    timeout: Duration,
}

impl UpstreamForwarder {
    pub fn new(authority: Authority, connect_timeout: Duration, timeout: Duration) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(connect_timeout));
        let client = Client::builder(TokioExecutor::new()).build(connector);
        Self {
            client,
            authority,
            timeout,
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Result<Self, axum::http::uri::InvalidUri> {
        let authority = config.upstream.address.parse::<Authority>()?;
        Ok(Self::new(
            authority,
            Duration::from_millis(config.timeouts.upstream_connect_ms),
            Duration::from_millis(config.timeouts.upstream_ms),
        ))
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Upstream URI for an incoming request URI.
    fn upstream_uri(&self, uri: &Uri) -> Result<Uri, axum::http::uri::InvalidUriParts> {
        let mut parts = uri.clone().into_parts();
        parts.scheme = Some(Scheme::HTTP);
        parts.authority = Some(self.authority.clone());
        if parts.path_and_query.is_none() {
            parts.path_and_query = Some(PathAndQuery::from_static("/"));
        }
        Uri::from_parts(parts)
    }
}

#[async_trait]
impl PipelineStage for UpstreamForwarder {
    fn name(&self) -> &'static str {
        "upstream_forwarder"
    }

    async fn run(&self, request: &mut Request<Body>, ctx: &mut RequestContext) {
        let uri = match self.upstream_uri(request.uri()) {
            Ok(uri) => uri,
            Err(e) => {
                ctx.record_error(PipelineError::new(ErrorKind::BadRequest, e.to_string()));
                return;
            }
        };

        let mut upstream_request = Request::new(std::mem::take(request.body_mut()));
        *upstream_request.method_mut() = request.method().clone();
        *upstream_request.uri_mut() = uri;
        *upstream_request.headers_mut() = request.headers().clone();

        tracing::debug!(
            request_id = %ctx.request_id(),
            method = %request.method(),
            upstream = %self.authority,
            "Forwarding request"
        );

        match tokio::time::timeout(self.timeout, self.client.request(upstream_request)).await {
            Ok(Ok(response)) => {
                let response = UpstreamResponse::from_response(response);
                if let Err(e) = ctx.set_upstream_response(response) {
                    ctx.record_error(PipelineError::new(ErrorKind::Unknown, e.to_string()));
                }
            }
            Ok(Err(e)) => {
                tracing::error!(request_id = %ctx.request_id(), error = %e, "Upstream error");
                let kind = if e.is_connect() {
                    ErrorKind::UpstreamUnreachable
                } else {
                    ErrorKind::UnableToCompleteRequest
                };
                ctx.record_error(PipelineError::new(kind, e.to_string()));
            }
            Err(_) => {
                tracing::warn!(
                    request_id = %ctx.request_id(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Upstream timed out"
                );
                ctx.record_error(PipelineError::new(
                    ErrorKind::RequestTimedOut,
                    format!("no response within {:?}", self.timeout),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forwarder() -> UpstreamForwarder {
        UpstreamForwarder::new(
            Authority::from_static("127.0.0.1:3000"),
            Duration::from_millis(100),
            Duration::from_millis(500),
        )
    }

    #[tokio::test]
    async fn test_upstream_uri_keeps_path_and_query() {
        let uri = forwarder()
            .upstream_uri(&"/api/v1?x=1".parse().unwrap())
            .unwrap();
        assert_eq!(uri.to_string(), "http://127.0.0.1:3000/api/v1?x=1");
    }

    #[tokio::test]
    async fn test_upstream_uri_replaces_absolute_authority() {
        let uri = forwarder()
            .upstream_uri(&"http://client.example/".parse().unwrap())
            .unwrap();
        assert_eq!(uri.authority().unwrap().as_str(), "127.0.0.1:3000");
    }

    #[tokio::test]
    async fn test_from_config_rejects_bad_address() {
        let mut config = GatewayConfig::default();
        config.upstream.address = "bad host".into();
        assert!(UpstreamForwarder::from_config(&config).is_err());
    }
}
