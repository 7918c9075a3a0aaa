//! Upstream response descriptor.

use axum::body::Body;
use axum::http::{HeaderMap, Response, StatusCode};

/// A response successfully obtained from the upstream.
///
/// The body is a stream and can be consumed only once; whoever takes the
/// `UpstreamResponse` out of the request context owns it.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Body,
}

impl UpstreamResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Body>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Wrap an HTTP response whose body can be turned into an axum `Body`.
    pub fn from_response<B>(response: Response<B>) -> Self
    where
        B: hyper::body::Body<Data = axum::body::Bytes> + Send + 'static,
        B::Error: Into<axum::BoxError>,
    {
        let (parts, body) = response.into_parts();
        Self {
            status: parts.status,
            headers: parts.headers,
            body: Body::new(body),
        }
    }
}
