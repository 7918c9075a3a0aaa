//! Client-facing response sinks.
//!
//! A sink accepts the status, then the headers, then the body. Once the
//! body write has started the response is committed and nothing else can
//! be changed.

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("response already committed")]
    AlreadyCommitted,
    #[error("failed to write response body: {0}")]
    Body(#[from] axum::Error),
}

/// Destination for the single response of a request.
#[async_trait]
pub trait ResponseSink: Send {
    fn set_status(&mut self, status: StatusCode) -> Result<(), SinkError>;

    fn set_headers(&mut self, headers: HeaderMap) -> Result<(), SinkError>;

    /// Commit the response and hand over the body stream.
    async fn write_body(&mut self, body: Body) -> Result<(), SinkError>;
}

/// Builds an axum `Response`; hyper streams the body to the client after
/// the handler returns.
#[derive(Debug, Default)]
pub struct AxumSink {
    status: StatusCode,
    headers: HeaderMap,
    body: Option<Body>,
}

impl AxumSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_committed(&self) -> bool {
        self.body.is_some()
    }

    pub fn into_response(self) -> Response {
        let mut response = Response::new(self.body.unwrap_or_default());
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

#[async_trait]
impl ResponseSink for AxumSink {
    fn set_status(&mut self, status: StatusCode) -> Result<(), SinkError> {
        if self.is_committed() {
            return Err(SinkError::AlreadyCommitted);
        }
        self.status = status;
        Ok(())
    }

    fn set_headers(&mut self, headers: HeaderMap) -> Result<(), SinkError> {
        if self.is_committed() {
            return Err(SinkError::AlreadyCommitted);
        }
        self.headers = headers;
        Ok(())
    }

    async fn write_body(&mut self, body: Body) -> Result<(), SinkError> {
        if self.is_committed() {
            return Err(SinkError::AlreadyCommitted);
        }
        self.body = Some(body);
        Ok(())
    }
}

/// Collects the whole response in memory.
#[derive(Debug, Default)]
pub struct BufferedSink {
    pub status: Option<StatusCode>,
    pub headers: HeaderMap,
    pub body: Bytes,
    committed: bool,
}

impl BufferedSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }
}

#[async_trait]
impl ResponseSink for BufferedSink {
    fn set_status(&mut self, status: StatusCode) -> Result<(), SinkError> {
        if self.committed {
            return Err(SinkError::AlreadyCommitted);
        }
        self.status = Some(status);
        Ok(())
    }

    fn set_headers(&mut self, headers: HeaderMap) -> Result<(), SinkError> {
        if self.committed {
            return Err(SinkError::AlreadyCommitted);
        }
        self.headers = headers;
        Ok(())
    }

    async fn write_body(&mut self, body: Body) -> Result<(), SinkError> {
        if self.committed {
            return Err(SinkError::AlreadyCommitted);
        }
        self.committed = true;
        self.body = axum::body::to_bytes(body, usize::MAX).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderValue};

    #[tokio::test]
    async fn test_axum_sink_builds_response() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));

        let mut sink = AxumSink::new();
        sink.set_status(StatusCode::CREATED).unwrap();
        sink.set_headers(headers).unwrap();
        sink.write_body(Body::from("hello")).await.unwrap();

        let response = sink.into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"hello");
    }

    #[tokio::test]
    async fn test_axum_sink_rejects_changes_after_commit() {
        let mut sink = AxumSink::new();
        sink.write_body(Body::empty()).await.unwrap();

        assert!(matches!(
            sink.set_status(StatusCode::OK),
            Err(SinkError::AlreadyCommitted)
        ));
        assert!(matches!(
            sink.set_headers(HeaderMap::new()),
            Err(SinkError::AlreadyCommitted)
        ));
        assert!(matches!(
            sink.write_body(Body::empty()).await,
            Err(SinkError::AlreadyCommitted)
        ));
    }

    #[tokio::test]
    async fn test_buffered_sink_collects_body() {
        let mut sink = BufferedSink::new();
        sink.set_status(StatusCode::OK).unwrap();
        sink.write_body(Body::from("test response")).await.unwrap();

        assert!(sink.is_committed());
        assert_eq!(sink.status, Some(StatusCode::OK));
        assert_eq!(&sink.body[..], b"test response");
        assert!(matches!(
            sink.write_body(Body::empty()).await,
            Err(SinkError::AlreadyCommitted)
        ));
    }
}
