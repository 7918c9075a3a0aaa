//! Output header filtering.
//!
//! # Responsibilities
//! - Strip headers that describe the proxy-to-upstream transport
//!   (by default `Transfer-Encoding`, whose framing no longer matches
//!   the body hyper re-frames for the client)
//! - Leave every other header, and the order of its values, untouched
//!
//! # Design Decisions
//! - Pure function over a `HeaderMap`: input is never mutated
//! - Removal set is configured, names compare case-insensitively
//! - Idempotent: filtering filtered headers is a no-op

use std::fmt;

use axum::http::header::{self, HeaderMap, HeaderName, InvalidHeaderName};

use crate::config::schema::HeaderFilterConfig;

/// Removes response headers that must not be forwarded to the client.
pub trait OutputHeaderFilter: Send + Sync + fmt::Debug {
    fn filter(&self, headers: &HeaderMap) -> HeaderMap;
}

/// Filter that drops every value of each configured header name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveHeaders {
    names: Vec<HeaderName>,
}

impl RemoveHeaders {
    pub fn new(names: impl IntoIterator<Item = HeaderName>) -> Self {
        let mut unique: Vec<HeaderName> = Vec::new();
        for name in names {
            if !unique.contains(&name) {
                unique.push(name);
            }
        }
        Self { names: unique }
    }

    pub fn from_config(config: &HeaderFilterConfig) -> Result<Self, InvalidHeaderName> {
        let names = config
            .remove
            .iter()
            .map(|n| HeaderName::from_bytes(n.trim().as_bytes()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(names))
    }

    pub fn names(&self) -> &[HeaderName] {
        &self.names
    }
}

impl Default for RemoveHeaders {
    fn default() -> Self {
        Self::new([header::TRANSFER_ENCODING])
    }
}

impl OutputHeaderFilter for RemoveHeaders {
    fn filter(&self, headers: &HeaderMap) -> HeaderMap {
        let mut filtered = headers.clone();
        for name in &self.names {
            filtered.remove(name);
        }
        filtered
    }
}
