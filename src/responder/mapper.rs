//! Mapping of pipeline errors to a single HTTP status.
//!
//! # Responsibilities
//! - Pick the error that represents the whole list (precedence policy)
//! - Translate its kind into a status through a lookup table
//! - Always produce a 4xx/5xx status, falling back to 500
//!
//! # Design Decisions
//! - Precedence is an explicit, injectable `MappingPolicy`
//! - Kinds are a closed enum, so the table is total
//! - Misconfigured entries degrade to the fallback instead of failing

use std::collections::HashMap;
use std::fmt;

use axum::http::StatusCode;

use crate::config::schema::{MappingPolicyKind, StatusMappingConfig};
use crate::context::{ErrorKind, ErrorList};

/// Converts the errors recorded for a request into one status code.
pub trait ErrorStatusMapper: Send + Sync + fmt::Debug {
    /// Must return a status in [400, 599] for any input, including an empty list.
    fn map(&self, errors: &ErrorList) -> StatusCode;
}

/// How to choose the representative error when several were recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingPolicy {
    /// The first error in occurrence order wins.
    FirstError,
    /// The first kind in this ranking that occurs anywhere in the list wins.
    /// If none occurs, the first error in occurrence order wins.
    Ranked(Vec<ErrorKind>),
}

impl MappingPolicy {
    pub fn default_ranking() -> Vec<ErrorKind> {
        vec![
            ErrorKind::Unauthenticated,
            ErrorKind::Unauthorized,
            ErrorKind::RequestTimedOut,
            ErrorKind::NotFound,
            ErrorKind::UnableToCompleteRequest,
        ]
    }

    fn select(&self, errors: &ErrorList) -> Option<ErrorKind> {
        let first = errors.first().map(|e| e.kind());
        match self {
            MappingPolicy::FirstError => first,
            MappingPolicy::Ranked(ranking) => ranking
                .iter()
                .copied()
                .find(|kind| errors.contains_kind(*kind))
                .or(first),
        }
    }
}

impl Default for MappingPolicy {
    fn default() -> Self {
        MappingPolicy::Ranked(Self::default_ranking())
    }
}

/// Table-driven mapper: built-in status per kind, optional per-kind overrides.
#[derive(Debug, Clone)]
pub struct TableMapper {
    overrides: HashMap<ErrorKind, u16>,
    policy: MappingPolicy,
    fallback: StatusCode,
}

impl TableMapper {
    pub fn new(policy: MappingPolicy) -> Self {
        Self {
            overrides: HashMap::new(),
            policy,
            fallback: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn from_config(config: &StatusMappingConfig) -> Self {
        let policy = match config.policy {
            MappingPolicyKind::FirstError => MappingPolicy::FirstError,
            MappingPolicyKind::Ranked => MappingPolicy::Ranked(config.ranking.clone()),
        };
        let mut mapper = Self::new(policy).with_fallback(config.fallback);
        for entry in &config.overrides {
            mapper = mapper.with_override(entry.kind, entry.status);
        }
        mapper
    }

    pub fn with_override(mut self, kind: ErrorKind, status: u16) -> Self {
        self.overrides.insert(kind, status);
        self
    }

    /// Set the fallback status. Values outside [400, 599] keep 500.
    pub fn with_fallback(mut self, status: u16) -> Self {
        if let Some(code) = error_status(status) {
            self.fallback = code;
        } else {
            tracing::warn!(status, "Ignoring fallback status outside 400-599");
        }
        self
    }

    pub fn policy(&self) -> &MappingPolicy {
        &self.policy
    }

    fn status_for(&self, kind: ErrorKind) -> StatusCode {
        match self.overrides.get(&kind) {
            Some(&code) => error_status(code).unwrap_or(self.fallback),
            None if kind == ErrorKind::Unknown => self.fallback,
            None => kind.default_status(),
        }
    }
}

impl Default for TableMapper {
    fn default() -> Self {
        Self::new(MappingPolicy::default())
    }
}

impl ErrorStatusMapper for TableMapper {
    fn map(&self, errors: &ErrorList) -> StatusCode {
        match self.policy.select(errors) {
            Some(kind) => self.status_for(kind),
            None => self.fallback,
        }
    }
}

fn error_status(code: u16) -> Option<StatusCode> {
    StatusCode::from_u16(code)
        .ok()
        .filter(|s| s.is_client_error() || s.is_server_error())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::StatusOverride;
    use crate::context::PipelineError;

    fn list(kinds: &[ErrorKind]) -> ErrorList {
        kinds
            .iter()
            .map(|k| PipelineError::new(*k, "test"))
            .collect()
    }

    #[test]
    fn test_single_error_uses_table() {
        let mapper = TableMapper::default();
        assert_eq!(mapper.map(&list(&[ErrorKind::NotFound])), StatusCode::NOT_FOUND);
        assert_eq!(mapper.map(&list(&[ErrorKind::Unauthenticated])), StatusCode::UNAUTHORIZED);
        assert_eq!(mapper.map(&list(&[ErrorKind::Unauthorized])), StatusCode::FORBIDDEN);
        assert_eq!(
            mapper.map(&list(&[ErrorKind::UpstreamUnreachable])),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            mapper.map(&list(&[ErrorKind::RequestTimedOut])),
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[test]
    fn test_unknown_and_empty_fall_back_to_500() {
        let mapper = TableMapper::default();
        assert_eq!(
            mapper.map(&list(&[ErrorKind::Unknown])),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(mapper.map(&ErrorList::new()), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_first_error_policy() {
        let mapper = TableMapper::new(MappingPolicy::FirstError);
        let errors = list(&[ErrorKind::RateLimited, ErrorKind::Unauthenticated]);
        assert_eq!(mapper.map(&errors), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_ranked_policy_prefers_ranked_kind() {
        let mapper = TableMapper::default();
        let errors = list(&[ErrorKind::NotFound, ErrorKind::Unauthenticated]);
        assert_eq!(mapper.map(&errors), StatusCode::UNAUTHORIZED);

        // nothing ranked: first error decides
        let errors = list(&[ErrorKind::RateLimited, ErrorKind::CircuitOpen]);
        assert_eq!(mapper.map(&errors), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let mapper = TableMapper::default();
        let errors = list(&[
            ErrorKind::UpstreamUnreachable,
            ErrorKind::RequestTimedOut,
            ErrorKind::Unknown,
        ]);
        let first = mapper.map(&errors);
        for _ in 0..10 {
            assert_eq!(mapper.map(&errors), first);
        }
    }

    #[test]
    fn test_every_kind_maps_into_error_range() {
        let policies = [MappingPolicy::FirstError, MappingPolicy::default()];
        for policy in policies {
            let mapper = TableMapper::new(policy);
            for kind in ErrorKind::ALL {
                let code = mapper.map(&list(&[kind])).as_u16();
                assert!((400..=599).contains(&code), "{kind} mapped to {code}");
            }
        }
    }

    #[test]
    fn test_overrides_and_invalid_entries() {
        let mapper = TableMapper::default()
            .with_override(ErrorKind::NotFound, 410)
            .with_override(ErrorKind::RateLimited, 200)
            .with_fallback(503);

        assert_eq!(mapper.map(&list(&[ErrorKind::NotFound])), StatusCode::GONE);
        // out of range override degrades to the fallback
        assert_eq!(
            mapper.map(&list(&[ErrorKind::RateLimited])),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(mapper.map(&list(&[ErrorKind::Unknown])), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_invalid_fallback_keeps_500() {
        let mapper = TableMapper::default().with_fallback(302);
        assert_eq!(mapper.map(&ErrorList::new()), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_from_config() {
        let config = StatusMappingConfig {
            policy: MappingPolicyKind::FirstError,
            ranking: Vec::new(),
            overrides: vec![StatusOverride {
                kind: ErrorKind::CircuitOpen,
                status: 502,
            }],
            fallback: 500,
        };
        let mapper = TableMapper::from_config(&config);
        assert_eq!(mapper.policy(), &MappingPolicy::FirstError);
        assert_eq!(
            mapper.map(&list(&[ErrorKind::CircuitOpen, ErrorKind::Unauthenticated])),
            StatusCode::BAD_GATEWAY
        );
    }
}
