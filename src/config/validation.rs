//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, statuses are 4xx/5xx)
//! - Upstream timeouts must expire before the whole-request deadline
//! - Check that addresses and header names parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::uri::Authority;
use axum::http::HeaderName;

use crate::config::schema::GatewayConfig;
use crate::context::ErrorKind;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid listener bind address '{0}'")]
    BindAddress(String),
    #[error("invalid upstream address '{0}'")]
    UpstreamAddress(String),
    #[error("timeout '{0}' must be greater than zero")]
    ZeroTimeout(&'static str),
    #[error("timeout '{field}' ({value_ms}ms) must be below request_secs ({request_ms}ms)")]
    TimeoutExceedsRequest {
        field: &'static str,
        value_ms: u64,
        request_ms: u64,
    },
    #[error("invalid header name '{0}' in header filter")]
    HeaderName(String),
    #[error("status {status} for {field} is outside 400-599")]
    Status { field: String, status: u16 },
    #[error("error kind '{0}' appears more than once in ranking")]
    DuplicateRanking(ErrorKind),
    #[error("error kind '{0}' has more than one status override")]
    DuplicateOverride(ErrorKind),
    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }
    if config.upstream.address.parse::<Authority>().is_err() {
        errors.push(ValidationError::UpstreamAddress(config.upstream.address.clone()));
    }

    let timeouts = [
        ("request_secs", config.timeouts.request_secs),
        ("upstream_connect_ms", config.timeouts.upstream_connect_ms),
        ("upstream_ms", config.timeouts.upstream_ms),
    ];
    for (name, value) in timeouts {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout(name));
        }
    }

    let request_ms = config.timeouts.request_secs.saturating_mul(1000);
    if request_ms > 0 {
        let upstream = [
            ("upstream_connect_ms", config.timeouts.upstream_connect_ms),
            ("upstream_ms", config.timeouts.upstream_ms),
        ];
        for (field, value_ms) in upstream {
            if value_ms >= request_ms {
                errors.push(ValidationError::TimeoutExceedsRequest {
                    field,
                    value_ms,
                    request_ms,
                });
            }
        }
    }

    for name in &config.responder.header_filter.remove {
        if HeaderName::from_bytes(name.trim().as_bytes()).is_err() {
            errors.push(ValidationError::HeaderName(name.clone()));
        }
    }

    let mapping = &config.responder.status_mapping;
    if !is_error_status(mapping.fallback) {
        errors.push(ValidationError::Status {
            field: "fallback".to_string(),
            status: mapping.fallback,
        });
    }

    let mut seen = HashSet::new();
    for kind in &mapping.ranking {
        if !seen.insert(*kind) {
            errors.push(ValidationError::DuplicateRanking(*kind));
        }
    }

    let mut seen = HashSet::new();
    for entry in &mapping.overrides {
        if !seen.insert(entry.kind) {
            errors.push(ValidationError::DuplicateOverride(entry.kind));
        }
        if !is_error_status(entry.status) {
            errors.push(ValidationError::Status {
                field: format!("overrides.{}", entry.kind),
                status: entry.status,
            });
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_error_status(status: u16) -> bool {
    (400..=599).contains(&status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::StatusOverride;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&GatewayConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.upstream.address = "bad host/path".into();
        config.timeouts.upstream_ms = 0;
        config.responder.header_filter.remove.push("bad header".into());
        config.responder.status_mapping.fallback = 200;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors.contains(&ValidationError::ZeroTimeout("upstream_ms")));
        assert!(errors.contains(&ValidationError::Status {
            field: "fallback".into(),
            status: 200
        }));
    }

    #[test]
    fn test_rejects_duplicate_ranking_and_overrides() {
        let mut config = GatewayConfig::default();
        config.responder.status_mapping.ranking =
            vec![ErrorKind::NotFound, ErrorKind::NotFound];
        config.responder.status_mapping.overrides = vec![
            StatusOverride { kind: ErrorKind::Unknown, status: 503 },
            StatusOverride { kind: ErrorKind::Unknown, status: 302 },
        ];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::DuplicateRanking(ErrorKind::NotFound),
                ValidationError::DuplicateOverride(ErrorKind::Unknown),
                ValidationError::Status {
                    field: "overrides.unknown".into(),
                    status: 302
                },
            ]
        );
    }

    #[test]
    fn test_upstream_timeouts_must_beat_request_deadline() {
        let mut config = GatewayConfig::default();
        config.timeouts.request_secs = 1;
        config.timeouts.upstream_connect_ms = 1000;
        config.timeouts.upstream_ms = 5000;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::TimeoutExceedsRequest {
                    field: "upstream_connect_ms",
                    value_ms: 1000,
                    request_ms: 1000
                },
                ValidationError::TimeoutExceedsRequest {
                    field: "upstream_ms",
                    value_ms: 5000,
                    request_ms: 1000
                },
            ]
        );

        config.timeouts.upstream_connect_ms = 200;
        config.timeouts.upstream_ms = 999;
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = GatewayConfig::default();
        config.observability.metrics_address = "nowhere".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::MetricsAddress("nowhere".into())])
        );
    }
}
