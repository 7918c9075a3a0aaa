//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Pipeline and responder produce:
//!     → logging.rs (structured log events, request ID on every event)
//!     → metrics.rs (response counters and latency histogram)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging through `tracing`
//! - Request ID flows through all subsystems
//! - Metrics are cheap; without an installed recorder they are no-ops

pub mod logging;
pub mod metrics;
