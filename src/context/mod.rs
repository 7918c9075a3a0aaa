//! Request-scoped state subsystem.
//!
//! # Data Flow
//! ```text
//! Pipeline creates RequestContext for the request
//!     → stages record errors (error.rs) or store a response (upstream.rs)
//!     → responder reads the flag, then the errors or the response
//!     → context dropped with the request
//! ```
//!
//! # Design Decisions
//! - Typed slots instead of string keys; absence is reported as `StateError::NotFound`
//! - Passed explicitly to each stage, never stored in ambient/global state
//! - The upstream response is moved out, so its body is consumed at most once

pub mod error;
pub mod state;
pub mod upstream;

pub use error::{ErrorKind, ErrorList, PipelineError};
pub use state::{RequestContext, StateError, StateKey};
pub use upstream::UpstreamResponse;
