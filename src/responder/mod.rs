//! Response materialisation subsystem.
//!
//! # Data Flow
//! ```text
//! RequestContext
//!     → responder.rs (branch on the error flag)
//!         errors:    mapper.rs (ErrorList → status), empty body
//!         no errors: upstream status and body
//!     → headers.rs (strip transport headers, once)
//!     → sink.rs (status, headers, body; written once)
//! ```

pub mod headers;
pub mod mapper;
#[allow(clippy::module_inception)]
pub mod responder;
pub mod sink;

pub use headers::{OutputHeaderFilter, RemoveHeaders};
pub use mapper::{ErrorStatusMapper, MappingPolicy, TableMapper};
pub use responder::{FinalResponse, Outcome, Responder, ResponderError};
pub use sink::{AxumSink, BufferedSink, ResponseSink, SinkError};
