//! Network service for the mock SBI device simulator.
//!
//! The service speaks a line-oriented pseudo-HTTP protocol over a (TLS)
//! socket: a hand-rolled request parser decodes the verb and JSON body, a
//! per-connection worker dispatches onto the device helpers, and a response
//! builder frames the JSON reply. A process-wide registry starts and stops
//! service instances for multi-tenant test orchestration.

pub mod parser;
pub mod registry;
pub mod response;
pub mod service;
pub mod tls;
pub mod worker;

pub use registry::SbiRegistry;
pub use service::{MockService, ServiceConfig};
