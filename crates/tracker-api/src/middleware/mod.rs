//! # Middleware Stack
//!
//! Tower middleware for the API layer. Request tracing is
//! `tower_http::trace::TraceLayer`, installed in [`crate::app`].
//! - [`metrics`]: request and error counters.

pub mod metrics;
