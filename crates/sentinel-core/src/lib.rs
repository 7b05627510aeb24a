//! Plumbing shared by Sentinel services.
//!
//! Tracing setup, health probes, request-id layers, serde helpers and the
//! cancellable [`context::RequestContext`] every request runs under.

pub mod context;
pub mod health;
pub mod middleware;
pub mod serde;
pub mod tracing;
