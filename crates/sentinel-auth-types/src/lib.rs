//! Auth types shared across Sentinel services.
//!
//! Provides the bearer token codec and `Authorization` header parsing. Issuing
//! tokens requires the `issuer` feature; every other consumer only verifies.

pub mod bearer;
pub mod token;
