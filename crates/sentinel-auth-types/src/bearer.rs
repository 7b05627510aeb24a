//! `Authorization: Bearer <token>` parsing.

use http::HeaderMap;
use http::header::AUTHORIZATION;

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BearerError {
    #[error("missing authorization header")]
    Missing,
    #[error("invalid authorization scheme")]
    InvalidScheme,
    #[error("empty bearer token")]
    Empty,
}

/// Extract the token from an `Authorization` header.
///
/// The scheme must be exactly `Bearer` followed by one space.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, BearerError> {
    let value = headers.get(AUTHORIZATION).ok_or(BearerError::Missing)?;
    let value = value.to_str().map_err(|_| BearerError::InvalidScheme)?;
    let token = value
        .strip_prefix(BEARER_PREFIX)
        .ok_or(BearerError::InvalidScheme)?
        .trim();
    if token.is_empty() {
        return Err(BearerError::Empty);
    }
    Ok(token)
}
