//! Bearer token signing and verification.

#[cfg(any(feature = "issuer", test))]
use jsonwebtoken::{EncodingKey, Header, encode};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::Deserialize;
#[cfg(any(feature = "issuer", test))]
use serde::Serialize;

/// Access token lifetime: 24 hours.
pub const ACCESS_TOKEN_EXP: u64 = 86_400;
/// Refresh token lifetime: 7 days.
pub const REFRESH_TOKEN_EXP: u64 = 604_800;

/// Which token a caller expects. Carried in the `iss` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

/// User identity extracted from a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub user_id: i64,
    pub kind: TokenKind,
    pub expires_at: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
    #[error("wrong token type")]
    WrongTokenType,
}

/// JWT claims payload.
///
/// | Field | Meaning |
/// |-------|---------|
/// | `sub` | numeric user id, as a decimal string |
/// | `iss` | `"access"` or `"refresh"` |
/// | `iat` | issued-at, seconds since epoch |
/// | `exp` | expiry, seconds since epoch |
///
/// [`Serialize`] requires the **`issuer`** feature. Only the auth service enables it.
#[derive(Debug, Deserialize)]
#[cfg_attr(any(feature = "issuer", test), derive(Serialize))]
pub struct JwtClaims {
    pub sub: String,
    pub iss: String,
    pub iat: u64,
    pub exp: u64,
}

/// HS256 codec holding the process-wide signing key.
#[derive(Clone)]
pub struct TokenCodec {
    decoding: DecodingKey,
    #[cfg(any(feature = "issuer", test))]
    encoding: EncodingKey,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            decoding: DecodingKey::from_secret(secret),
            #[cfg(any(feature = "issuer", test))]
            encoding: EncodingKey::from_secret(secret),
        }
    }

    /// Verify signature and expiry, then require the `iss` claim to match `expected`.
    ///
    /// Default leeway (60s) applies to `exp`.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<TokenInfo, TokenError> {
        let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        let claims = decode::<JwtClaims>(token, &self.decoding, &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            })?
            .claims;

        if claims.iss != expected.as_str() {
            tracing::debug!(iss = %claims.iss, expected = expected.as_str(), "token type mismatch");
            return Err(TokenError::WrongTokenType);
        }
        let user_id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| TokenError::Malformed)?;

        Ok(TokenInfo {
            user_id,
            kind: expected,
            expires_at: claims.exp,
        })
    }

    /// Issue an access token. Returns the token and its expiry (seconds since epoch).
    #[cfg(any(feature = "issuer", test))]
    pub fn issue_access(&self, user_id: i64) -> Result<(String, u64), jsonwebtoken::errors::Error> {
        self.issue(user_id, TokenKind::Access, ACCESS_TOKEN_EXP)
    }

    #[cfg(any(feature = "issuer", test))]
    pub fn issue_refresh(&self, user_id: i64) -> Result<String, jsonwebtoken::errors::Error> {
        self.issue(user_id, TokenKind::Refresh, REFRESH_TOKEN_EXP)
            .map(|(token, _)| token)
    }

    #[cfg(any(feature = "issuer", test))]
    fn issue(
        &self,
        user_id: i64,
        kind: TokenKind,
        ttl: u64,
    ) -> Result<(String, u64), jsonwebtoken::errors::Error> {
        let iat = jsonwebtoken::get_current_timestamp();
        let claims = JwtClaims {
            sub: user_id.to_string(),
            iss: kind.as_str().to_owned(),
            iat,
            exp: iat + ttl,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        Ok((token, claims.exp))
    }
}
