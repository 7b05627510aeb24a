use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use sentinel_auth_types::token::TokenError;
use sentinel_core::context::Interrupted;

/// Auth service domain error variants.
#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("user is banned")]
    UserBanned,
    #[error("invalid 2FA code")]
    InvalidTwoFactorCode,
    #[error("2FA code required")]
    TwoFactorRequired,
    #[error("no pending 2FA enrollment")]
    TwoFactorNotPending,
    #[error("2FA already enabled")]
    TwoFactorAlreadyEnabled,
    #[error("email already registered")]
    EmailTaken,
    #[error("nickname already taken")]
    NicknameTaken,
    #[error("invalid date format, expected YYYY-MM-DD")]
    InvalidDate,
    #[error("user not found")]
    UserNotFound,
    #[error("session not found")]
    SessionNotFound,
    #[error("invalid or expired reset token")]
    InvalidOrExpiredToken,
    #[error("invalid token")]
    InvalidToken,
    #[error("wrong token type")]
    WrongTokenType,
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("operation cancelled")]
    Cancelled,
    #[error("deadline exceeded")]
    DeadlineExceeded,
    #[error("store unavailable")]
    StoreUnavailable(#[from] anyhow::Error),
    #[error("internal error")]
    Internal(#[source] anyhow::Error),
}

impl AuthServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::UserBanned => "USER_BANNED",
            Self::InvalidTwoFactorCode => "INVALID_2FA_CODE",
            Self::TwoFactorRequired => "2FA_REQUIRED",
            Self::TwoFactorNotPending => "2FA_NOT_PENDING",
            Self::TwoFactorAlreadyEnabled => "2FA_ALREADY_ENABLED",
            Self::EmailTaken => "EMAIL_TAKEN",
            Self::NicknameTaken => "NICKNAME_TAKEN",
            Self::InvalidDate => "INVALID_DATE",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::SessionNotFound => "SESSION_NOT_FOUND",
            Self::InvalidOrExpiredToken => "INVALID_OR_EXPIRED_TOKEN",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::WrongTokenType => "WRONG_TOKEN_TYPE",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Cancelled => "CANCELLED",
            Self::DeadlineExceeded => "DEADLINE_EXCEEDED",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidCredentials
            | Self::InvalidTwoFactorCode
            | Self::TwoFactorRequired
            | Self::InvalidToken
            | Self::WrongTokenType
            | Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::UserBanned => StatusCode::FORBIDDEN,
            Self::EmailTaken | Self::NicknameTaken | Self::TwoFactorAlreadyEnabled => {
                StatusCode::CONFLICT
            }
            Self::InvalidDate | Self::InvalidOrExpiredToken | Self::TwoFactorNotPending => {
                StatusCode::BAD_REQUEST
            }
            Self::UserNotFound | Self::SessionNotFound => StatusCode::NOT_FOUND,
            Self::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
            Self::Cancelled | Self::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TokenError> for AuthServiceError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::WrongTokenType => Self::WrongTokenType,
            TokenError::InvalidSignature | TokenError::Expired | TokenError::Malformed => {
                Self::InvalidToken
            }
        }
    }
}

impl From<Interrupted> for AuthServiceError {
    fn from(err: Interrupted) -> Self {
        match err {
            Interrupted::Cancelled => Self::Cancelled,
            Interrupted::DeadlineExceeded => Self::DeadlineExceeded,
        }
    }
}

impl IntoResponse for AuthServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        // TraceLayer already records every response; only server-side failures carry
        // a chain worth logging.
        if status.is_server_error() {
            match &self {
                Self::StoreUnavailable(e) | Self::Internal(e) => {
                    tracing::error!(error = %format!("{e:#}"), kind = self.kind(), "request failed");
                }
                _ => tracing::error!(kind = self.kind(), "request failed"),
            }
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}
