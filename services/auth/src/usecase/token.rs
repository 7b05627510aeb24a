use serde::Serialize;

use sentinel_auth_types::token::{TokenCodec, TokenKind};

use crate::domain::repository::{BanRepository, UserRepository};
use crate::domain::types::{User, UserProfile};
use crate::error::AuthServiceError;

// ── RefreshToken ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct RefreshTokenOutput {
    pub access_token: String,
    pub expires_at: u64,
    pub user: UserProfile,
}

/// Mints a new access token. The refresh token is not rotated and stays valid
/// until its own expiry.
pub struct RefreshTokenUseCase<U, B>
where
    U: UserRepository,
    B: BanRepository,
{
    pub users: U,
    pub bans: B,
    pub codec: TokenCodec,
}

impl<U, B> RefreshTokenUseCase<U, B>
where
    U: UserRepository,
    B: BanRepository,
{
    pub async fn execute(&self, refresh_token: &str) -> Result<RefreshTokenOutput, AuthServiceError> {
        let info = self.codec.verify(refresh_token, TokenKind::Refresh)?;

        let user = self
            .users
            .find_by_id(info.user_id)
            .await?
            .ok_or(AuthServiceError::UserNotFound)?;
        if self.bans.exists_by_user(user.id).await? {
            return Err(AuthServiceError::UserBanned);
        }

        let (access_token, expires_at) = self
            .codec
            .issue_access(user.id)
            .map_err(AuthServiceError::internal)?;

        Ok(RefreshTokenOutput {
            access_token,
            expires_at,
            user: user.to_profile(),
        })
    }
}

// ── ValidateToken ────────────────────────────────────────────────────────────

/// Resolves an access token to its user. Ban status is not checked here; pair
/// with [`ValidateUserUseCase`] when it matters.
pub struct ValidateTokenUseCase<U>
where
    U: UserRepository,
{
    pub users: U,
    pub codec: TokenCodec,
}

impl<U> ValidateTokenUseCase<U>
where
    U: UserRepository,
{
    pub async fn execute(&self, access_token: &str) -> Result<User, AuthServiceError> {
        let info = self.codec.verify(access_token, TokenKind::Access)?;
        self.users
            .find_by_id(info.user_id)
            .await?
            .ok_or(AuthServiceError::UserNotFound)
    }
}

// ── ValidateUser ─────────────────────────────────────────────────────────────

pub struct ValidateUserUseCase<U, B>
where
    U: UserRepository,
    B: BanRepository,
{
    pub users: U,
    pub bans: B,
}

impl<U, B> ValidateUserUseCase<U, B>
where
    U: UserRepository,
    B: BanRepository,
{
    pub async fn execute(&self, user_id: i64) -> Result<User, AuthServiceError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthServiceError::UserNotFound)?;
        if self.bans.exists_by_user(user.id).await? {
            return Err(AuthServiceError::UserBanned);
        }
        Ok(user)
    }
}
