use crate::domain::repository::{BanRepository, SessionRepository, UserRepository};
use crate::domain::types::{Ban, NewBan, Session, UserProfile};
use crate::error::AuthServiceError;

pub struct GetProfileUseCase<U>
where
    U: UserRepository,
{
    pub users: U,
}

impl<U> GetProfileUseCase<U>
where
    U: UserRepository,
{
    pub async fn execute(&self, user_id: i64) -> Result<UserProfile, AuthServiceError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthServiceError::UserNotFound)?;
        Ok(user.to_profile())
    }
}

pub struct ListSessionsUseCase<S>
where
    S: SessionRepository,
{
    pub sessions: S,
}

impl<S> ListSessionsUseCase<S>
where
    S: SessionRepository,
{
    pub async fn execute(&self, user_id: i64) -> Result<Vec<Session>, AuthServiceError> {
        self.sessions.list_active_by_user(user_id).await
    }
}

pub struct RevokeSessionUseCase<S>
where
    S: SessionRepository,
{
    pub sessions: S,
}

impl<S> RevokeSessionUseCase<S>
where
    S: SessionRepository,
{
    /// Only the owner can revoke; someone else's session reads as not found.
    pub async fn execute(&self, user_id: i64, session_id: i64) -> Result<(), AuthServiceError> {
        let session = self
            .sessions
            .find_by_id(session_id)
            .await?
            .filter(|s| s.user_id == user_id && s.is_active())
            .ok_or(AuthServiceError::SessionNotFound)?;

        if !self.sessions.delete(session.id).await? {
            return Err(AuthServiceError::SessionNotFound);
        }
        tracing::info!(user_id, session_id, "session revoked");
        Ok(())
    }
}

/// Administrative ban: records the ban and ends every session of the user.
pub struct BanUserUseCase<U, B, S>
where
    U: UserRepository,
    B: BanRepository,
    S: SessionRepository,
{
    pub users: U,
    pub bans: B,
    pub sessions: S,
}

impl<U, B, S> BanUserUseCase<U, B, S>
where
    U: UserRepository,
    B: BanRepository,
    S: SessionRepository,
{
    pub async fn execute(&self, ban: NewBan) -> Result<Ban, AuthServiceError> {
        self.users
            .find_by_id(ban.user_id)
            .await?
            .ok_or(AuthServiceError::UserNotFound)?;

        let ban = self.bans.create(&ban).await?;
        let revoked = self.sessions.delete_all_by_user(ban.user_id).await?;

        tracing::info!(
            user_id = ban.user_id,
            banned_by = ban.banned_by,
            ban_id = ban.id,
            revoked,
            "user banned"
        );
        Ok(ban)
    }
}
