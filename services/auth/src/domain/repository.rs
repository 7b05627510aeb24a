#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::types::{
    Ban, NewBan, NewSession, NewUser, OutboxEvent, PendingEnrollment, RecoveryCode, ResetToken,
    Session, User,
};
use crate::error::AuthServiceError;

/// Credential store. Every read excludes soft-deleted users.
pub trait UserRepository: Send + Sync {
    /// Insert a user. A uniqueness violation maps to `EmailTaken` / `NicknameTaken`.
    async fn create(&self, user: &NewUser) -> Result<User, AuthServiceError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AuthServiceError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthServiceError>;

    /// Administrative lookup; no request path calls it.
    async fn find_by_nickname(&self, nickname: &str) -> Result<Option<User>, AuthServiceError>;

    /// Persist password hash and second-factor fields; bumps `updated_at`.
    async fn update(&self, user: &User) -> Result<(), AuthServiceError>;

    /// Administrative. Frees the email and nickname for a new registration.
    async fn soft_delete(&self, id: i64) -> Result<(), AuthServiceError>;

    async fn email_exists(&self, email: &str) -> Result<bool, AuthServiceError>;

    async fn nickname_exists(&self, nickname: &str) -> Result<bool, AuthServiceError>;
}

/// Session store.
pub trait SessionRepository: Send + Sync {
    async fn create(&self, session: &NewSession) -> Result<Session, AuthServiceError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Session>, AuthServiceError>;

    /// Active sessions, newest first.
    async fn list_active_by_user(&self, user_id: i64) -> Result<Vec<Session>, AuthServiceError>;

    /// Soft-delete one session. Returns `false` if it was not active.
    async fn delete(&self, id: i64) -> Result<bool, AuthServiceError>;

    /// Soft-delete every active session of the user. Returns the number affected.
    async fn delete_all_by_user(&self, user_id: i64) -> Result<u64, AuthServiceError>;

    /// Soft-delete sessions created before `older_than`.
    async fn cleanup_expired(&self, older_than: DateTime<Utc>) -> Result<u64, AuthServiceError>;
}

/// Reset-token store. At most one token per email.
pub trait ResetTokenRepository: Send + Sync {
    /// Insert or overwrite the email's token and enqueue the outbox event atomically.
    async fn create_or_replace_with_outbox(
        &self,
        token: &ResetToken,
        event: &OutboxEvent,
    ) -> Result<(), AuthServiceError>;

    async fn find_valid_by_id(&self, id: Uuid) -> Result<Option<ResetToken>, AuthServiceError>;

    /// Administrative lookup of the email's live token.
    async fn find_valid_by_email(
        &self,
        email: &str,
    ) -> Result<Option<ResetToken>, AuthServiceError>;

    /// Administrative withdrawal of a token. Redemption goes through `redeem`.
    async fn delete_by_id(&self, id: Uuid) -> Result<(), AuthServiceError>;

    /// Consume a live token, store the user's new password hash and revoke every
    /// active session of theirs in one transaction. Returns the number of sessions
    /// revoked; `InvalidOrExpiredToken` if the token was already consumed or expired.
    async fn redeem(
        &self,
        token_id: Uuid,
        user_id: i64,
        password_hash: &str,
    ) -> Result<u64, AuthServiceError>;

    /// Administrative withdrawal of the email's token.
    async fn delete_by_email(&self, email: &str) -> Result<(), AuthServiceError>;

    async fn cleanup_expired(&self) -> Result<u64, AuthServiceError>;
}

/// Second-factor recovery-code store.
pub trait RecoveryCodeRepository: Send + Sync {
    async fn create(&self, user_id: i64, code_hashes: &[String]) -> Result<(), AuthServiceError>;

    async fn list_active_by_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<RecoveryCode>, AuthServiceError>;

    async fn delete_all_by_user(&self, user_id: i64) -> Result<(), AuthServiceError>;

    /// Consume a code. Returns `false` if it was already consumed.
    async fn mark_used(&self, id: i64) -> Result<bool, AuthServiceError>;
}

/// Ban registry. Append-only.
pub trait BanRepository: Send + Sync {
    async fn create(&self, ban: &NewBan) -> Result<Ban, AuthServiceError>;

    async fn get_latest_by_user(&self, user_id: i64) -> Result<Option<Ban>, AuthServiceError>;

    async fn exists_by_user(&self, user_id: i64) -> Result<bool, AuthServiceError>;
}

/// Unconfirmed 2FA enrollments (Redis, short TTL).
pub trait PendingTwoFactorCache: Send + Sync {
    /// Replaces any earlier enrollment of the user.
    async fn set_pending(
        &self,
        user_id: i64,
        enrollment: &PendingEnrollment,
    ) -> Result<(), AuthServiceError>;

    async fn get_pending(
        &self,
        user_id: i64,
    ) -> Result<Option<PendingEnrollment>, AuthServiceError>;

    async fn clear_pending(&self, user_id: i64) -> Result<(), AuthServiceError>;
}
