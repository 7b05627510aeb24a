use serde::Serialize;

use sentinel_auth_types::token::TokenCodec;

use crate::domain::repository::{
    BanRepository, RecoveryCodeRepository, SessionRepository, UserRepository,
};
use crate::domain::types::{NewSession, User, UserProfile};
use crate::error::AuthServiceError;
use crate::usecase::credential::{
    CredentialHasher, normalize_recovery_code, supplied, verify_totp,
};

// ── Login ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
    pub totp_code: Option<String>,
    /// Accepted in place of `totp_code`.
    pub recovery_code: Option<String>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginOutput {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token expiry, seconds since epoch.
    pub expires_at: u64,
    pub session_id: i64,
    pub user: UserProfile,
}

#[derive(Debug)]
pub enum LoginOutcome {
    /// Credentials were correct but the account needs a second factor.
    TwoFactorChallenge,
    Authenticated(LoginOutput),
}

pub struct LoginUseCase<U, S, B, R>
where
    U: UserRepository,
    S: SessionRepository,
    B: BanRepository,
    R: RecoveryCodeRepository,
{
    pub users: U,
    pub sessions: S,
    pub bans: B,
    pub recovery_codes: R,
    pub codec: TokenCodec,
    pub hasher: CredentialHasher,
}

impl<U, S, B, R> LoginUseCase<U, S, B, R>
where
    U: UserRepository,
    S: SessionRepository,
    B: BanRepository,
    R: RecoveryCodeRepository,
{
    pub async fn execute(&self, input: LoginInput) -> Result<LoginOutcome, AuthServiceError> {
        // 1. Unknown and deleted accounts look exactly like a wrong password.
        let Some(user) = self.users.find_by_email(&input.email).await? else {
            self.hasher.burn(&input.password).await?;
            return Err(AuthServiceError::InvalidCredentials);
        };

        // 2. Bans win over everything else.
        if let Some(ban) = self.bans.get_latest_by_user(user.id).await? {
            tracing::info!(user_id = user.id, ban_id = ban.id, "login rejected for banned user");
            return Err(AuthServiceError::UserBanned);
        }

        // 3. Password.
        if !self.hasher.verify(&input.password, &user.password_hash).await? {
            return Err(AuthServiceError::InvalidCredentials);
        }

        // 4. Second factor.
        if user.has_two_factor() {
            let totp_code = supplied(input.totp_code.as_deref());
            let recovery_code = supplied(input.recovery_code.as_deref());
            match (totp_code, recovery_code) {
                (None, None) => return Ok(LoginOutcome::TwoFactorChallenge),
                (Some(code), _) => {
                    let secret = user.two_factor_secret.as_deref().unwrap_or_default();
                    verify_totp(secret, code)?;
                }
                (None, Some(code)) => self.consume_recovery_code(&user, code).await?,
            }
        }

        // 5. Tokens and session row.
        let (access_token, expires_at) = self
            .codec
            .issue_access(user.id)
            .map_err(AuthServiceError::internal)?;
        let refresh_token = self
            .codec
            .issue_refresh(user.id)
            .map_err(AuthServiceError::internal)?;
        let session = self
            .sessions
            .create(&NewSession {
                user_id: user.id,
                user_agent: input.user_agent,
                ip_address: input.ip_address,
            })
            .await?;

        tracing::info!(user_id = user.id, session_id = session.id, "user logged in");
        Ok(LoginOutcome::Authenticated(LoginOutput {
            access_token,
            refresh_token,
            expires_at,
            session_id: session.id,
            user: user.to_profile(),
        }))
    }

    async fn consume_recovery_code(&self, user: &User, code: &str) -> Result<(), AuthServiceError> {
        let code = normalize_recovery_code(code);
        let candidates = self.recovery_codes.list_active_by_user(user.id).await?;
        let hashes = candidates.iter().map(|c| c.code_hash.clone()).collect();
        let Some(matched) = self
            .hasher
            .find_match(&code, hashes)
            .await?
            .map(|index| &candidates[index])
        else {
            return Err(AuthServiceError::InvalidTwoFactorCode);
        };

        // A concurrent login may have consumed it between list and mark.
        if !self.recovery_codes.mark_used(matched.id).await? {
            return Err(AuthServiceError::InvalidTwoFactorCode);
        }
        tracing::info!(user_id = user.id, "recovery code consumed");
        Ok(())
    }
}

// ── Logout ───────────────────────────────────────────────────────────────────

/// Acknowledges a logout. Access tokens are not blacklisted; an issued token
/// keeps verifying until it expires. [`LogoutAllUseCase`] is the revoke.
pub struct LogoutUseCase;

impl LogoutUseCase {
    pub async fn execute(&self, user_id: i64) -> Result<(), AuthServiceError> {
        tracing::info!(user_id, "user logged out");
        Ok(())
    }
}

pub struct LogoutAllUseCase<S>
where
    S: SessionRepository,
{
    pub sessions: S,
}

impl<S> LogoutAllUseCase<S>
where
    S: SessionRepository,
{
    /// Returns the number of sessions revoked.
    pub async fn execute(&self, user_id: i64) -> Result<u64, AuthServiceError> {
        let revoked = self.sessions.delete_all_by_user(user_id).await?;
        tracing::info!(user_id, revoked, "user logged out everywhere");
        Ok(revoked)
    }
}
