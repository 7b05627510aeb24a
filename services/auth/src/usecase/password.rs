use uuid::Uuid;

use crate::domain::repository::{ResetTokenRepository, UserRepository};
use crate::domain::types::{OutboxEvent, ResetToken};
use crate::error::AuthServiceError;
use crate::usecase::credential::{CredentialHasher, supplied, verify_totp};

// ── ChangePassword ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ChangePasswordInput {
    pub user_id: i64,
    pub current_password: String,
    pub new_password: String,
    pub totp_code: Option<String>,
}

pub struct ChangePasswordUseCase<U>
where
    U: UserRepository,
{
    pub users: U,
    pub hasher: CredentialHasher,
}

impl<U> ChangePasswordUseCase<U>
where
    U: UserRepository,
{
    pub async fn execute(&self, input: ChangePasswordInput) -> Result<(), AuthServiceError> {
        let mut user = self
            .users
            .find_by_id(input.user_id)
            .await?
            .ok_or(AuthServiceError::UserNotFound)?;

        if !self
            .hasher
            .verify(&input.current_password, &user.password_hash)
            .await?
        {
            return Err(AuthServiceError::InvalidCredentials);
        }

        if user.has_two_factor() {
            let code = supplied(input.totp_code.as_deref())
                .ok_or(AuthServiceError::TwoFactorRequired)?;
            let secret = user.two_factor_secret.as_deref().unwrap_or_default();
            verify_totp(secret, code)?;
        }

        user.password_hash = self.hasher.hash(&input.new_password).await?;
        self.users.update(&user).await?;

        tracing::info!(user_id = user.id, "password changed");
        Ok(())
    }
}

// ── RequestPasswordReset ─────────────────────────────────────────────────────

pub struct RequestPasswordResetUseCase<U, T>
where
    U: UserRepository,
    T: ResetTokenRepository,
{
    pub users: U,
    pub reset_tokens: T,
}

impl<U, T> RequestPasswordResetUseCase<U, T>
where
    U: UserRepository,
    T: ResetTokenRepository,
{
    /// Succeeds whether or not the email belongs to an account.
    pub async fn execute(&self, email: &str) -> Result<(), AuthServiceError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            tracing::info!("password reset requested for unknown email");
            return Ok(());
        };

        // Replaces any live token for the email; delivery reads the outbox.
        let token = ResetToken::issue(&user.email);
        let event = OutboxEvent::password_reset_requested(user.id, &token);
        self.reset_tokens
            .create_or_replace_with_outbox(&token, &event)
            .await?;

        tracing::info!(user_id = user.id, "password reset requested");
        Ok(())
    }
}

// ── ConfirmPasswordReset ─────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ConfirmPasswordResetInput {
    pub token: String,
    pub new_password: String,
}

pub struct ConfirmPasswordResetUseCase<U, T>
where
    U: UserRepository,
    T: ResetTokenRepository,
{
    pub users: U,
    pub reset_tokens: T,
    pub hasher: CredentialHasher,
}

impl<U, T> ConfirmPasswordResetUseCase<U, T>
where
    U: UserRepository,
    T: ResetTokenRepository,
{
    pub async fn execute(&self, input: ConfirmPasswordResetInput) -> Result<(), AuthServiceError> {
        let token_id = input
            .token
            .trim()
            .parse::<Uuid>()
            .map_err(|_| AuthServiceError::InvalidOrExpiredToken)?;
        let token = self
            .reset_tokens
            .find_valid_by_id(token_id)
            .await?
            .ok_or(AuthServiceError::InvalidOrExpiredToken)?;

        let user = self
            .users
            .find_by_email(&token.email)
            .await?
            .ok_or(AuthServiceError::UserNotFound)?;

        let password_hash = self.hasher.hash(&input.new_password).await?;

        // Password, session revocation and token consumption land together or not at all.
        let revoked = self
            .reset_tokens
            .redeem(token.id, user.id, &password_hash)
            .await?;

        tracing::info!(user_id = user.id, revoked, "password reset completed");
        Ok(())
    }
}
