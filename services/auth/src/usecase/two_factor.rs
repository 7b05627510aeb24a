use serde::Serialize;
use subtle::ConstantTimeEq;

use crate::domain::repository::{PendingTwoFactorCache, RecoveryCodeRepository, UserRepository};
use crate::domain::types::PendingEnrollment;
use crate::error::AuthServiceError;
use crate::usecase::credential::{
    CredentialHasher, generate_recovery_codes, generate_totp_secret, provisioning_uri, supplied,
    verify_totp,
};

// ── Enable2FA ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct EnableTwoFactorOutput {
    pub secret: String,
    pub provisioning_uri: String,
    /// Plaintext codes; returned once and stored only as hashes.
    pub recovery_codes: Vec<String>,
}

pub struct EnableTwoFactorUseCase<U, C>
where
    U: UserRepository,
    C: PendingTwoFactorCache,
{
    pub users: U,
    pub pending: C,
    pub hasher: CredentialHasher,
    pub issuer: String,
}

impl<U, C> EnableTwoFactorUseCase<U, C>
where
    U: UserRepository,
    C: PendingTwoFactorCache,
{
    pub async fn execute(
        &self,
        user_id: i64,
        password: &str,
    ) -> Result<EnableTwoFactorOutput, AuthServiceError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthServiceError::UserNotFound)?;

        if !self.hasher.verify(password, &user.password_hash).await? {
            return Err(AuthServiceError::InvalidCredentials);
        }

        // Rotating the secret goes through Disable2FA first.
        if user.has_two_factor() {
            return Err(AuthServiceError::TwoFactorAlreadyEnabled);
        }

        let secret = generate_totp_secret();
        let provisioning_uri = provisioning_uri(&secret, &self.issuer, &user.email)?;
        let recovery_codes = generate_recovery_codes();
        let recovery_code_hashes = self.hasher.hash_all(&recovery_codes).await?;

        // Nothing reaches the recovery-code store until Confirm2FA.
        self.pending
            .set_pending(
                user.id,
                &PendingEnrollment {
                    secret: secret.clone(),
                    recovery_code_hashes,
                },
            )
            .await?;

        tracing::info!(user_id = user.id, "2FA enrollment started");
        Ok(EnableTwoFactorOutput {
            secret,
            provisioning_uri,
            recovery_codes,
        })
    }
}

// ── Confirm2FA ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ConfirmTwoFactorInput {
    pub user_id: i64,
    pub secret: String,
    pub totp_code: String,
}

pub struct ConfirmTwoFactorUseCase<U, R, C>
where
    U: UserRepository,
    R: RecoveryCodeRepository,
    C: PendingTwoFactorCache,
{
    pub users: U,
    pub recovery_codes: R,
    pub pending: C,
}

impl<U, R, C> ConfirmTwoFactorUseCase<U, R, C>
where
    U: UserRepository,
    R: RecoveryCodeRepository,
    C: PendingTwoFactorCache,
{
    pub async fn execute(&self, input: ConfirmTwoFactorInput) -> Result<(), AuthServiceError> {
        // 1. Only the secret handed out by the live enrollment can be confirmed.
        let pending = self
            .pending
            .get_pending(input.user_id)
            .await?
            .ok_or(AuthServiceError::TwoFactorNotPending)?;
        let matches: bool = pending
            .secret
            .as_bytes()
            .ct_eq(input.secret.trim().as_bytes())
            .into();
        if !matches {
            return Err(AuthServiceError::TwoFactorNotPending);
        }

        // 2. A wrong code leaves the enrollment in place for a retry.
        verify_totp(&pending.secret, &input.totp_code)?;

        // 3. Install the staged recovery codes, then persist and flip the flag.
        let mut user = self
            .users
            .find_by_id(input.user_id)
            .await?
            .ok_or(AuthServiceError::UserNotFound)?;
        if user.has_two_factor() {
            return Err(AuthServiceError::TwoFactorAlreadyEnabled);
        }
        self.recovery_codes.delete_all_by_user(user.id).await?;
        self.recovery_codes
            .create(user.id, &pending.recovery_code_hashes)
            .await?;
        user.two_factor_enabled = true;
        user.two_factor_secret = Some(pending.secret);
        self.users.update(&user).await?;
        self.pending.clear_pending(user.id).await?;

        tracing::info!(user_id = user.id, "2FA enabled");
        Ok(())
    }
}

// ── Disable2FA ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct DisableTwoFactorInput {
    pub user_id: i64,
    pub password: String,
    pub totp_code: Option<String>,
}

pub struct DisableTwoFactorUseCase<U, R>
where
    U: UserRepository,
    R: RecoveryCodeRepository,
{
    pub users: U,
    pub recovery_codes: R,
    pub hasher: CredentialHasher,
}

impl<U, R> DisableTwoFactorUseCase<U, R>
where
    U: UserRepository,
    R: RecoveryCodeRepository,
{
    pub async fn execute(&self, input: DisableTwoFactorInput) -> Result<(), AuthServiceError> {
        let mut user = self
            .users
            .find_by_id(input.user_id)
            .await?
            .ok_or(AuthServiceError::UserNotFound)?;

        if !self.hasher.verify(&input.password, &user.password_hash).await? {
            return Err(AuthServiceError::InvalidCredentials);
        }

        // A code is optional, but one that is supplied must be right.
        if let Some(code) = supplied(input.totp_code.as_deref()) {
            match user.two_factor_secret.as_deref() {
                Some(secret) if !secret.is_empty() => verify_totp(secret, code)?,
                _ => return Err(AuthServiceError::InvalidTwoFactorCode),
            }
        }

        user.two_factor_enabled = false;
        user.two_factor_secret = None;
        self.users.update(&user).await?;
        self.recovery_codes.delete_all_by_user(user.id).await?;

        tracing::info!(user_id = user.id, "2FA disabled");
        Ok(())
    }
}
