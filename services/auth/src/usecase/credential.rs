//! Password hashing, TOTP and recovery-code primitives shared by the use cases.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Argon2, Params, Version};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rand::RngExt;
use totp_rs::{Algorithm, Secret, TOTP};

use crate::domain::types::{RECOVERY_CODE_COUNT, RECOVERY_CODE_LEN};
use crate::error::AuthServiceError;

/// Base32 alphabet; recovery codes avoid 0/1/8/9 look-alikes.
const RECOVERY_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

const TOTP_DIGITS: usize = 6;
const TOTP_SKEW: u8 = 1;
const TOTP_STEP: u64 = 30;

/// Argon2id hasher. Hashes are PHC strings carrying their own salt and cost, so
/// verification ignores the configured parameters.
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    params: Params,
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl CredentialHasher {
    pub fn new(params: Params) -> Self {
        Self { params }
    }

    /// Override memory (KiB) and iteration cost; unset values keep the argon2 defaults.
    pub fn with_cost(memory_kib: Option<u32>, iterations: Option<u32>) -> anyhow::Result<Self> {
        let defaults = Params::default();
        let params = Params::new(
            memory_kib.unwrap_or(defaults.m_cost()),
            iterations.unwrap_or(defaults.t_cost()),
            defaults.p_cost(),
            None,
        )
        .map_err(|e| anyhow::anyhow!("invalid argon2 parameters: {e}"))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    fn hash_blocking(&self, secret: &str) -> Result<String, AuthServiceError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(secret.as_bytes(), &salt)
            .map_err(AuthServiceError::internal)?;
        Ok(hash.to_string())
    }

    fn verify_blocking(&self, secret: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "stored credential hash is not a valid PHC string");
                return false;
            }
        };
        self.argon2()
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok()
    }

    /// Run argon2 work on the blocking pool, off the async workers.
    async fn offload<F, T>(&self, work: F) -> Result<T, AuthServiceError>
    where
        F: FnOnce(CredentialHasher) -> T + Send + 'static,
        T: Send + 'static,
    {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || work(hasher))
            .await
            .map_err(AuthServiceError::internal)
    }

    pub async fn hash(&self, secret: &str) -> Result<String, AuthServiceError> {
        let secret = secret.to_owned();
        self.offload(move |hasher| hasher.hash_blocking(&secret))
            .await?
    }

    /// Hash a batch in one blocking task.
    pub async fn hash_all(&self, secrets: &[String]) -> Result<Vec<String>, AuthServiceError> {
        let secrets = secrets.to_vec();
        self.offload(move |hasher| {
            secrets
                .iter()
                .map(|secret| hasher.hash_blocking(secret))
                .collect::<Result<Vec<_>, _>>()
        })
        .await?
    }

    pub async fn verify(&self, secret: &str, hash: &str) -> Result<bool, AuthServiceError> {
        let secret = secret.to_owned();
        let hash = hash.to_owned();
        self.offload(move |hasher| hasher.verify_blocking(&secret, &hash))
            .await
    }

    /// Index of the first hash `secret` verifies against.
    pub async fn find_match(
        &self,
        secret: &str,
        hashes: Vec<String>,
    ) -> Result<Option<usize>, AuthServiceError> {
        let secret = secret.to_owned();
        self.offload(move |hasher| {
            hashes
                .iter()
                .position(|hash| hasher.verify_blocking(&secret, hash))
        })
        .await
    }

    /// Spend one hash computation without a stored credential to compare against.
    pub async fn burn(&self, secret: &str) -> Result<(), AuthServiceError> {
        self.hash(secret).await.map(|_| ())
    }
}

// ── TOTP ─────────────────────────────────────────────────────────────────────

/// Fresh 160-bit TOTP secret, base32 encoded.
pub fn generate_totp_secret() -> String {
    Secret::generate_secret().to_encoded().to_string()
}

fn build_totp(
    secret: &str,
    issuer: Option<String>,
    account: String,
) -> Result<TOTP, AuthServiceError> {
    let bytes = Secret::Encoded(secret.to_owned())
        .to_bytes()
        .map_err(|e| AuthServiceError::internal(anyhow::anyhow!("undecodable TOTP secret: {e:?}")))?;
    TOTP::new(
        Algorithm::SHA1,
        TOTP_DIGITS,
        TOTP_SKEW,
        TOTP_STEP,
        bytes,
        issuer,
        account,
    )
    .map_err(AuthServiceError::internal)
}

/// `otpauth://totp/...` URI for authenticator apps.
pub fn provisioning_uri(
    secret: &str,
    issuer: &str,
    account: &str,
) -> Result<String, AuthServiceError> {
    Ok(build_totp(secret, Some(issuer.to_owned()), account.to_owned())?.get_url())
}

/// Check a 6-digit code against `secret` at the current instant (±1 step).
pub fn verify_totp(secret: &str, code: &str) -> Result<(), AuthServiceError> {
    let totp = build_totp(secret, None, String::new())?;
    let valid = totp
        .check_current(code.trim())
        .map_err(AuthServiceError::internal)?;
    if valid {
        Ok(())
    } else {
        Err(AuthServiceError::InvalidTwoFactorCode)
    }
}

/// Treat an empty code field as not supplied.
pub fn supplied(code: Option<&str>) -> Option<&str> {
    code.map(str::trim).filter(|c| !c.is_empty())
}

// ── Recovery codes ───────────────────────────────────────────────────────────

fn generate_recovery_code() -> String {
    let mut rng = rand::rng();
    (0..RECOVERY_CODE_LEN)
        .map(|_| RECOVERY_CHARSET[rng.random_range(0..RECOVERY_CHARSET.len())] as char)
        .collect()
}

pub fn generate_recovery_codes() -> Vec<String> {
    (0..RECOVERY_CODE_COUNT)
        .map(|_| generate_recovery_code())
        .collect()
}

/// Recovery codes are compared case-insensitively and without separators.
pub fn normalize_recovery_code(code: &str) -> String {
    code.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

// ── Date of birth ────────────────────────────────────────────────────────────

/// Accepts `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SSZ` and full RFC 3339 timestamps.
pub fn parse_date_of_birth(value: &str) -> Result<NaiveDate, AuthServiceError> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%SZ") {
        return Ok(ts.date());
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.date_naive());
    }
    Err(AuthServiceError::InvalidDate)
}
