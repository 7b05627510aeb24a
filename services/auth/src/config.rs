use std::time::Duration;

use anyhow::{Context as _, bail};

/// Auth service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Redis connection URL (pending 2FA enrollments).
    pub redis_url: String,
    /// HMAC secret for signing access and refresh tokens.
    pub jwt_secret: String,
    /// TCP port to listen on (default 3112). Env var: `AUTH_PORT`.
    pub auth_port: u16,
    /// Issuer label shown by authenticator apps. Env var: `TOTP_ISSUER`.
    pub totp_issuer: String,
    /// Per-request deadline. Env var: `REQUEST_TIMEOUT_SECS`.
    pub request_timeout: Duration,
    /// Cleanup sweep cadence. Env var: `CLEANUP_INTERVAL_SECS`.
    pub cleanup_interval: Duration,
    pub argon2_memory_kib: Option<u32>,
    pub argon2_iterations: Option<u32>,
}

const DEFAULT_AUTH_PORT: u16 = 3112;
const DEFAULT_TOTP_ISSUER: &str = "Sentinel";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 3600;

impl AuthConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> anyhow::Result<String> {
            match lookup(key) {
                Some(v) if !v.trim().is_empty() => Ok(v),
                _ => bail!("{key} must be set"),
            }
        };
        let parsed = |key: &str| -> anyhow::Result<Option<u64>> {
            lookup(key)
                .map(|v| v.parse::<u64>().with_context(|| format!("{key} must be an integer")))
                .transpose()
        };
        let parsed_u32 = |key: &str| -> anyhow::Result<Option<u32>> {
            parsed(key)?
                .map(|v| u32::try_from(v).with_context(|| format!("{key} is out of range")))
                .transpose()
        };

        let auth_port = match parsed("AUTH_PORT")? {
            Some(port) => u16::try_from(port).context("AUTH_PORT is out of range")?,
            None => DEFAULT_AUTH_PORT,
        };
        let request_timeout = parsed("REQUEST_TIMEOUT_SECS")?.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        let cleanup_interval =
            parsed("CLEANUP_INTERVAL_SECS")?.unwrap_or(DEFAULT_CLEANUP_INTERVAL_SECS);
        if request_timeout == 0 || cleanup_interval == 0 {
            bail!("REQUEST_TIMEOUT_SECS and CLEANUP_INTERVAL_SECS must be positive");
        }

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            redis_url: required("REDIS_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            auth_port,
            totp_issuer: lookup("TOTP_ISSUER")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TOTP_ISSUER.to_owned()),
            request_timeout: Duration::from_secs(request_timeout),
            cleanup_interval: Duration::from_secs(cleanup_interval),
            argon2_memory_kib: parsed_u32("ARGON2_MEMORY_KIB")?,
            argon2_iterations: parsed_u32("ARGON2_ITERATIONS")?,
        })
    }
}
