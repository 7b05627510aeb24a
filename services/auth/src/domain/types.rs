use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sentinel_core::serde::{to_rfc3339_ms, to_rfc3339_ms_opt};

/// Account record as the credential store holds it.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub nickname: String,
    pub email: String,
    /// Argon2 PHC string. Never leaves the service.
    pub password_hash: String,
    pub two_factor_enabled: bool,
    pub two_factor_secret: Option<String>,
    pub date_of_birth: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Second factor counts only when the flag is set and a secret is stored.
    pub fn has_two_factor(&self) -> bool {
        self.two_factor_enabled
            && self
                .two_factor_secret
                .as_deref()
                .is_some_and(|s| !s.is_empty())
    }

    pub fn to_profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            nickname: self.nickname.clone(),
            email: self.email.clone(),
            two_factor_enabled: self.has_two_factor(),
            date_of_birth: self.date_of_birth,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub nickname: String,
    pub email: String,
    pub password_hash: String,
    pub date_of_birth: NaiveDate,
}

/// Public projection of [`User`].
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub nickname: String,
    pub email: String,
    pub two_factor_enabled: bool,
    pub date_of_birth: NaiveDate,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(
        serialize_with = "to_rfc3339_ms_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: i64,
    pub user_id: i64,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewSession {
    pub user_id: i64,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

/// Password-reset grant. The id is the secret handed to the user.
#[derive(Debug, Clone)]
pub struct ResetToken {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl ResetToken {
    pub fn issue(email: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: email.to_owned(),
            created_at: now,
            expires_at: now + chrono::Duration::hours(RESET_TOKEN_TTL_HOURS),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.expires_at > Utc::now()
    }
}

#[derive(Debug, Clone)]
pub struct RecoveryCode {
    pub id: i64,
    pub user_id: i64,
    pub code_hash: String,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Unconfirmed 2FA enrollment. The recovery codes only reach the recovery-code
/// store once the secret is confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingEnrollment {
    pub secret: String,
    pub recovery_code_hashes: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Ban {
    pub id: i64,
    pub user_id: i64,
    pub banned_by: i64,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewBan {
    pub user_id: i64,
    pub banned_by: i64,
    pub reason: String,
}

/// Notification handed to the external delivery consumer through the outbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxEvent {
    pub id: Uuid,
    pub kind: String,
    pub user_id: i64,
    pub payload: serde_json::Value,
    /// Repeated writes of the same event collapse onto one row.
    pub idempotency_key: String,
}

impl OutboxEvent {
    pub fn password_reset_requested(user_id: i64, token: &ResetToken) -> Self {
        Self {
            id: Uuid::now_v7(),
            kind: OUTBOX_PASSWORD_RESET_REQUESTED.to_owned(),
            user_id,
            payload: serde_json::json!({
                "email": token.email,
                "token": token.id,
                "expires_at": token.expires_at,
            }),
            idempotency_key: format!("password_reset:{}", token.id),
        }
    }
}

pub const OUTBOX_PASSWORD_RESET_REQUESTED: &str = "password_reset_requested";

/// Sessions older than this are reaped by the cleanup worker.
pub const SESSION_RETENTION_DAYS: i64 = 30;

pub const RESET_TOKEN_TTL_HOURS: i64 = 24;

pub const RECOVERY_CODE_COUNT: usize = 10;

pub const RECOVERY_CODE_LEN: usize = 8;

/// Lifetime of an unconfirmed 2FA enrollment.
pub const PENDING_TWO_FACTOR_TTL_SECS: u64 = 600;
