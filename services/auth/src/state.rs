use std::time::Duration;

use deadpool_redis::Pool as RedisPool;
use sea_orm::DatabaseConnection;
use tokio::sync::watch;

use sentinel_auth_types::token::TokenCodec;
use sentinel_core::context::RequestContext;

use crate::infra::cache::RedisPendingTwoFactorCache;
use crate::infra::db::{
    DbBanRepository, DbRecoveryCodeRepository, DbResetTokenRepository, DbSessionRepository,
    DbUserRepository,
};
use crate::usecase::credential::CredentialHasher;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub redis: RedisPool,
    pub codec: TokenCodec,
    pub hasher: CredentialHasher,
    pub totp_issuer: String,
    pub request_timeout: Duration,
    /// Flips to `true` when the process starts shutting down.
    pub shutdown: watch::Receiver<bool>,
}

impl AppState {
    /// Deadline and cancellation scope for one request.
    pub fn request_context(&self) -> RequestContext {
        RequestContext::with_timeout(self.request_timeout).with_cancel(self.shutdown.clone())
    }

    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
        }
    }

    pub fn session_repo(&self) -> DbSessionRepository {
        DbSessionRepository {
            db: self.db.clone(),
        }
    }

    pub fn reset_token_repo(&self) -> DbResetTokenRepository {
        DbResetTokenRepository {
            db: self.db.clone(),
        }
    }

    pub fn recovery_code_repo(&self) -> DbRecoveryCodeRepository {
        DbRecoveryCodeRepository {
            db: self.db.clone(),
        }
    }

    pub fn ban_repo(&self) -> DbBanRepository {
        DbBanRepository {
            db: self.db.clone(),
        }
    }

    pub fn pending_two_factor_cache(&self) -> RedisPendingTwoFactorCache {
        RedisPendingTwoFactorCache {
            pool: self.redis.clone(),
        }
    }
}
