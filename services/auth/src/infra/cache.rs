use deadpool_redis::Pool;
use deadpool_redis::redis::AsyncCommands;

use crate::domain::repository::PendingTwoFactorCache;
use crate::domain::types::{PENDING_TWO_FACTOR_TTL_SECS, PendingEnrollment};
use crate::error::AuthServiceError;

#[derive(Clone)]
pub struct RedisPendingTwoFactorCache {
    pub pool: Pool,
}

fn pending_key(user_id: i64) -> String {
    format!("2fa_pending:{user_id}")
}

impl RedisPendingTwoFactorCache {
    async fn conn(&self) -> Result<deadpool_redis::Connection, AuthServiceError> {
        self.pool
            .get()
            .await
            .map_err(|e| AuthServiceError::StoreUnavailable(e.into()))
    }

    /// Round-trip a `PING` for readiness checks.
    pub async fn ping(&self) -> Result<(), AuthServiceError> {
        let mut conn = self.conn().await?;
        let _: String = deadpool_redis::redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| AuthServiceError::StoreUnavailable(e.into()))?;
        Ok(())
    }
}

impl PendingTwoFactorCache for RedisPendingTwoFactorCache {
    async fn set_pending(
        &self,
        user_id: i64,
        enrollment: &PendingEnrollment,
    ) -> Result<(), AuthServiceError> {
        let value = serde_json::to_string(enrollment).map_err(AuthServiceError::internal)?;
        let mut conn = self.conn().await?;
        let (): () = conn
            .set_ex(pending_key(user_id), value, PENDING_TWO_FACTOR_TTL_SECS)
            .await
            .map_err(|e: deadpool_redis::redis::RedisError| {
                AuthServiceError::StoreUnavailable(e.into())
            })?;
        Ok(())
    }

    async fn get_pending(
        &self,
        user_id: i64,
    ) -> Result<Option<PendingEnrollment>, AuthServiceError> {
        let mut conn = self.conn().await?;
        let value: Option<String> = conn
            .get(pending_key(user_id))
            .await
            .map_err(|e| AuthServiceError::StoreUnavailable(e.into()))?;
        // An entry that no longer parses counts as no enrollment.
        Ok(value.and_then(|raw| match serde_json::from_str(&raw) {
            Ok(enrollment) => Some(enrollment),
            Err(e) => {
                tracing::warn!(user_id, error = %e, "discarding unreadable pending 2FA entry");
                None
            }
        }))
    }

    async fn clear_pending(&self, user_id: i64) -> Result<(), AuthServiceError> {
        let mut conn = self.conn().await?;
        let (): () = conn
            .del(pending_key(user_id))
            .await
            .map_err(|e: deadpool_redis::redis::RedisError| {
                AuthServiceError::StoreUnavailable(e.into())
            })?;
        Ok(())
    }
}
