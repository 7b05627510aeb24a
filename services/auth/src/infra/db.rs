use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait,
    ActiveValue::{NotSet, Set},
    ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, SqlErr, TransactionTrait,
    sea_query::{Expr, OnConflict},
};
use uuid::Uuid;

use sentinel_auth_schema::{
    bans, outbox_events, recovery_codes, reset_passwords, sessions, users,
};

use crate::domain::repository::{
    BanRepository, RecoveryCodeRepository, ResetTokenRepository, SessionRepository,
    UserRepository,
};
use crate::domain::types::{
    Ban, NewBan, NewSession, NewUser, OutboxEvent, RecoveryCode, ResetToken, Session, User,
};
use crate::error::AuthServiceError;

// ── User repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl UserRepository for DbUserRepository {
    async fn create(&self, user: &NewUser) -> Result<User, AuthServiceError> {
        let result = users::ActiveModel {
            id: NotSet,
            nickname: Set(user.nickname.clone()),
            email: Set(user.email.clone()),
            password_hash: Set(user.password_hash.clone()),
            two_factor_enabled: Set(false),
            two_factor_secret: Set(None),
            date_of_birth: Set(user.date_of_birth),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
            deleted_at: Set(None),
        }
        .insert(&self.db)
        .await;

        match result {
            Ok(model) => Ok(user_from_model(model)),
            Err(e) => Err(unique_violation(&e).unwrap_or_else(|| {
                AuthServiceError::StoreUnavailable(anyhow::Error::new(e).context("create user"))
            })),
        }
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AuthServiceError> {
        let model = users::Entity::find_by_id(id)
            .filter(users::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .context("find user by id")?;
        Ok(model.map(user_from_model))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthServiceError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .filter(users::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .context("find user by email")?;
        Ok(model.map(user_from_model))
    }

    async fn find_by_nickname(&self, nickname: &str) -> Result<Option<User>, AuthServiceError> {
        let model = users::Entity::find()
            .filter(users::Column::Nickname.eq(nickname))
            .filter(users::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .context("find user by nickname")?;
        Ok(model.map(user_from_model))
    }

    async fn update(&self, user: &User) -> Result<(), AuthServiceError> {
        users::ActiveModel {
            id: Set(user.id),
            password_hash: Set(user.password_hash.clone()),
            two_factor_enabled: Set(user.two_factor_enabled),
            two_factor_secret: Set(user.two_factor_secret.clone()),
            updated_at: Set(Some(Utc::now())),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("update user")?;
        Ok(())
    }

    async fn soft_delete(&self, id: i64) -> Result<(), AuthServiceError> {
        users::Entity::update_many()
            .col_expr(users::Column::DeletedAt, Expr::value(Utc::now()))
            .filter(users::Column::Id.eq(id))
            .filter(users::Column::DeletedAt.is_null())
            .exec(&self.db)
            .await
            .context("soft delete user")?;
        Ok(())
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AuthServiceError> {
        let count = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .filter(users::Column::DeletedAt.is_null())
            .count(&self.db)
            .await
            .context("check email exists")?;
        Ok(count > 0)
    }

    async fn nickname_exists(&self, nickname: &str) -> Result<bool, AuthServiceError> {
        let count = users::Entity::find()
            .filter(users::Column::Nickname.eq(nickname))
            .filter(users::Column::DeletedAt.is_null())
            .count(&self.db)
            .await
            .context("check nickname exists")?;
        Ok(count > 0)
    }
}

/// Map a unique-index violation on insert to the identity it collided on.
fn unique_violation(err: &DbErr) -> Option<AuthServiceError> {
    match err.sql_err()? {
        SqlErr::UniqueConstraintViolation(msg) if msg.contains("nickname") => {
            Some(AuthServiceError::NicknameTaken)
        }
        SqlErr::UniqueConstraintViolation(_) => Some(AuthServiceError::EmailTaken),
        _ => None,
    }
}

fn user_from_model(model: users::Model) -> User {
    User {
        id: model.id,
        nickname: model.nickname,
        email: model.email,
        password_hash: model.password_hash,
        two_factor_enabled: model.two_factor_enabled,
        two_factor_secret: model.two_factor_secret,
        date_of_birth: model.date_of_birth,
        created_at: model.created_at,
        updated_at: model.updated_at,
        deleted_at: model.deleted_at,
    }
}

// ── Session repository ───────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbSessionRepository {
    pub db: DatabaseConnection,
}

impl SessionRepository for DbSessionRepository {
    async fn create(&self, session: &NewSession) -> Result<Session, AuthServiceError> {
        let model = sessions::ActiveModel {
            id: NotSet,
            user_id: Set(session.user_id),
            user_agent: Set(session.user_agent.clone()),
            ip_address: Set(session.ip_address.clone()),
            created_at: Set(Utc::now()),
            deleted_at: Set(None),
        }
        .insert(&self.db)
        .await
        .context("create session")?;
        Ok(session_from_model(model))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Session>, AuthServiceError> {
        let model = sessions::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find session by id")?;
        Ok(model.map(session_from_model))
    }

    async fn list_active_by_user(&self, user_id: i64) -> Result<Vec<Session>, AuthServiceError> {
        let models = sessions::Entity::find()
            .filter(sessions::Column::UserId.eq(user_id))
            .filter(sessions::Column::DeletedAt.is_null())
            .order_by_desc(sessions::Column::CreatedAt)
            .all(&self.db)
            .await
            .context("list active sessions")?;
        Ok(models.into_iter().map(session_from_model).collect())
    }

    async fn delete(&self, id: i64) -> Result<bool, AuthServiceError> {
        let result = sessions::Entity::update_many()
            .col_expr(sessions::Column::DeletedAt, Expr::value(Utc::now()))
            .filter(sessions::Column::Id.eq(id))
            .filter(sessions::Column::DeletedAt.is_null())
            .exec(&self.db)
            .await
            .context("delete session")?;
        Ok(result.rows_affected > 0)
    }

    async fn delete_all_by_user(&self, user_id: i64) -> Result<u64, AuthServiceError> {
        let result = sessions::Entity::update_many()
            .col_expr(sessions::Column::DeletedAt, Expr::value(Utc::now()))
            .filter(sessions::Column::UserId.eq(user_id))
            .filter(sessions::Column::DeletedAt.is_null())
            .exec(&self.db)
            .await
            .context("delete all sessions by user")?;
        Ok(result.rows_affected)
    }

    async fn cleanup_expired(&self, older_than: DateTime<Utc>) -> Result<u64, AuthServiceError> {
        let result = sessions::Entity::update_many()
            .col_expr(sessions::Column::DeletedAt, Expr::value(Utc::now()))
            .filter(sessions::Column::CreatedAt.lt(older_than))
            .filter(sessions::Column::DeletedAt.is_null())
            .exec(&self.db)
            .await
            .context("cleanup expired sessions")?;
        Ok(result.rows_affected)
    }
}

fn session_from_model(model: sessions::Model) -> Session {
    Session {
        id: model.id,
        user_id: model.user_id,
        user_agent: model.user_agent,
        ip_address: model.ip_address,
        created_at: model.created_at,
        deleted_at: model.deleted_at,
    }
}

// ── Reset-token repository ───────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbResetTokenRepository {
    pub db: DatabaseConnection,
}

impl ResetTokenRepository for DbResetTokenRepository {
    async fn create_or_replace_with_outbox(
        &self,
        token: &ResetToken,
        event: &OutboxEvent,
    ) -> Result<(), AuthServiceError> {
        self.db
            .transaction::<_, (), DbErr>(|txn| {
                let token = token.clone();
                let event = event.clone();
                Box::pin(async move {
                    upsert_reset_token(txn, &token).await?;
                    insert_outbox_event(txn, &event).await?;
                    Ok(())
                })
            })
            .await
            .context("create reset token with outbox")?;
        Ok(())
    }

    async fn find_valid_by_id(&self, id: Uuid) -> Result<Option<ResetToken>, AuthServiceError> {
        let model = reset_passwords::Entity::find_by_id(id)
            .filter(reset_passwords::Column::ExpiresAt.gt(Utc::now()))
            .one(&self.db)
            .await
            .context("find valid reset token by id")?;
        Ok(model.map(reset_token_from_model))
    }

    async fn find_valid_by_email(
        &self,
        email: &str,
    ) -> Result<Option<ResetToken>, AuthServiceError> {
        let model = reset_passwords::Entity::find()
            .filter(reset_passwords::Column::Email.eq(email))
            .filter(reset_passwords::Column::ExpiresAt.gt(Utc::now()))
            .one(&self.db)
            .await
            .context("find valid reset token by email")?;
        Ok(model.map(reset_token_from_model))
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<(), AuthServiceError> {
        reset_passwords::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete reset token by id")?;
        Ok(())
    }

    async fn redeem(
        &self,
        token_id: Uuid,
        user_id: i64,
        password_hash: &str,
    ) -> Result<u64, AuthServiceError> {
        let password_hash = password_hash.to_owned();
        let revoked = self
            .db
            .transaction::<_, Option<u64>, DbErr>(|txn| {
                Box::pin(async move {
                    // Conditional delete: a concurrent redeem of the same token loses here.
                    let consumed = reset_passwords::Entity::delete_many()
                        .filter(reset_passwords::Column::Id.eq(token_id))
                        .filter(reset_passwords::Column::ExpiresAt.gt(Utc::now()))
                        .exec(txn)
                        .await?;
                    if consumed.rows_affected == 0 {
                        return Ok(None);
                    }

                    let now = Utc::now();
                    users::Entity::update_many()
                        .col_expr(users::Column::PasswordHash, Expr::value(password_hash))
                        .col_expr(users::Column::UpdatedAt, Expr::value(now))
                        .filter(users::Column::Id.eq(user_id))
                        .exec(txn)
                        .await?;
                    let revoked = sessions::Entity::update_many()
                        .col_expr(sessions::Column::DeletedAt, Expr::value(now))
                        .filter(sessions::Column::UserId.eq(user_id))
                        .filter(sessions::Column::DeletedAt.is_null())
                        .exec(txn)
                        .await?;
                    Ok(Some(revoked.rows_affected))
                })
            })
            .await
            .context("redeem reset token")?;
        revoked.ok_or(AuthServiceError::InvalidOrExpiredToken)
    }

    async fn delete_by_email(&self, email: &str) -> Result<(), AuthServiceError> {
        reset_passwords::Entity::delete_many()
            .filter(reset_passwords::Column::Email.eq(email))
            .exec(&self.db)
            .await
            .context("delete reset token by email")?;
        Ok(())
    }

    async fn cleanup_expired(&self) -> Result<u64, AuthServiceError> {
        let result = reset_passwords::Entity::delete_many()
            .filter(reset_passwords::Column::ExpiresAt.lte(Utc::now()))
            .exec(&self.db)
            .await
            .context("cleanup expired reset tokens")?;
        Ok(result.rows_affected)
    }
}

/// One row per email: a second request overwrites id and timestamps in place.
async fn upsert_reset_token(txn: &DatabaseTransaction, token: &ResetToken) -> Result<(), DbErr> {
    let model = reset_passwords::ActiveModel {
        id: Set(token.id),
        email: Set(token.email.clone()),
        created_at: Set(token.created_at),
        expires_at: Set(token.expires_at),
    };
    reset_passwords::Entity::insert(model)
        .on_conflict(
            OnConflict::column(reset_passwords::Column::Email)
                .update_columns([
                    reset_passwords::Column::Id,
                    reset_passwords::Column::CreatedAt,
                    reset_passwords::Column::ExpiresAt,
                ])
                .to_owned(),
        )
        .exec_without_returning(txn)
        .await?;
    Ok(())
}

async fn insert_outbox_event(txn: &DatabaseTransaction, event: &OutboxEvent) -> Result<(), DbErr> {
    outbox_events::ActiveModel {
        id: Set(event.id),
        kind: Set(event.kind.clone()),
        user_id: Set(event.user_id),
        payload: Set(event.payload.clone()),
        idempotency_key: Set(event.idempotency_key.clone()),
        created_at: Set(Utc::now()),
        processed_at: Set(None),
    }
    .insert(txn)
    .await?;
    Ok(())
}

fn reset_token_from_model(model: reset_passwords::Model) -> ResetToken {
    ResetToken {
        id: model.id,
        email: model.email,
        created_at: model.created_at,
        expires_at: model.expires_at,
    }
}

// ── Recovery-code repository ─────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbRecoveryCodeRepository {
    pub db: DatabaseConnection,
}

impl RecoveryCodeRepository for DbRecoveryCodeRepository {
    async fn create(&self, user_id: i64, code_hashes: &[String]) -> Result<(), AuthServiceError> {
        if code_hashes.is_empty() {
            return Ok(());
        }
        let now = Utc::now();
        let models = code_hashes.iter().map(|hash| recovery_codes::ActiveModel {
            id: NotSet,
            user_id: Set(user_id),
            code_hash: Set(hash.clone()),
            created_at: Set(now),
            deleted_at: Set(None),
        });
        recovery_codes::Entity::insert_many(models)
            .exec_without_returning(&self.db)
            .await
            .context("create recovery codes")?;
        Ok(())
    }

    async fn list_active_by_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<RecoveryCode>, AuthServiceError> {
        let models = recovery_codes::Entity::find()
            .filter(recovery_codes::Column::UserId.eq(user_id))
            .filter(recovery_codes::Column::DeletedAt.is_null())
            .order_by_asc(recovery_codes::Column::Id)
            .all(&self.db)
            .await
            .context("list active recovery codes")?;
        Ok(models.into_iter().map(recovery_code_from_model).collect())
    }

    async fn delete_all_by_user(&self, user_id: i64) -> Result<(), AuthServiceError> {
        recovery_codes::Entity::update_many()
            .col_expr(recovery_codes::Column::DeletedAt, Expr::value(Utc::now()))
            .filter(recovery_codes::Column::UserId.eq(user_id))
            .filter(recovery_codes::Column::DeletedAt.is_null())
            .exec(&self.db)
            .await
            .context("delete recovery codes by user")?;
        Ok(())
    }

    async fn mark_used(&self, id: i64) -> Result<bool, AuthServiceError> {
        let result = recovery_codes::Entity::update_many()
            .col_expr(recovery_codes::Column::DeletedAt, Expr::value(Utc::now()))
            .filter(recovery_codes::Column::Id.eq(id))
            .filter(recovery_codes::Column::DeletedAt.is_null())
            .exec(&self.db)
            .await
            .context("mark recovery code used")?;
        Ok(result.rows_affected > 0)
    }
}

fn recovery_code_from_model(model: recovery_codes::Model) -> RecoveryCode {
    RecoveryCode {
        id: model.id,
        user_id: model.user_id,
        code_hash: model.code_hash,
        created_at: model.created_at,
        deleted_at: model.deleted_at,
    }
}

// ── Ban repository ───────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbBanRepository {
    pub db: DatabaseConnection,
}

impl BanRepository for DbBanRepository {
    async fn create(&self, ban: &NewBan) -> Result<Ban, AuthServiceError> {
        let model = bans::ActiveModel {
            id: NotSet,
            user_id: Set(ban.user_id),
            banned_by: Set(ban.banned_by),
            reason: Set(ban.reason.clone()),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await
        .context("create ban")?;
        Ok(ban_from_model(model))
    }

    async fn get_latest_by_user(&self, user_id: i64) -> Result<Option<Ban>, AuthServiceError> {
        let model = bans::Entity::find()
            .filter(bans::Column::UserId.eq(user_id))
            .order_by_desc(bans::Column::CreatedAt)
            .one(&self.db)
            .await
            .context("get latest ban by user")?;
        Ok(model.map(ban_from_model))
    }

    async fn exists_by_user(&self, user_id: i64) -> Result<bool, AuthServiceError> {
        let count = bans::Entity::find()
            .filter(bans::Column::UserId.eq(user_id))
            .count(&self.db)
            .await
            .context("check ban exists")?;
        Ok(count > 0)
    }
}

fn ban_from_model(model: bans::Model) -> Ban {
    Ban {
        id: model.id,
        user_id: model.user_id,
        banned_by: model.banned_by,
        reason: model.reason,
        created_at: model.created_at,
    }
}
