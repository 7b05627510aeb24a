use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;

use crate::error::AuthServiceError;
use crate::guard::AuthenticatedUser;
use crate::state::AppState;
use crate::usecase::two_factor::{
    ConfirmTwoFactorInput, ConfirmTwoFactorUseCase, DisableTwoFactorInput,
    DisableTwoFactorUseCase, EnableTwoFactorOutput, EnableTwoFactorUseCase,
};

// ── POST /2fa/enable ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct EnableTwoFactorRequest {
    pub password: String,
}

pub async fn enable_two_factor(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(body): Json<EnableTwoFactorRequest>,
) -> Result<Json<EnableTwoFactorOutput>, AuthServiceError> {
    let usecase = EnableTwoFactorUseCase {
        users: state.user_repo(),
        pending: state.pending_two_factor_cache(),
        hasher: state.hasher.clone(),
        issuer: state.totp_issuer.clone(),
    };
    let output = state
        .request_context()
        .run(usecase.execute(auth.user_id, &body.password))
        .await?;
    Ok(Json(output))
}

// ── POST /2fa/confirm ────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ConfirmTwoFactorRequest {
    pub secret: String,
    pub totp_code: String,
}

pub async fn confirm_two_factor(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(body): Json<ConfirmTwoFactorRequest>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let usecase = ConfirmTwoFactorUseCase {
        users: state.user_repo(),
        recovery_codes: state.recovery_code_repo(),
        pending: state.pending_two_factor_cache(),
    };
    state
        .request_context()
        .run(usecase.execute(ConfirmTwoFactorInput {
            user_id: auth.user_id,
            secret: body.secret,
            totp_code: body.totp_code,
        }))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── POST /2fa/disable ────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct DisableTwoFactorRequest {
    pub password: String,
    pub totp_code: Option<String>,
}

pub async fn disable_two_factor(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(body): Json<DisableTwoFactorRequest>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let usecase = DisableTwoFactorUseCase {
        users: state.user_repo(),
        recovery_codes: state.recovery_code_repo(),
        hasher: state.hasher.clone(),
    };
    state
        .request_context()
        .run(usecase.execute(DisableTwoFactorInput {
            user_id: auth.user_id,
            password: body.password,
            totp_code: body.totp_code,
        }))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
