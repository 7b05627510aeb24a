use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;

use crate::error::AuthServiceError;
use crate::guard::AuthenticatedUser;
use crate::state::AppState;
use crate::usecase::password::{
    ChangePasswordInput, ChangePasswordUseCase, ConfirmPasswordResetInput,
    ConfirmPasswordResetUseCase, RequestPasswordResetUseCase,
};

// ── POST /password/change ────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub totp_code: Option<String>,
}

pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let usecase = ChangePasswordUseCase {
        users: state.user_repo(),
        hasher: state.hasher.clone(),
    };
    state
        .request_context()
        .run(usecase.execute(ChangePasswordInput {
            user_id: auth.user_id,
            current_password: body.current_password,
            new_password: body.new_password,
            totp_code: body.totp_code,
        }))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── POST /password/reset ─────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

/// Always 202: the response does not reveal whether the email is registered.
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(body): Json<PasswordResetRequest>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let usecase = RequestPasswordResetUseCase {
        users: state.user_repo(),
        reset_tokens: state.reset_token_repo(),
    };
    state
        .request_context()
        .run(usecase.execute(&body.email))
        .await?;
    Ok(StatusCode::ACCEPTED)
}

// ── POST /password/reset/confirm ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ConfirmPasswordResetRequest {
    pub token: String,
    pub new_password: String,
}

pub async fn confirm_password_reset(
    State(state): State<AppState>,
    Json(body): Json<ConfirmPasswordResetRequest>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let usecase = ConfirmPasswordResetUseCase {
        users: state.user_repo(),
        reset_tokens: state.reset_token_repo(),
        hasher: state.hasher.clone(),
    };
    state
        .request_context()
        .run(usecase.execute(ConfirmPasswordResetInput {
            token: body.token,
            new_password: body.new_password,
        }))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
