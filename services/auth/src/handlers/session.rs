use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use crate::domain::types::Session;
use crate::error::AuthServiceError;
use crate::guard::AuthenticatedUser;
use crate::state::AppState;
use crate::usecase::account::{ListSessionsUseCase, RevokeSessionUseCase};
use crate::usecase::login::{
    LoginInput, LoginOutcome, LoginOutput, LoginUseCase, LogoutAllUseCase, LogoutUseCase,
};

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

fn header_str(headers: &HeaderMap, name: impl header::AsHeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// First hop of `x-forwarded-for`, falling back to `x-real-ip`.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    header_str(headers, X_FORWARDED_FOR)
        .and_then(|v| v.split(',').next().map(|ip| ip.trim().to_owned()))
        .filter(|ip| !ip.is_empty())
        .or_else(|| header_str(headers, X_REAL_IP))
}

// ── POST /login ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub totp_code: Option<String>,
    pub recovery_code: Option<String>,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub requires_2fa: bool,
    #[serde(flatten)]
    pub tokens: Option<LoginOutput>,
}

pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthServiceError> {
    let usecase = LoginUseCase {
        users: state.user_repo(),
        sessions: state.session_repo(),
        bans: state.ban_repo(),
        recovery_codes: state.recovery_code_repo(),
        codec: state.codec.clone(),
        hasher: state.hasher.clone(),
    };
    let input = LoginInput {
        email: body.email,
        password: body.password,
        totp_code: body.totp_code,
        recovery_code: body.recovery_code,
        user_agent: header_str(&headers, header::USER_AGENT),
        ip_address: client_ip(&headers),
    };

    let outcome = state.request_context().run(usecase.execute(input)).await?;
    let response = match outcome {
        LoginOutcome::TwoFactorChallenge => LoginResponse {
            requires_2fa: true,
            tokens: None,
        },
        LoginOutcome::Authenticated(output) => LoginResponse {
            requires_2fa: false,
            tokens: Some(output),
        },
    };
    Ok(Json(response))
}

// ── POST /logout ─────────────────────────────────────────────────────────────

pub async fn logout(auth: AuthenticatedUser) -> Result<impl IntoResponse, AuthServiceError> {
    LogoutUseCase.execute(auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── POST /logout/all ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct LogoutAllResponse {
    pub revoked_sessions: u64,
}

pub async fn logout_all(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<LogoutAllResponse>, AuthServiceError> {
    let usecase = LogoutAllUseCase {
        sessions: state.session_repo(),
    };
    let revoked_sessions = state
        .request_context()
        .run(usecase.execute(auth.user_id))
        .await?;
    Ok(Json(LogoutAllResponse { revoked_sessions }))
}

// ── GET /sessions ────────────────────────────────────────────────────────────

pub async fn list_sessions(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<Vec<Session>>, AuthServiceError> {
    let usecase = ListSessionsUseCase {
        sessions: state.session_repo(),
    };
    let sessions = state
        .request_context()
        .run(usecase.execute(auth.user_id))
        .await?;
    Ok(Json(sessions))
}

// ── DELETE /sessions/{session_id} ────────────────────────────────────────────

pub async fn revoke_session(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(session_id): Path<i64>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let usecase = RevokeSessionUseCase {
        sessions: state.session_repo(),
    };
    state
        .request_context()
        .run(usecase.execute(auth.user_id, session_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
