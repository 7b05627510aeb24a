use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};

use crate::domain::types::UserProfile;
use crate::error::AuthServiceError;
use crate::guard::{AuthenticatedUser, MaybeUser};
use crate::state::AppState;
use crate::usecase::account::GetProfileUseCase;
use crate::usecase::register::{RegisterInput, RegisterUseCase};

// ── POST /register ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub nickname: String,
    pub email: String,
    pub password: String,
    /// `YYYY-MM-DD` or an RFC 3339 timestamp.
    pub date_of_birth: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let usecase = RegisterUseCase {
        users: state.user_repo(),
        hasher: state.hasher.clone(),
    };
    let profile = state
        .request_context()
        .run(usecase.execute(RegisterInput {
            nickname: body.nickname,
            email: body.email,
            password: body.password,
            date_of_birth: body.date_of_birth,
        }))
        .await?;

    Ok((StatusCode::CREATED, Json(profile)))
}

// ── GET /profile ─────────────────────────────────────────────────────────────

pub async fn get_profile(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<UserProfile>, AuthServiceError> {
    let usecase = GetProfileUseCase {
        users: state.user_repo(),
    };
    let profile = state
        .request_context()
        .run(usecase.execute(auth.user_id))
        .await?;
    Ok(Json(profile))
}

// ── GET /whoami ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct WhoAmIResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
}

pub async fn whoami(MaybeUser(identity): MaybeUser) -> Json<WhoAmIResponse> {
    Json(WhoAmIResponse {
        authenticated: identity.is_some(),
        user: identity.map(|i| i.user.to_profile()),
    })
}
