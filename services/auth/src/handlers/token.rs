use axum::{Json, extract::State};
use serde::Deserialize;

use crate::error::AuthServiceError;
use crate::state::AppState;
use crate::usecase::token::{RefreshTokenOutput, RefreshTokenUseCase};

// ── POST /refresh ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

pub async fn refresh_token(
    State(state): State<AppState>,
    Json(body): Json<RefreshTokenRequest>,
) -> Result<Json<RefreshTokenOutput>, AuthServiceError> {
    let usecase = RefreshTokenUseCase {
        users: state.user_repo(),
        bans: state.ban_repo(),
        codec: state.codec.clone(),
    };
    let output = state
        .request_context()
        .run(usecase.execute(&body.refresh_token))
        .await?;
    Ok(Json(output))
}
