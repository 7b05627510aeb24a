use axum::{Json, extract::State, http::StatusCode};
use serde_json::Value;

use sentinel_core::health::readiness;

use crate::error::AuthServiceError;
use crate::state::AppState;

fn describe(err: AuthServiceError) -> String {
    match err {
        AuthServiceError::StoreUnavailable(e) | AuthServiceError::Internal(e) => format!("{e:#}"),
        other => other.to_string(),
    }
}

// ── GET /readyz ──────────────────────────────────────────────────────────────

pub async fn readyz(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let ctx = state.request_context();
    let database = ctx
        .run(async {
            state
                .db
                .ping()
                .await
                .map_err(|e| AuthServiceError::StoreUnavailable(e.into()))
        })
        .await;
    let redis = ctx.run(state.pending_two_factor_cache().ping()).await;

    readiness(vec![
        ("database", database.map_err(describe)),
        ("redis", redis.map_err(describe)),
    ])
}
