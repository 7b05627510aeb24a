use axum::{
    Router, middleware,
    routing::{delete, get, post},
};

use sentinel_core::health::healthz;
use sentinel_core::middleware::{propagate_request_id_layer, request_id_layer, trace_layer};

use crate::guard::{optional_auth, require_auth};
use crate::handlers::{
    account::{get_profile, register, whoami},
    health::readyz,
    password::{change_password, confirm_password_reset, request_password_reset},
    session::{list_sessions, login, logout, logout_all, revoke_session},
    token::refresh_token,
    two_factor::{confirm_two_factor, disable_two_factor, enable_two_factor},
};
use crate::state::AppState;

pub const API_PREFIX: &str = "/api/v1/auth";

pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh_token))
        .route("/password/reset", post(request_password_reset))
        .route("/password/reset/confirm", post(confirm_password_reset));

    let protected = Router::new()
        .route("/profile", get(get_profile))
        .route("/logout", post(logout))
        .route("/logout/all", post(logout_all))
        .route("/password/change", post(change_password))
        // Two-factor
        .route("/2fa/enable", post(enable_two_factor))
        .route("/2fa/confirm", post(confirm_two_factor))
        .route("/2fa/disable", post(disable_two_factor))
        // Sessions
        .route("/sessions", get(list_sessions))
        .route("/sessions/{session_id}", delete(revoke_session))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let optional = Router::new()
        .route("/whoami", get(whoami))
        .route_layer(middleware::from_fn_with_state(state.clone(), optional_auth));

    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .nest(API_PREFIX, public.merge(protected).merge(optional))
        .layer(propagate_request_id_layer())
        .layer(trace_layer())
        .layer(request_id_layer())
        .with_state(state)
}
