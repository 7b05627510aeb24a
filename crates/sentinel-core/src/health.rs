use std::fmt::Display;

use axum::Json;
use axum::http::StatusCode;
use serde_json::{Map, Value, json};

/// Handler for `GET /healthz`: the process is up.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Build a `GET /readyz` response from named dependency checks.
///
/// 200 when every check passed, 503 otherwise. The body lists each check as
/// `"ok"` or its error message.
pub fn readiness<E: Display>(checks: Vec<(&'static str, Result<(), E>)>) -> (StatusCode, Json<Value>) {
    let mut ready = true;
    let mut report = Map::new();
    for (name, result) in checks {
        let entry = match result {
            Ok(()) => Value::from("ok"),
            Err(e) => {
                ready = false;
                tracing::warn!(check = name, error = %e, "readiness check failed");
                Value::from(e.to_string())
            }
        };
        report.insert(name.to_owned(), entry);
    }
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(json!({ "ready": ready, "checks": report })))
}
