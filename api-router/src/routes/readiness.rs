use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use common::storage::store::SessionGuard;
use serde_json::json;

use crate::api_state::ApiState;

/// Readiness probe: returns 200 if a store session can be opened, else 503.
pub async fn ready(State(state): State<ApiState>) -> impl IntoResponse {
    let probe = tokio::time::timeout(state.store_timeout, state.store.connect()).await;
    let failure = match probe {
        Ok(Ok(session)) => {
            SessionGuard::new(session).release().await;
            None
        }
        Ok(Err(err)) => Some(err.to_string()),
        Err(_) => Some(format!("store probe timed out after {:?}", state.store_timeout)),
    };

    match failure {
        None => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "checks": { "store": "ok" }
            })),
        ),
        Some(reason) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "error",
                "checks": { "store": "fail" },
                "reason": reason
            })),
        ),
    }
}
