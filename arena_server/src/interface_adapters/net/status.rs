use crate::interface_adapters::http::ErrorResponse;
use crate::interface_adapters::protocol::StatusDto;
use crate::interface_adapters::state::AppState;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

// Report tick, actor and pellet counts; 503 until the world is ready.
pub async fn status_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let status = *state.arena.status_tx.borrow();
    if !status.ready {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: "arena not ready".to_string(),
            }),
        )
            .into_response();
    }

    (StatusCode::OK, Json(StatusDto::from(status))).into_response()
}
