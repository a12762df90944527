use std::sync::Arc;

use axum::{Json, extract::State};

use super::dto::HealthResponse;
use crate::state::ServerState;

#[utoipa::path(
    get,
    path = "/health",
    description = "Liveness and model status",
    responses(
        (status = 200, description = "Success", body = HealthResponse),
    )
)]
pub async fn health(State(server_state): State<Arc<ServerState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        model_loaded: server_state.pipeline().is_loaded(),
    })
}
