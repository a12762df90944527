use std::sync::Arc;

use axum::{
    Json,
    extract::{Form, State, rejection::FormRejection},
};

use super::dto::{PredictRequest, PredictResponse};
use crate::{error::ErrorServer, state::ServerState};

#[utoipa::path(
    post,
    path = "/predict",
    request_body(content = PredictRequest, content_type = "application/x-www-form-urlencoded"),
    description = "Summarize the submitted text",
    responses(
        (status = 200, description = "Success", body = PredictResponse),
        (status = 422, description = "Invalid input", body = ErrorServer),
        (status = 424, description = "Model artifacts could not be loaded", body = ErrorServer),
        (status = 500, description = "Inference failed", body = ErrorServer),
        (status = 503, description = "Model paths not configured", body = ErrorServer),
    )
)]
pub async fn predict(
    State(server_state): State<Arc<ServerState>>,
    form: Result<Form<PredictRequest>, FormRejection>,
) -> Result<Json<PredictResponse>, ErrorServer> {
    let Form(request) = form.map_err(|e| ErrorServer {
        status: e.status().into(),
        message: e.body_text(),
    })?;

    let summary = server_state
        .pipeline()
        .summarize(request.text)
        .await
        .map_err(|e| {
            log::error!("Prediction failed ({}): {}", e.kind(), e);
            ErrorServer::from(e)
        })?;

    Ok(Json(PredictResponse { summary }))
}
