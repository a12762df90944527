use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use textsum_core::training::dto::{JobStatus, TrainingJob};
use uuid::Uuid;

use super::dto::{TRAINING_SUCCESS_MESSAGE, TrainMessage};
use crate::{error::ErrorServer, state::ServerState};

#[utoipa::path(
    get,
    path = "/train",
    description = "Run the training command and wait for it to finish",
    responses(
        (status = 200, description = "Success", body = TrainMessage),
        (status = 409, description = "A training job is already running", body = ErrorServer),
        (status = 500, description = "Training failed", body = ErrorServer),
    )
)]
pub async fn train(
    State(server_state): State<Arc<ServerState>>,
) -> Result<Json<TrainMessage>, ErrorServer> {
    let training = server_state.training();

    let handle = training.start().await?;
    let job = training.wait(handle).await?;

    if job.status != JobStatus::Succeeded {
        return Err(ErrorServer {
            status: StatusCode::INTERNAL_SERVER_ERROR.into(),
            message: job.failure_message(),
        });
    }

    Ok(Json(TrainMessage {
        message: TRAINING_SUCCESS_MESSAGE.to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/train/jobs",
    description = "Start a training job in the background",
    responses(
        (status = 202, description = "Job started", body = TrainingJob),
        (status = 409, description = "A training job is already running", body = ErrorServer),
    )
)]
pub async fn start_training_job(
    State(server_state): State<Arc<ServerState>>,
) -> Result<(StatusCode, Json<TrainingJob>), ErrorServer> {
    let handle = server_state.training().start().await?;

    Ok((StatusCode::ACCEPTED, Json(handle.job)))
}

#[utoipa::path(
    get,
    path = "/train/jobs",
    description = "List training jobs, newest first",
    responses(
        (status = 200, description = "Success", body = [TrainingJob]),
    )
)]
pub async fn list_training_jobs(
    State(server_state): State<Arc<ServerState>>,
) -> Json<Vec<TrainingJob>> {
    Json(server_state.training().list())
}

#[utoipa::path(
    get,
    path = "/train/jobs/{id}",
    description = "Get a training job",
    params(
        ("id" = Uuid, Path, description = "Training job id"),
    ),
    responses(
        (status = 200, description = "Success", body = TrainingJob),
        (status = 404, description = "Unknown job", body = ErrorServer),
    )
)]
pub async fn get_training_job(
    State(server_state): State<Arc<ServerState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<TrainingJob>, ErrorServer> {
    let job = server_state.training().get(id)?;

    Ok(Json(job))
}
