use crate::{error::ErrorServer, health, predict, root, train, ui};
use textsum_core::training::dto::{JobStatus, TrainingJob};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(title = "textsum", description = "Text summarization API"),
    paths(
        root::handler::index,
        ui::handler::ui_page,
        predict::handler::predict,
        train::handler::train,
        train::handler::start_training_job,
        train::handler::list_training_jobs,
        train::handler::get_training_job,
        health::handler::health,
    ),
    components(schemas(
        predict::dto::PredictRequest,
        predict::dto::PredictResponse,
        train::dto::TrainMessage,
        health::dto::HealthResponse,
        TrainingJob,
        JobStatus,
        ErrorServer,
    ))
)]
pub struct ApiDoc;
