use serde::Serialize;
use utoipa::ToSchema;

pub const TRAINING_SUCCESS_MESSAGE: &str = "Training successful !!";

#[derive(Debug, Serialize, ToSchema)]
pub struct TrainMessage {
    pub message: String,
}
