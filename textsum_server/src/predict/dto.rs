use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct PredictRequest {
    pub text: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PredictResponse {
    pub summary: String,
}
