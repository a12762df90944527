use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use textsum_core::error::{PipelineError, TrainingError};
use utoipa::{ToResponse, ToSchema};

/// Serialized as `{"error": message}`; `status` only picks the HTTP code.
#[derive(Debug, Serialize, ToResponse, ToSchema)]
pub struct ErrorServer {
    #[serde(rename = "error")]
    pub message: String,
    #[serde(skip)]
    pub status: u16,
}

impl std::fmt::Display for ErrorServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl IntoResponse for ErrorServer {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

impl From<PipelineError> for ErrorServer {
    fn from(err: PipelineError) -> Self {
        let status = match err {
            PipelineError::ConfigMissing(_) => StatusCode::SERVICE_UNAVAILABLE,
            PipelineError::ArtifactLoad(_) => StatusCode::FAILED_DEPENDENCY,
            PipelineError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PipelineError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };

        ErrorServer {
            status: status.into(),
            message: err.to_string(),
        }
    }
}

impl From<TrainingError> for ErrorServer {
    fn from(err: TrainingError) -> Self {
        let status = match err {
            TrainingError::AlreadyRunning(_) => StatusCode::CONFLICT,
            TrainingError::NotFound(_) => StatusCode::NOT_FOUND,
            TrainingError::Spawn(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        ErrorServer {
            status: status.into(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serializes_single_key() {
        let err = ErrorServer {
            message: "boom".to_string(),
            status: 500,
        };
        assert_eq!(serde_json::to_value(&err).unwrap(), serde_json::json!({"error": "boom"}));
    }

    #[test]
    fn test_pipeline_error_status_codes() {
        let cases = [
            (PipelineError::ConfigMissing("x".into()), 503),
            (PipelineError::ArtifactLoad("x".into()), 424),
            (PipelineError::Inference("x".into()), 500),
            (PipelineError::InvalidInput("x".into()), 422),
        ];

        for (err, status) in cases {
            assert_eq!(ErrorServer::from(err).status, status);
        }
    }

    #[test]
    fn test_training_error_status_codes() {
        let id = uuid::Uuid::new_v4();
        assert_eq!(ErrorServer::from(TrainingError::AlreadyRunning(id)).status, 409);
        assert_eq!(ErrorServer::from(TrainingError::NotFound(id)).status, 404);
    }
}
