use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration missing: {0}")]
    ConfigMissing(String),
    #[error("Failed to load artifact: {0}")]
    ArtifactLoad(String),
    #[error("Inference failed: {0}")]
    Inference(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl PipelineError {
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::ConfigMissing(_) => "config-missing",
            PipelineError::ArtifactLoad(_) => "artifact-load-failed",
            PipelineError::Inference(_) => "inference-failed",
            PipelineError::InvalidInput(_) => "invalid-input",
        }
    }
}

impl From<candle_core::Error> for PipelineError {
    fn from(err: candle_core::Error) -> Self {
        PipelineError::Inference(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("Training job {0} is already running")]
    AlreadyRunning(Uuid),
    #[error("Training job {0} not found")]
    NotFound(Uuid),
    #[error("Failed to launch training command: {0}")]
    Spawn(#[from] std::io::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
