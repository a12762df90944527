use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TrainingJob {
    pub id: Uuid,
    pub status: JobStatus,
    pub command: String,
    pub exit_code: Option<i32>,
    /// Tail of the command output, stderr preferred.
    pub output: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl TrainingJob {
    pub fn new(command: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: JobStatus::Pending,
            command: command.to_string(),
            exit_code: None,
            output: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    pub fn failure_message(&self) -> String {
        match self.exit_code {
            Some(code) => format!("Training command exited with code {}", code),
            None => "Training command terminated without an exit code".to_string(),
        }
    }
}
