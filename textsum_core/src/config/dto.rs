use serde::{Deserialize, Serialize};

pub const DEFAULT_TRAIN_COMMAND: &str = "python main.py";
pub const DEFAULT_SERVER_ADDRESS: &str = "0.0.0.0:8080";
pub const DEFAULT_TEMPLATES_DIR: &str = "templates";

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub model_evaluation: ModelEvaluationSection,
    #[serde(default)]
    pub training: TrainingConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Raw model section as written in the config file. Empty strings mean unset.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct ModelEvaluationSection {
    #[serde(default)]
    pub model_path: String,
    #[serde(default)]
    pub tokenizer_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelEvaluationConfig {
    pub model_path: String,
    pub tokenizer_path: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TrainingConfig {
    #[serde(default = "default_train_command")]
    pub command: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_server_address")]
    pub address: String,
    #[serde(default = "default_templates_dir")]
    pub templates_dir: String,
}

fn default_train_command() -> String {
    DEFAULT_TRAIN_COMMAND.to_string()
}

fn default_server_address() -> String {
    DEFAULT_SERVER_ADDRESS.to_string()
}

fn default_templates_dir() -> String {
    DEFAULT_TEMPLATES_DIR.to_string()
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            command: default_train_command(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_server_address(),
            templates_dir: default_templates_dir(),
        }
    }
}
