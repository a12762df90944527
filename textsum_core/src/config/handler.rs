use std::{env, fs, path::Path};

use super::dto::{AppConfig, ModelEvaluationConfig, ServerConfig, TrainingConfig};
use crate::error::{PipelineError, PipelineResult};

pub const DEFAULT_CONFIG_FILE: &str = "config/config.ron";

#[derive(Debug, Clone)]
pub struct ConfigurationManager {
    config: AppConfig,
}

impl ConfigurationManager {
    /// Loads `CONFIG_FILE` (or `config/config.ron`) and applies environment overrides.
    pub fn new() -> PipelineResult<Self> {
        let path = env::var("CONFIG_FILE").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::from_path(path)
    }

    pub fn from_path(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref();

        let config = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                PipelineError::ConfigMissing(format!("cannot read {}: {}", path.display(), e))
            })?;
            parse_config(&content)?
        } else {
            log::warn!(
                "Config file {} not found, using environment and defaults",
                path.display()
            );
            AppConfig::default()
        };

        Ok(Self {
            config: apply_env_overrides(config),
        })
    }

    pub fn from_config(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn get_model_evaluation_config(&self) -> PipelineResult<ModelEvaluationConfig> {
        let section = &self.config.model_evaluation;

        if section.model_path.trim().is_empty() {
            return Err(PipelineError::ConfigMissing("model_path is not set".to_string()));
        }

        if section.tokenizer_path.trim().is_empty() {
            return Err(PipelineError::ConfigMissing(
                "tokenizer_path is not set".to_string(),
            ));
        }

        Ok(ModelEvaluationConfig {
            model_path: section.model_path.clone(),
            tokenizer_path: section.tokenizer_path.clone(),
        })
    }

    pub fn get_training_config(&self) -> TrainingConfig {
        self.config.training.clone()
    }

    pub fn get_server_config(&self) -> ServerConfig {
        self.config.server.clone()
    }
}

pub fn parse_config(content: &str) -> PipelineResult<AppConfig> {
    ron::from_str::<AppConfig>(content)
        .map_err(|e| PipelineError::ConfigMissing(format!("invalid config file: {}", e)))
}

fn apply_env_overrides(mut config: AppConfig) -> AppConfig {
    override_from_env("MODEL_PATH", &mut config.model_evaluation.model_path);
    override_from_env("TOKENIZER_PATH", &mut config.model_evaluation.tokenizer_path);
    override_from_env("TRAIN_COMMAND", &mut config.training.command);
    override_from_env("SERVER_DOMAIN", &mut config.server.address);
    override_from_env("TEMPLATES_DIR", &mut config.server.templates_dir);
    config
}

fn override_from_env(key: &str, field: &mut String) {
    if let Ok(value) = env::var(key) {
        if !value.trim().is_empty() {
            *field = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"(
        model_evaluation: (
            model_path: "artifacts/model_trainer/t5-samsum-model",
            tokenizer_path: "artifacts/model_trainer/tokenizer",
        ),
        training: (command: "python main.py --epochs 1"),
    )"#;

    fn clear_env() {
        for key in [
            "MODEL_PATH",
            "TOKENIZER_PATH",
            "TRAIN_COMMAND",
            "SERVER_DOMAIN",
            "TEMPLATES_DIR",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_parse_config_applies_defaults() {
        let config = parse_config(SAMPLE).unwrap();
        assert_eq!(
            config.model_evaluation.model_path,
            "artifacts/model_trainer/t5-samsum-model"
        );
        assert_eq!(config.training.command, "python main.py --epochs 1");
        assert_eq!(config.server.address, "0.0.0.0:8080");
        assert_eq!(config.server.templates_dir, "templates");
    }

    #[test]
    fn test_parse_config_rejects_garbage() {
        let err = parse_config("model_path = 3").unwrap_err();
        assert!(matches!(err, PipelineError::ConfigMissing(_)));
    }

    #[test]
    #[serial]
    fn test_from_path_reads_file() {
        clear_env();
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let manager = ConfigurationManager::from_path(file.path()).unwrap();
        let model = manager.get_model_evaluation_config().unwrap();
        assert_eq!(model.tokenizer_path, "artifacts/model_trainer/tokenizer");
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        clear_env();
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        env::set_var("MODEL_PATH", "google-t5/t5-small");
        env::set_var("SERVER_DOMAIN", "127.0.0.1:9000");

        let manager = ConfigurationManager::from_path(file.path()).unwrap();
        clear_env();

        let model = manager.get_model_evaluation_config().unwrap();
        assert_eq!(model.model_path, "google-t5/t5-small");
        assert_eq!(model.tokenizer_path, "artifacts/model_trainer/tokenizer");
        assert_eq!(manager.get_server_config().address, "127.0.0.1:9000");
    }

    #[test]
    #[serial]
    fn test_missing_file_without_env_is_config_missing() {
        clear_env();
        let manager = ConfigurationManager::from_path("does/not/exist.ron").unwrap();
        let err = manager.get_model_evaluation_config().unwrap_err();
        assert!(matches!(err, PipelineError::ConfigMissing(_)));
        assert_eq!(manager.get_training_config().command, "python main.py");
    }

    #[test]
    #[serial]
    fn test_shipped_config_points_at_t5_artifacts() {
        clear_env();
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../config/config.ron");

        let manager = ConfigurationManager::from_path(path).unwrap();
        let model = manager.get_model_evaluation_config().unwrap();
        assert_eq!(model.model_path, "artifacts/model_trainer/t5-samsum-model");
        assert_eq!(model.tokenizer_path, "artifacts/model_trainer/tokenizer");
        assert_eq!(manager.get_server_config().address, "0.0.0.0:8080");
    }
}
