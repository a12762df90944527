use std::sync::Arc;

use tokenizers::Tokenizer;
use tokio::sync::RwLock;

use super::dto::GenerationParams;
use super::helpers::{clean_output, device_label, select_device, validate_input};
use crate::config::dto::ModelEvaluationConfig;
use crate::config::handler::ConfigurationManager;
use crate::error::{PipelineError, PipelineResult};
use crate::generation::beam::BeamSearch;
use crate::model::artifacts::{resolve_model_files, resolve_tokenizer_file};
use crate::model::t5::Seq2SeqModel;

pub trait Summarize: Send + Sync {
    fn summarize(&self, text: &str) -> PipelineResult<String>;
}

pub struct PredictionPipeline {
    tokenizer: Tokenizer,
    model: Seq2SeqModel,
    params: GenerationParams,
}

impl PredictionPipeline {
    pub fn new(config: &ModelEvaluationConfig) -> PipelineResult<Self> {
        let device = select_device();

        let tokenizer_file = resolve_tokenizer_file(&config.tokenizer_path)?;
        let tokenizer = Tokenizer::from_file(&tokenizer_file).map_err(|e| {
            PipelineError::ArtifactLoad(format!(
                "cannot load tokenizer from '{}': {}",
                tokenizer_file.display(),
                e
            ))
        })?;

        let files = resolve_model_files(&config.model_path)?;
        let model = Seq2SeqModel::load(&files, &device)?;

        log::info!(
            "Loaded summarization model from {} on {}",
            config.model_path,
            device_label(model.device())
        );

        Ok(Self {
            tokenizer,
            model,
            params: GenerationParams::default(),
        })
    }

    pub fn from_configuration(manager: &ConfigurationManager) -> PipelineResult<Self> {
        let config = manager.get_model_evaluation_config()?;
        Self::new(&config)
    }

    pub fn predict(&self, text: &str) -> PipelineResult<String> {
        validate_input(text)?;

        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| PipelineError::Inference(format!("tokenize: {}", e)))?;

        let mut session = self.model.session(encoding.get_ids())?;

        let search = BeamSearch {
            num_beams: self.params.num_beams,
            length_penalty: self.params.length_penalty,
            max_length: self.params.max_length,
            start_token: self.model.decoder_start_token(),
            eos_token: self.model.eos_token(),
        };
        let best = search.run(&mut session)?;

        let raw = self
            .tokenizer
            .decode(&best.tokens, true)
            .map_err(|e| PipelineError::Inference(format!("decode: {}", e)))?;

        Ok(clean_output(&raw))
    }
}

impl Summarize for PredictionPipeline {
    fn summarize(&self, text: &str) -> PipelineResult<String> {
        self.predict(text)
    }
}

pub type PipelineLoader = Arc<dyn Fn() -> PipelineResult<Arc<dyn Summarize>> + Send + Sync>;

/// Process-wide holder of the loaded pipeline.
///
/// Loads lazily through `loader`, at most one load at a time, and can be
/// invalidated so the next request picks up new artifacts.
pub struct PipelineSlot {
    loader: PipelineLoader,
    current: RwLock<Option<Arc<dyn Summarize>>>,
}

impl PipelineSlot {
    pub fn new(loader: PipelineLoader) -> Self {
        Self {
            loader,
            current: RwLock::new(None),
        }
    }

    pub fn from_configuration(manager: ConfigurationManager) -> Self {
        Self::new(Arc::new(move || -> PipelineResult<Arc<dyn Summarize>> {
            let pipeline = PredictionPipeline::from_configuration(&manager)?;
            Ok(Arc::new(pipeline) as Arc<dyn Summarize>)
        }))
    }

    pub async fn get(&self) -> PipelineResult<Arc<dyn Summarize>> {
        if let Some(pipeline) = self.current.read().await.as_ref() {
            return Ok(pipeline.clone());
        }

        let mut current = self.current.write().await;
        if let Some(pipeline) = current.as_ref() {
            return Ok(pipeline.clone());
        }

        let loader = self.loader.clone();
        let pipeline = tokio::task::spawn_blocking(move || loader())
            .await
            .map_err(|e| PipelineError::ArtifactLoad(format!("loader task failed: {}", e)))??;

        *current = Some(pipeline.clone());
        Ok(pipeline)
    }

    /// Never waits on an in-flight load; a slot that is still loading reports `false`.
    pub fn is_loaded(&self) -> bool {
        self.current
            .try_read()
            .map(|current| current.is_some())
            .unwrap_or(false)
    }

    pub async fn invalidate(&self) {
        let mut current = self.current.write().await;
        if current.take().is_some() {
            log::info!("Summarization pipeline invalidated, next request reloads artifacts");
        }
    }

    pub async fn summarize(&self, text: String) -> PipelineResult<String> {
        let pipeline = self.get().await?;

        tokio::task::spawn_blocking(move || pipeline.summarize(&text))
            .await
            .map_err(|e| PipelineError::Inference(format!("inference task failed: {}", e)))?
    }
}
