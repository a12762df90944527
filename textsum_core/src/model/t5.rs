use std::fs;

use candle_core::{DType, Device, Tensor, D};
use candle_nn::VarBuilder;
use candle_transformers::models::t5::{Config, T5ForConditionalGeneration};

use super::artifacts::ModelFiles;
use crate::error::{PipelineError, PipelineResult};
use crate::generation::beam::StepScorer;

/// A loaded encoder-decoder model bound to a device.
pub struct Seq2SeqModel {
    model: T5ForConditionalGeneration,
    config: Config,
    device: Device,
}

impl Seq2SeqModel {
    pub fn load(files: &ModelFiles, device: &Device) -> PipelineResult<Self> {
        let raw = fs::read_to_string(&files.config).map_err(|e| {
            PipelineError::ArtifactLoad(format!("cannot read {}: {}", files.config.display(), e))
        })?;

        let mut config: Config = serde_json::from_str(&raw).map_err(|e| {
            PipelineError::ArtifactLoad(format!("invalid {}: {}", files.config.display(), e))
        })?;
        // Beams are rescored from the full prefix each step.
        config.use_cache = false;

        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&files.weights, DType::F32, device) }
            .map_err(|e| PipelineError::ArtifactLoad(format!("cannot map weights: {}", e)))?;

        let model = T5ForConditionalGeneration::load(vb, &config)
            .map_err(|e| PipelineError::ArtifactLoad(format!("cannot build model: {}", e)))?;

        Ok(Self {
            model,
            config,
            device: device.clone(),
        })
    }

    pub fn decoder_start_token(&self) -> u32 {
        self.config
            .decoder_start_token_id
            .unwrap_or(self.config.pad_token_id) as u32
    }

    pub fn eos_token(&self) -> u32 {
        self.config.eos_token_id as u32
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Encodes the input once and returns a scorer owning its own model handle.
    pub fn session(&self, input_ids: &[u32]) -> PipelineResult<Seq2SeqSession> {
        let mut model = self.model.clone();
        model.clear_kv_cache();

        let input = Tensor::new(input_ids, &self.device)?.unsqueeze(0)?;
        let encoder_output = model.encode(&input)?;

        Ok(Seq2SeqSession {
            model,
            encoder_output,
            device: self.device.clone(),
        })
    }
}

pub struct Seq2SeqSession {
    model: T5ForConditionalGeneration,
    encoder_output: Tensor,
    device: Device,
}

impl StepScorer for Seq2SeqSession {
    fn log_probs(&mut self, prefixes: &[Vec<u32>]) -> PipelineResult<Vec<Vec<f32>>> {
        let batch = prefixes.len();
        let seq_len = prefixes.first().map(|p| p.len()).unwrap_or(0);

        if batch == 0 || seq_len == 0 || prefixes.iter().any(|p| p.len() != seq_len) {
            return Err(PipelineError::Inference(
                "decoder prefixes must be non-empty and of equal length".to_string(),
            ));
        }

        let flat: Vec<u32> = prefixes.concat();
        let decoder_ids = Tensor::from_vec(flat, (batch, seq_len), &self.device)?;

        let encoder_output = if batch == 1 {
            self.encoder_output.clone()
        } else {
            self.encoder_output.repeat((batch, 1, 1))?
        };

        let logits = self
            .model
            .decode(&decoder_ids, &encoder_output)?
            .to_dtype(DType::F32)?;
        let log_probs = candle_nn::ops::log_softmax(&logits, D::Minus1)?;

        Ok(log_probs.to_vec2::<f32>()?)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::path::Path;

    use candle_nn::VarMap;
    use tempfile::TempDir;

    use crate::generation::beam::BeamSearch;
    use crate::pipeline::dto::GENERATION_PARAMS;

    pub(crate) const TINY_VOCAB: usize = 32;

    const TINY_CONFIG: &str = r#"{
        "vocab_size": 32,
        "d_model": 16,
        "d_kv": 4,
        "d_ff": 32,
        "num_layers": 1,
        "num_decoder_layers": 1,
        "num_heads": 4,
        "relative_attention_num_buckets": 8,
        "relative_attention_max_distance": 16,
        "dropout_rate": 0.0,
        "layer_norm_epsilon": 1e-6,
        "initializer_factor": 1.0,
        "feed_forward_proj": "relu",
        "tie_word_embeddings": true,
        "is_decoder": false,
        "is_encoder_decoder": true,
        "use_cache": true,
        "pad_token_id": 0,
        "eos_token_id": 1,
        "decoder_start_token_id": 2
    }"#;

    /// Writes a randomly initialised tiny checkpoint into `dir`.
    pub(crate) fn write_tiny_model(dir: &Path) -> ModelFiles {
        let config: Config = serde_json::from_str(TINY_CONFIG).unwrap();
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        T5ForConditionalGeneration::load(vb, &config).unwrap();

        let files = ModelFiles {
            config: dir.join("config.json"),
            weights: vec![dir.join("model.safetensors")],
        };
        fs::write(&files.config, TINY_CONFIG).unwrap();
        varmap.save(&files.weights[0]).unwrap();
        files
    }

    fn load_tiny_model(dir: &Path) -> Seq2SeqModel {
        let files = write_tiny_model(dir);
        Seq2SeqModel::load(&files, &Device::Cpu).unwrap()
    }

    #[test]
    fn test_special_tokens_come_from_config() {
        let temp = TempDir::new().unwrap();
        let model = load_tiny_model(temp.path());

        assert_eq!(model.decoder_start_token(), 2);
        assert_eq!(model.eos_token(), 1);
    }

    #[test]
    fn test_batched_scoring_matches_single_prefix() {
        let temp = TempDir::new().unwrap();
        let model = load_tiny_model(temp.path());
        let start = model.decoder_start_token();

        let mut session = model.session(&[5, 9, 14, 1]).unwrap();
        let prefixes = vec![vec![start, 3], vec![start, 7], vec![start, 11]];

        let batch = session.log_probs(&prefixes).unwrap();
        assert_eq!(batch.len(), 3);

        for (prefix, batched) in prefixes.iter().zip(batch.iter()) {
            let single = session.log_probs(std::slice::from_ref(prefix)).unwrap();
            assert_eq!(single.len(), 1);
            assert_eq!(single[0].len(), TINY_VOCAB);
            assert_eq!(batched.len(), TINY_VOCAB);

            for (a, b) in single[0].iter().zip(batched.iter()) {
                assert!((a - b).abs() < 1e-4, "single {} vs batched {}", a, b);
            }

            let mass: f32 = batched.iter().map(|logp| logp.exp()).sum();
            assert!((mass - 1.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_ragged_prefixes_are_rejected() {
        let temp = TempDir::new().unwrap();
        let model = load_tiny_model(temp.path());

        let mut session = model.session(&[5, 9, 1]).unwrap();
        let err = session.log_probs(&[vec![2], vec![2, 3]]).unwrap_err();
        assert!(matches!(err, PipelineError::Inference(_)));
    }

    #[test]
    fn test_beam_search_over_model_respects_max_length() {
        let temp = TempDir::new().unwrap();
        let model = load_tiny_model(temp.path());

        let mut session = model.session(&[5, 9, 14, 20, 1]).unwrap();
        let search = BeamSearch {
            num_beams: GENERATION_PARAMS.num_beams,
            length_penalty: GENERATION_PARAMS.length_penalty,
            max_length: 10,
            start_token: model.decoder_start_token(),
            eos_token: model.eos_token(),
        };

        let best = search.run(&mut session).unwrap();
        assert!(best.tokens.len() <= 9);
        assert!(!best.tokens.contains(&model.eos_token()));
        assert!(best.tokens.iter().all(|t| (*t as usize) < TINY_VOCAB));
        assert!(best.score.is_finite());
    }
}
