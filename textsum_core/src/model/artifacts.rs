use std::{
    collections::{BTreeSet, HashMap},
    fs,
    path::{Path, PathBuf},
};

use hf_hub::api::sync::Api;
use serde::Deserialize;

use crate::error::{PipelineError, PipelineResult};

pub const MODEL_CONFIG_FILE: &str = "config.json";
pub const MODEL_WEIGHTS_FILE: &str = "model.safetensors";
pub const MODEL_WEIGHTS_INDEX_FILE: &str = "model.safetensors.index.json";
pub const TOKENIZER_FILE: &str = "tokenizer.json";

#[derive(Debug, Clone)]
pub struct ModelFiles {
    pub config: PathBuf,
    pub weights: Vec<PathBuf>,
}

/// Resolves a model location to its config and safetensors files.
///
/// Local directories win. Anything that does not exist locally but looks like a
/// hub repository id (`t5-small`, `google-t5/t5-small`) is fetched through the hub cache.
pub fn resolve_model_files(model_path: &str) -> PipelineResult<ModelFiles> {
    let path = Path::new(model_path);

    if path.is_dir() {
        let config = path.join(MODEL_CONFIG_FILE);
        if !config.is_file() {
            return Err(PipelineError::ArtifactLoad(format!(
                "{} not found",
                config.display()
            )));
        }

        let weights = list_safetensors(path)?;
        if weights.is_empty() {
            return Err(PipelineError::ArtifactLoad(format!(
                "no .safetensors weights in {}",
                path.display()
            )));
        }

        return Ok(ModelFiles { config, weights });
    }

    if looks_like_repo_id(model_path) {
        log::info!("Model path {} not found locally, fetching from hub", model_path);
        let config = fetch_from_hub(model_path, MODEL_CONFIG_FILE)?;
        let weights = fetch_weights_from_hub(model_path)?;
        return Ok(ModelFiles { config, weights });
    }

    Err(PipelineError::ArtifactLoad(format!(
        "model path {} does not exist",
        model_path
    )))
}

pub fn resolve_tokenizer_file(tokenizer_path: &str) -> PipelineResult<PathBuf> {
    let path = Path::new(tokenizer_path);

    if path.is_file() {
        return Ok(path.to_path_buf());
    }

    if path.is_dir() {
        let file = path.join(TOKENIZER_FILE);
        if file.is_file() {
            return Ok(file);
        }
        return Err(PipelineError::ArtifactLoad(format!(
            "{} not found",
            file.display()
        )));
    }

    if looks_like_repo_id(tokenizer_path) {
        log::info!(
            "Tokenizer path {} not found locally, fetching from hub",
            tokenizer_path
        );
        return fetch_from_hub(tokenizer_path, TOKENIZER_FILE);
    }

    Err(PipelineError::ArtifactLoad(format!(
        "tokenizer path {} does not exist",
        tokenizer_path
    )))
}

pub fn fetch_from_hub(repo_id: &str, file: &str) -> PipelineResult<PathBuf> {
    let api = Api::new().map_err(|e| PipelineError::ArtifactLoad(e.to_string()))?;
    api.model(repo_id.to_string())
        .get(file)
        .map_err(|e| PipelineError::ArtifactLoad(format!("{}/{}: {}", repo_id, file, e)))
}

/// Single-file checkpoints first, then the shards listed by the safetensors index.
fn fetch_weights_from_hub(repo_id: &str) -> PipelineResult<Vec<PathBuf>> {
    let single_err = match fetch_from_hub(repo_id, MODEL_WEIGHTS_FILE) {
        Ok(file) => return Ok(vec![file]),
        Err(e) => e,
    };

    let index = fetch_from_hub(repo_id, MODEL_WEIGHTS_INDEX_FILE).map_err(|_| single_err)?;
    shard_files(&index)?
        .iter()
        .map(|shard| fetch_from_hub(repo_id, shard))
        .collect()
}

#[derive(Deserialize)]
struct SafetensorsIndex {
    weight_map: HashMap<String, String>,
}

/// Distinct shard file names referenced by a `model.safetensors.index.json`, sorted.
pub fn shard_files(index: &Path) -> PipelineResult<Vec<String>> {
    let raw = fs::read_to_string(index).map_err(|e| {
        PipelineError::ArtifactLoad(format!("cannot read {}: {}", index.display(), e))
    })?;
    let index_file: SafetensorsIndex = serde_json::from_str(&raw).map_err(|e| {
        PipelineError::ArtifactLoad(format!("invalid {}: {}", index.display(), e))
    })?;

    let shards: BTreeSet<String> = index_file.weight_map.into_values().collect();
    if shards.is_empty() {
        return Err(PipelineError::ArtifactLoad(format!(
            "{} lists no weight shards",
            index.display()
        )));
    }

    Ok(shards.into_iter().collect())
}

pub fn looks_like_repo_id(value: &str) -> bool {
    if value.is_empty() || value.starts_with('.') || value.starts_with('/') {
        return false;
    }

    let segments: Vec<&str> = value.split('/').collect();
    segments.len() <= 2
        && segments.iter().all(|s| {
            !s.is_empty()
                && s
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        })
}

fn list_safetensors(dir: &Path) -> PipelineResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| {
        PipelineError::ArtifactLoad(format!("cannot read {}: {}", dir.display(), e))
    })?;

    let mut weights: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("safetensors"))
        .collect();
    weights.sort();

    Ok(weights)
}
