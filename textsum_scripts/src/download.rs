use std::fs;

use anyhow::{anyhow, Result};
use hf_hub::api::tokio::{Api, ApiRepo};
use textsum_core::{
    config::dto::ModelEvaluationConfig,
    model::artifacts::{shard_files, MODEL_WEIGHTS_FILE, MODEL_WEIGHTS_INDEX_FILE},
};

use crate::common::{target_path, ArtifactFile, ArtifactKind};

pub async fn download_artifacts(
    repo_id: &str,
    files: &[ArtifactFile],
    config: &ModelEvaluationConfig,
) -> Result<()> {
    println!("🚀 Downloading summarization artifacts from {}...", repo_id);

    let api = Api::new().map_err(|e| anyhow!("Failed to create hub client: {}", e))?;
    let repo = api.model(repo_id.to_string());

    fs::create_dir_all(&config.model_path)?;
    fs::create_dir_all(&config.tokenizer_path)?;

    println!("📁 Model directory: {}", config.model_path);
    println!("📁 Tokenizer directory: {}", config.tokenizer_path);

    let mut copied = 0;
    let mut has_weights = false;
    for (name, kind, required) in files {
        match repo.get(name).await {
            Ok(cached) => {
                let target = target_path(name, *kind, config);
                fs::copy(&cached, &target)?;
                copied += 1;
                has_weights |= *name == MODEL_WEIGHTS_FILE;
                println!("   ✅ {} -> {}", name, target.display());
            }
            Err(e) if !required => {
                println!("   ⏭️  {} not available, skipping ({})", name, e);
            }
            Err(e) => {
                return Err(anyhow!("Failed to download {}: {}", name, e));
            }
        }
    }

    if !has_weights {
        copied += download_shards(&repo, config).await?;
    }

    println!("🎉 {} artifact files ready", copied);
    Ok(())
}

async fn download_shards(repo: &ApiRepo, config: &ModelEvaluationConfig) -> Result<usize> {
    println!("📦 No single weights file, looking for {}...", MODEL_WEIGHTS_INDEX_FILE);

    let index = repo
        .get(MODEL_WEIGHTS_INDEX_FILE)
        .await
        .map_err(|e| {
            anyhow!(
                "Repository has neither {} nor {}: {}",
                MODEL_WEIGHTS_FILE,
                MODEL_WEIGHTS_INDEX_FILE,
                e
            )
        })?;

    let mut copied = 0;
    let mut names = vec![MODEL_WEIGHTS_INDEX_FILE.to_string()];
    names.extend(shard_files(&index)?);

    for name in names {
        let cached = repo
            .get(&name)
            .await
            .map_err(|e| anyhow!("Failed to download {}: {}", name, e))?;
        let target = target_path(&name, ArtifactKind::Model, config);
        fs::copy(&cached, &target)?;
        copied += 1;
        println!("   ✅ {} -> {}", name, target.display());
    }

    Ok(copied)
}
