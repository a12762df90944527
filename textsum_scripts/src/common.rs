// Artifact files fetched from a hub repository and where each one lands

use std::path::{Path, PathBuf};

use textsum_core::config::dto::ModelEvaluationConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Model,
    Tokenizer,
}

// (file name, destination, required)
// Weights are optional here: sharded checkpoints ship an index instead.
pub const ARTIFACT_FILES: &[ArtifactFile] = &[
    ("config.json", ArtifactKind::Model, true),
    ("model.safetensors", ArtifactKind::Model, false),
    ("generation_config.json", ArtifactKind::Model, false),
    ("tokenizer.json", ArtifactKind::Tokenizer, true),
];

pub type ArtifactFile = (&'static str, ArtifactKind, bool);

pub fn target_path(file: &str, kind: ArtifactKind, config: &ModelEvaluationConfig) -> PathBuf {
    let dir = match kind {
        ArtifactKind::Model => &config.model_path,
        ArtifactKind::Tokenizer => &config.tokenizer_path,
    };

    Path::new(dir).join(file)
}
