use std::fs;

use anyhow::{Context, Result};
use textsum_core::{config::handler::ConfigurationManager, pipeline::handler::PredictionPipeline};

pub fn read_input(path: &str) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Cannot read input file {}", path))
}

pub fn summarize_text(manager: &ConfigurationManager, text: &str) -> Result<String> {
    let pipeline = PredictionPipeline::from_configuration(manager)?;
    let summary = pipeline.predict(text)?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_input() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "Amanda: I baked cookies. Do you want some?").unwrap();

        let text = read_input(file.path().to_str().unwrap()).unwrap();
        assert!(text.starts_with("Amanda"));
        assert!(read_input("missing/dialogue.txt").is_err());
    }

    #[test]
    fn test_summarize_without_model_paths() {
        let manager = ConfigurationManager::from_config(Default::default());
        let err = summarize_text(&manager, "hello").unwrap_err();
        assert!(err.to_string().contains("model_path"));
    }
}
