use candle_core::{utils, Device};

use crate::error::{PipelineError, PipelineResult};

pub const NEWLINE_PLACEHOLDER: &str = "<n>";

pub fn clean_output(raw: &str) -> String {
    raw.replace(NEWLINE_PLACEHOLDER, "\n").trim().to_string()
}

pub fn validate_input(text: &str) -> PipelineResult<()> {
    if text.trim().is_empty() {
        return Err(PipelineError::InvalidInput("text must not be empty".to_string()));
    }

    Ok(())
}

/// First accelerator that initialises, otherwise the CPU.
pub fn select_device() -> Device {
    if utils::cuda_is_available() {
        match Device::new_cuda(0) {
            Ok(device) => return device,
            Err(e) => log::warn!("CUDA reported available but failed to initialise: {}", e),
        }
    }

    if utils::metal_is_available() {
        match Device::new_metal(0) {
            Ok(device) => return device,
            Err(e) => log::warn!("Metal reported available but failed to initialise: {}", e),
        }
    }

    Device::Cpu
}

pub fn device_label(device: &Device) -> &'static str {
    match device {
        Device::Cpu => "cpu",
        Device::Cuda(_) => "cuda",
        Device::Metal(_) => "metal",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_output_replaces_placeholder() {
        assert_eq!(clean_output("Hello<n>World  "), "Hello\nWorld");
        assert_eq!(
            clean_output("  Amanda baked cookies.<n>Jerry will bring them.<n>"),
            "Amanda baked cookies.\nJerry will bring them."
        );
    }

    #[test]
    fn test_clean_output_is_idempotent() {
        let samples = ["Hello<n>World  ", "\n<n>a<n><n>b ", "", "plain"];
        for sample in samples {
            let once = clean_output(sample);
            assert_eq!(clean_output(&once), once);
            assert!(!once.contains(NEWLINE_PLACEHOLDER));
            assert_eq!(once.trim(), once);
        }
    }

    #[test]
    fn test_validate_input() {
        assert!(validate_input("Some dialogue").is_ok());
        assert!(matches!(
            validate_input("   \n"),
            Err(PipelineError::InvalidInput(_))
        ));
        assert!(validate_input("").is_err());
    }

    #[test]
    fn test_select_device_defaults_to_cpu_without_accelerators() {
        let device = select_device();
        if !utils::cuda_is_available() && !utils::metal_is_available() {
            assert_eq!(device_label(&device), "cpu");
        }
    }
}
