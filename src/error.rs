//! Error types for Spor.

use thiserror::Error;

/// Library-level error type for Spor operations.
#[derive(Error, Debug)]
pub enum SporError {
    #[error("Transcript unavailable: {0}")]
    TranscriptUnavailable(String),

    #[error("Media toolchain missing: {0} was not found. Please install it and ensure it's in your PATH.")]
    MediaToolchainMissing(String),

    #[error("Transcription failed: {0}")]
    TranscriptionFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("A transcript is required before asking questions")]
    TranscriptRequired,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl SporError {
    /// Stable category name, kept in user-facing messages.
    pub fn category(&self) -> &'static str {
        match self {
            SporError::TranscriptUnavailable(_) => "transcript unavailable",
            SporError::MediaToolchainMissing(_) => "media toolchain missing",
            SporError::TranscriptionFailed(_) => "transcription failed",
            SporError::ModelNotFound(_) => "model not found",
            SporError::QuotaExceeded(_) => "quota exceeded",
            SporError::GenerationFailed(_) => "generation failed",
            SporError::TranscriptRequired => "transcript required",
            SporError::InvalidInput(_) => "invalid input",
            SporError::Config(_) => "configuration",
            SporError::Io(_) => "io",
            SporError::Json(_) => "json",
            SporError::TomlParse(_) => "toml",
        }
    }

    /// Actionable guidance to show alongside the error, if any.
    pub fn remediation(&self) -> Vec<String> {
        match self {
            SporError::MediaToolchainMissing(tool) => vec![
                format!(
                    "Transcribing uploaded files requires {} to be installed and available in your PATH.",
                    tool
                ),
                install_hint_ffmpeg().to_string(),
            ],
            SporError::ModelNotFound(_) => vec![
                "Check generation.model in your config and your API key's access permissions."
                    .to_string(),
            ],
            SporError::QuotaExceeded(_) => vec![
                "Check your project's quota and billing settings with the generation provider."
                    .to_string(),
            ],
            SporError::TranscriptRequired => vec![
                "Load a transcript first with /link <youtube url> or /upload <file>.".to_string(),
            ],
            _ => Vec::new(),
        }
    }
}

/// Platform-specific install hint for ffmpeg.
pub fn install_hint_ffmpeg() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install ffmpeg"
    } else if cfg!(target_os = "windows") {
        "Install with: choco install ffmpeg (or download from https://ffmpeg.org/download.html)"
    } else if cfg!(target_os = "linux") {
        "Install with: sudo apt install ffmpeg (or your package manager)"
    } else {
        "Install from: https://ffmpeg.org/download.html"
    }
}

/// Result type alias for Spor operations.
pub type Result<T> = std::result::Result<T, SporError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toolchain_missing_has_remediation() {
        let err = SporError::MediaToolchainMissing("ffmpeg".to_string());
        let hints = err.remediation();
        assert_eq!(hints.len(), 2);
        assert!(hints[0].contains("ffmpeg"));
        assert!(err.to_string().contains("ffmpeg"));
    }

    #[test]
    fn test_generic_failure_has_no_remediation() {
        let err = SporError::GenerationFailed("connection reset".to_string());
        assert!(err.remediation().is_empty());
        assert_eq!(err.category(), "generation failed");
    }

    #[test]
    fn test_quota_and_generic_categories_differ() {
        let quota = SporError::QuotaExceeded("429".to_string());
        let generic = SporError::GenerationFailed("429".to_string());
        assert_ne!(quota.category(), generic.category());
    }
}
