//! Whisper model tiers and first-use download.

use crate::error::{Result, SporError};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::info;

/// Base URL for downloading Whisper models from Hugging Face.
const MODEL_BASE_URL: &str = "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";

/// Whisper model size tiers (Q8 quantized unless noted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WhisperModel {
    Tiny,
    #[default]
    Base,
    Small,
    Medium,
    /// Large v3 turbo, Q5 quantized.
    LargeV3Turbo,
}

impl WhisperModel {
    /// Returns the filename for this model.
    pub fn filename(&self) -> &'static str {
        match self {
            Self::Tiny => "ggml-tiny-q8_0.bin",
            Self::Base => "ggml-base-q8_0.bin",
            Self::Small => "ggml-small-q8_0.bin",
            Self::Medium => "ggml-medium-q8_0.bin",
            Self::LargeV3Turbo => "ggml-large-v3-turbo-q5_0.bin",
        }
    }

    /// Returns the download URL for this model.
    pub fn url(&self) -> String {
        format!("{}/{}", MODEL_BASE_URL, self.filename())
    }

    /// Parse a size tier name such as "base" or "large-v3-turbo".
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "tiny" => Some(Self::Tiny),
            "base" => Some(Self::Base),
            "small" => Some(Self::Small),
            "medium" => Some(Self::Medium),
            "large-v3-turbo" | "turbo" => Some(Self::LargeV3Turbo),
            _ => None,
        }
    }

    /// Path of this model inside a models directory.
    pub fn path_in(&self, models_dir: &Path) -> PathBuf {
        models_dir.join(self.filename())
    }
}

/// Checks if a model exists locally.
pub fn model_exists(model: WhisperModel, models_dir: &Path) -> bool {
    model.path_in(models_dir).exists()
}

/// Download a model into the models directory, returning its path.
///
/// Writes to a `.part` file and renames on completion.
pub async fn download_model(model: WhisperModel, models_dir: &Path) -> Result<PathBuf> {
    let path = model.path_in(models_dir);
    tokio::fs::create_dir_all(models_dir).await?;

    let url = model.url();
    info!(model = ?model, url = %url, "Downloading Whisper model");

    let download_error =
        |e: reqwest::Error| SporError::TranscriptionFailed(format!("Model download failed: {}", e));

    let mut response = reqwest::get(&url).await.map_err(download_error)?;
    if !response.status().is_success() {
        return Err(SporError::TranscriptionFailed(format!(
            "Model download failed with HTTP {}",
            response.status()
        )));
    }

    let pb = ProgressBar::new(response.content_length().unwrap_or(0));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {spinner:.green} Model   [{bar:30.cyan/blue}] {bytes}/{total_bytes}")
            .map_err(|e| SporError::Config(e.to_string()))?
            .progress_chars("█▓░"),
    );

    let part_path = path.with_extension("bin.part");
    let mut file = tokio::fs::File::create(&part_path).await?;

    while let Some(chunk) = response.chunk().await.map_err(download_error)? {
        file.write_all(&chunk).await?;
        pb.inc(chunk.len() as u64);
    }
    file.flush().await?;
    drop(file);
    pb.finish_and_clear();

    tokio::fs::rename(&part_path, &path).await?;
    info!(path = %path.display(), "Model downloaded");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(WhisperModel::from_name("base"), Some(WhisperModel::Base));
        assert_eq!(WhisperModel::from_name("Turbo"), Some(WhisperModel::LargeV3Turbo));
        assert_eq!(WhisperModel::from_name("huge"), None);
        assert_eq!(WhisperModel::default(), WhisperModel::Base);
    }

    #[test]
    fn test_paths() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!model_exists(WhisperModel::Base, dir.path()));
        assert!(WhisperModel::Base.url().ends_with("ggml-base-q8_0.bin"));

        std::fs::write(WhisperModel::Base.path_in(dir.path()), b"weights").unwrap();
        assert!(model_exists(WhisperModel::Base, dir.path()));
    }
}
