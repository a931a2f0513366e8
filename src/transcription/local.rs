//! Local Whisper recognition using whisper-rs.

use super::audio::extract_wav_16k_mono;
use super::model::{download_model, WhisperModel};
use super::SpeechRecognizer;
use crate::error::{Result, SporError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

/// Local whisper.cpp recognizer.
///
/// The model is loaded on the first call and kept for the rest of the process.
pub struct LocalWhisperRecognizer {
    model: WhisperModel,
    models_dir: PathBuf,
    context: Mutex<Option<Arc<WhisperContext>>>,
}

impl LocalWhisperRecognizer {
    pub fn new(model: WhisperModel, models_dir: PathBuf) -> Self {
        Self {
            model,
            models_dir,
            context: Mutex::new(None),
        }
    }

    /// Get or initialize the whisper context, downloading weights if needed.
    async fn ensure_context(&self) -> Result<Arc<WhisperContext>> {
        let mut guard = self.context.lock().await;
        if let Some(ctx) = guard.as_ref() {
            return Ok(ctx.clone());
        }

        let path = self.model.path_in(&self.models_dir);
        if !path.exists() {
            info!("Whisper model {:?} not found locally, downloading", self.model);
            download_model(self.model, &self.models_dir).await?;
        }

        info!(path = %path.display(), "Loading Whisper model");
        let ctx = tokio::task::spawn_blocking(move || {
            let path_str = path.to_str().ok_or_else(|| {
                SporError::TranscriptionFailed("Invalid model path".to_string())
            })?;
            WhisperContext::new_with_params(path_str, WhisperContextParameters::default())
                .map_err(|e| SporError::TranscriptionFailed(format!("Failed to load model: {}", e)))
        })
        .await
        .map_err(|e| SporError::TranscriptionFailed(format!("Model loading task failed: {}", e)))??;

        let ctx = Arc::new(ctx);
        *guard = Some(ctx.clone());
        Ok(ctx)
    }
}

/// Read 16-bit PCM WAV into f32 samples.
fn read_samples(wav_path: &Path) -> Result<Vec<f32>> {
    let reader = hound::WavReader::open(wav_path)
        .map_err(|e| SporError::TranscriptionFailed(format!("Failed to read WAV: {}", e)))?;

    reader
        .into_samples::<i16>()
        .map(|s| s.map(|v| v as f32 / 32768.0))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| SporError::TranscriptionFailed(format!("Failed to read samples: {}", e)))
}

/// Run whisper over the full sample buffer and join all segments.
fn run_full(ctx: &WhisperContext, samples: &[f32]) -> Result<String> {
    let mut state = ctx.create_state().map_err(|e| {
        SporError::TranscriptionFailed(format!("Failed to create state: {}", e))
    })?;

    let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
    params.set_language(None);
    params.set_print_special(false);
    params.set_print_progress(false);
    params.set_print_realtime(false);
    params.set_print_timestamps(false);

    state
        .full(params, samples)
        .map_err(|e| SporError::TranscriptionFailed(format!("Recognition failed: {}", e)))?;

    let num_segments = state.full_n_segments().map_err(|e| {
        SporError::TranscriptionFailed(format!("Failed to get segments: {}", e))
    })?;

    let mut text = String::new();
    for i in 0..num_segments {
        let segment = state.full_get_segment_text(i).map_err(|e| {
            SporError::TranscriptionFailed(format!("Failed to get segment {}: {}", i, e))
        })?;
        text.push_str(&segment);
    }

    Ok(text.trim().to_string())
}

#[async_trait]
impl SpeechRecognizer for LocalWhisperRecognizer {
    #[instrument(skip(self), fields(media_path = %media_path.display()))]
    async fn recognize(&self, media_path: &Path) -> Result<String> {
        let work_dir = tempfile::Builder::new()
            .prefix("spor-audio-")
            .tempdir_in(media_path.parent().unwrap_or_else(|| Path::new(".")))
            .map_err(|e| SporError::TranscriptionFailed(format!("Failed to create work dir: {}", e)))?;
        let wav_path = work_dir.path().join("audio.wav");

        extract_wav_16k_mono(media_path, &wav_path).await?;

        let ctx = self.ensure_context().await?;

        let text = tokio::task::spawn_blocking(move || {
            let samples = read_samples(&wav_path)?;
            debug!(samples = samples.len(), "Running local Whisper");
            run_full(&ctx, &samples)
        })
        .await
        .map_err(|e| SporError::TranscriptionFailed(format!("Recognition task failed: {}", e)))??;

        drop(work_dir);
        Ok(text)
    }

    fn name(&self) -> &str {
        "local-whisper"
    }
}
