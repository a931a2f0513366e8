//! Hosted OpenAI Whisper recognizer.

use super::{audio::extract_mp3, SpeechRecognizer};
use crate::error::{Result, SporError};
use async_openai::config::OpenAIConfig;
use async_openai::types::{AudioInput, AudioResponseFormat, CreateTranscriptionRequestArgs};
use async_openai::Client;
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, instrument};

/// Speech recognizer backed by the OpenAI transcription endpoint.
pub struct WhisperApiRecognizer {
    client: Client<OpenAIConfig>,
    model: String,
}

impl WhisperApiRecognizer {
    pub fn new(client: Client<OpenAIConfig>, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl SpeechRecognizer for WhisperApiRecognizer {
    #[instrument(skip(self), fields(media_path = %media_path.display()))]
    async fn recognize(&self, media_path: &Path) -> Result<String> {
        // The decoded audio lives next to the scratch upload and goes with the TempDir.
        let work_dir = tempfile::Builder::new()
            .prefix("spor-audio-")
            .tempdir_in(media_path.parent().unwrap_or_else(|| Path::new(".")))
            .map_err(|e| SporError::TranscriptionFailed(format!("Failed to create work dir: {}", e)))?;
        let audio_path = work_dir.path().join("audio.mp3");

        extract_mp3(media_path, &audio_path).await?;

        let file_bytes = tokio::fs::read(&audio_path).await.map_err(|e| {
            SporError::TranscriptionFailed(format!("Failed to read extracted audio: {}", e))
        })?;
        debug!("Uploading {} bytes of audio", file_bytes.len());

        let request = CreateTranscriptionRequestArgs::default()
            .file(AudioInput::from_vec_u8("audio.mp3".to_string(), file_bytes))
            .model(&self.model)
            .response_format(AudioResponseFormat::Json)
            .build()
            .map_err(|e| SporError::TranscriptionFailed(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .audio()
            .transcribe(request)
            .await
            .map_err(|e| SporError::TranscriptionFailed(format!("Whisper API error: {}", e)))?;

        Ok(response.text)
    }

    fn name(&self) -> &str {
        "openai-whisper"
    }
}
