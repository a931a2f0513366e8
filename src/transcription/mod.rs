//! Speech-to-text for uploaded media.
//!
//! # Recognizers
//!
//! - **Local** (feature `local-whisper`): whisper.cpp via `whisper-rs`, model
//!   weights downloaded on first use.
//! - **OpenAI**: the hosted Whisper API.
//!
//! Both decode media through ffmpeg first, so a missing ffmpeg surfaces as
//! [`SporError::MediaToolchainMissing`] regardless of backend.

mod api;
mod audio;
#[cfg(feature = "local-whisper")]
mod local;
#[cfg(feature = "local-whisper")]
mod model;

pub use api::WhisperApiRecognizer;
pub use audio::{check_ffmpeg, extract_mp3, extract_wav_16k_mono};
#[cfg(feature = "local-whisper")]
pub use local::LocalWhisperRecognizer;
#[cfg(feature = "local-whisper")]
pub use model::{download_model, model_exists, WhisperModel};

use crate::error::{Result, SporError};
use crate::source::UploadedMedia;
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument, warn};

/// Trait for speech recognition backends.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Recognize all speech in a media file and return the text.
    async fn recognize(&self, media_path: &Path) -> Result<String>;

    /// Backend name for logs.
    fn name(&self) -> &str;
}

/// Stand-in used when no recognizer could be configured.
///
/// Every call fails with the configuration problem, so links keep working
/// while uploads report what is missing.
pub struct UnavailableRecognizer {
    reason: String,
}

impl UnavailableRecognizer {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl SpeechRecognizer for UnavailableRecognizer {
    async fn recognize(&self, _media_path: &Path) -> Result<String> {
        Err(SporError::Config(self.reason.clone()))
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}

/// Transcribes uploaded media through a scratch file.
#[derive(Clone)]
pub struct MediaTranscriber {
    recognizer: Arc<dyn SpeechRecognizer>,
    scratch_dir: PathBuf,
}

impl MediaTranscriber {
    pub fn new(recognizer: Arc<dyn SpeechRecognizer>, scratch_dir: PathBuf) -> Self {
        Self {
            recognizer,
            scratch_dir,
        }
    }

    /// Transcribe an upload. The scratch file is removed on every exit path.
    #[instrument(skip(self, media), fields(bytes = media.content.len(), extension = %media.extension))]
    pub async fn transcribe(&self, media: &UploadedMedia) -> Result<String> {
        let scratch = self.write_scratch(media)?;
        debug!("Wrote scratch file {}", scratch.path().display());

        info!("Recognizing speech with {}", self.recognizer.name());
        let result = self.recognizer.recognize(scratch.path()).await;

        let scratch_path = scratch.path().to_path_buf();
        if let Err(e) = scratch.close() {
            warn!("Failed to remove scratch file {}: {}", scratch_path.display(), e);
        }

        let text = result?.trim().to_string();
        if text.is_empty() {
            return Err(SporError::TranscriptionFailed(
                "no speech recognized".to_string(),
            ));
        }

        Ok(text)
    }

    fn write_scratch(&self, media: &UploadedMedia) -> Result<NamedTempFile> {
        let scratch_error =
            |e: std::io::Error| SporError::TranscriptionFailed(format!("Failed to write scratch file: {}", e));

        std::fs::create_dir_all(&self.scratch_dir).map_err(scratch_error)?;

        let mut file = tempfile::Builder::new()
            .prefix("spor-upload-")
            .suffix(&format!(".{}", media.extension))
            .tempfile_in(&self.scratch_dir)
            .map_err(scratch_error)?;

        file.write_all(&media.content).map_err(scratch_error)?;
        file.flush().map_err(scratch_error)?;

        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records the path it was given and returns a canned outcome.
    struct ScriptedRecognizer {
        outcome: fn() -> Result<String>,
        seen: Mutex<Option<(PathBuf, bool, Vec<u8>)>>,
    }

    impl ScriptedRecognizer {
        fn new(outcome: fn() -> Result<String>) -> Self {
            Self {
                outcome,
                seen: Mutex::new(None),
            }
        }

        fn seen_path(&self) -> PathBuf {
            self.seen.lock().unwrap().as_ref().unwrap().0.clone()
        }
    }

    #[async_trait]
    impl SpeechRecognizer for ScriptedRecognizer {
        async fn recognize(&self, media_path: &Path) -> Result<String> {
            let content = std::fs::read(media_path).unwrap_or_default();
            *self.seen.lock().unwrap() = Some((media_path.to_path_buf(), media_path.exists(), content));
            (self.outcome)()
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn upload() -> UploadedMedia {
        UploadedMedia::new(b"fake mp4 bytes".to_vec(), "mp4").unwrap()
    }

    #[tokio::test]
    async fn test_transcribe_success_removes_scratch() {
        let dir = tempfile::tempdir().unwrap();
        let recognizer = Arc::new(ScriptedRecognizer::new(|| Ok("  hello from the video \n".to_string())));
        let transcriber = MediaTranscriber::new(recognizer.clone(), dir.path().to_path_buf());

        let text = transcriber.transcribe(&upload()).await.unwrap();
        assert_eq!(text, "hello from the video");

        let (path, existed, content) = recognizer.seen.lock().unwrap().clone().unwrap();
        assert!(existed);
        assert_eq!(content, b"fake mp4 bytes");
        assert_eq!(path.extension().unwrap(), "mp4");
        assert!(path.starts_with(dir.path()));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_toolchain_missing_still_removes_scratch() {
        let dir = tempfile::tempdir().unwrap();
        let recognizer = Arc::new(ScriptedRecognizer::new(|| {
            Err(SporError::MediaToolchainMissing("ffmpeg".to_string()))
        }));
        let transcriber = MediaTranscriber::new(recognizer.clone(), dir.path().to_path_buf());

        let err = transcriber.transcribe(&upload()).await.unwrap_err();

        assert!(matches!(err, SporError::MediaToolchainMissing(_)));
        assert!(!err.remediation().is_empty());
        assert!(!recognizer.seen_path().exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_generic_failure_removes_scratch() {
        let dir = tempfile::tempdir().unwrap();
        let recognizer = Arc::new(ScriptedRecognizer::new(|| {
            Err(SporError::TranscriptionFailed("decoder exploded".to_string()))
        }));
        let transcriber = MediaTranscriber::new(recognizer.clone(), dir.path().to_path_buf());

        let err = transcriber.transcribe(&upload()).await.unwrap_err();
        assert!(matches!(err, SporError::TranscriptionFailed(_)));
        assert!(!recognizer.seen_path().exists());
    }

    #[tokio::test]
    async fn test_empty_recognition_is_failure() {
        let dir = tempfile::tempdir().unwrap();
        let recognizer = Arc::new(ScriptedRecognizer::new(|| Ok("   ".to_string())));
        let transcriber = MediaTranscriber::new(recognizer, dir.path().to_path_buf());

        let err = transcriber.transcribe(&upload()).await.unwrap_err();
        assert!(matches!(err, SporError::TranscriptionFailed(_)));
    }

    #[tokio::test]
    async fn test_unavailable_recognizer_reports_reason() {
        let dir = tempfile::tempdir().unwrap();
        let transcriber = MediaTranscriber::new(
            Arc::new(UnavailableRecognizer::new("OPENAI_API_KEY not set")),
            dir.path().to_path_buf(),
        );

        match transcriber.transcribe(&upload()).await {
            Err(SporError::Config(msg)) => assert!(msg.contains("OPENAI_API_KEY")),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_scratch_names_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let recognizer = Arc::new(ScriptedRecognizer::new(|| Ok("text".to_string())));
        let transcriber = MediaTranscriber::new(recognizer.clone(), dir.path().to_path_buf());

        transcriber.transcribe(&upload()).await.unwrap();
        let first = recognizer.seen_path();
        transcriber.transcribe(&upload()).await.unwrap();
        let second = recognizer.seen_path();

        assert_ne!(first, second);
    }
}
