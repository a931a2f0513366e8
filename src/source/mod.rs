//! Transcript sources for Spor.
//!
//! A transcript comes either from a YouTube caption track or from speech
//! recognition over an uploaded media file.

mod youtube;

pub use youtube::{
    extract_video_id, parse_caption_xml, TranscriptFetcher, TranscriptService,
    YoutubeTranscriptApi,
};

use crate::error::{Result, SporError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Supported audio file extensions.
const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "wav", "flac", "aac", "ogg", "opus", "m4a", "wma", "aiff",
];

/// Supported video file extensions (audio will be extracted).
const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "avi", "mov", "webm", "flv", "wmv", "m4v", "mpeg", "mpg", "3gp",
];

/// One timed piece of a caption track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Caption text, as returned by the service.
    pub text: String,
    /// Start time in seconds.
    pub start: f64,
    /// Duration in seconds.
    pub duration: f64,
}

impl TranscriptSegment {
    pub fn new(text: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            text: text.into(),
            start,
            duration,
        }
    }
}

/// An uploaded media file held in memory.
#[derive(Clone)]
pub struct UploadedMedia {
    /// Raw file content.
    pub content: Vec<u8>,
    /// Declared extension, lowercase and without the leading dot.
    pub extension: String,
}

impl UploadedMedia {
    /// Create an upload, validating the declared extension.
    pub fn new(content: Vec<u8>, extension: &str) -> Result<Self> {
        let extension = extension.trim_start_matches('.').to_lowercase();
        if !is_media_extension(&extension) {
            return Err(SporError::InvalidInput(format!(
                "Unsupported media type '.{}'. Supported: {}",
                extension,
                supported_extensions().join(", ")
            )));
        }
        if content.is_empty() {
            return Err(SporError::InvalidInput("Uploaded file is empty".to_string()));
        }
        Ok(Self { content, extension })
    }

    /// Read an upload from disk, taking the extension from the file name.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_string();

        if !path.exists() {
            return Err(SporError::InvalidInput(format!(
                "File not found: {}",
                path.display()
            )));
        }

        let content = tokio::fs::read(path).await?;
        Self::new(content, &extension)
    }
}

impl std::fmt::Debug for UploadedMedia {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedMedia")
            .field("bytes", &self.content.len())
            .field("extension", &self.extension)
            .finish()
    }
}

/// Where a transcript should come from.
#[derive(Debug, Clone)]
pub enum TranscriptSource {
    /// A YouTube watch link.
    YouTubeLink { url: String },
    /// An uploaded media file.
    UploadedFile(UploadedMedia),
}

impl TranscriptSource {
    /// Classify a command-line argument as a link or a file path.
    pub async fn from_input(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(SporError::InvalidInput(
                "Please enter a YouTube link or a file path.".to_string(),
            ));
        }

        if looks_like_link(input) {
            return Ok(TranscriptSource::YouTubeLink {
                url: input.to_string(),
            });
        }

        let media = UploadedMedia::from_path(Path::new(input)).await?;
        Ok(TranscriptSource::UploadedFile(media))
    }

    /// Short label for logs and messages.
    pub fn describe(&self) -> String {
        match self {
            TranscriptSource::YouTubeLink { url } => url.clone(),
            TranscriptSource::UploadedFile(media) => {
                format!(".{} upload ({} bytes)", media.extension, media.content.len())
            }
        }
    }
}

/// Whether the input should be treated as a link rather than a path.
fn looks_like_link(input: &str) -> bool {
    let lower = input.to_lowercase();
    lower.starts_with("http://")
        || lower.starts_with("https://")
        || lower.starts_with("www.")
        || lower.contains("youtube.com")
        || lower.contains("youtu.be")
        || (lower.contains("v=") && !Path::new(input).exists())
}

/// Check if an extension is a supported media type.
pub fn is_media_extension(extension: &str) -> bool {
    let ext = extension.to_lowercase();
    AUDIO_EXTENSIONS.contains(&ext.as_str()) || VIDEO_EXTENSIONS.contains(&ext.as_str())
}

/// All supported media extensions.
pub fn supported_extensions() -> Vec<&'static str> {
    VIDEO_EXTENSIONS
        .iter()
        .chain(AUDIO_EXTENSIONS.iter())
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_is_media_extension() {
        assert!(is_media_extension("mp4"));
        assert!(is_media_extension("MOV"));
        assert!(is_media_extension("avi"));
        assert!(is_media_extension("mp3"));
        assert!(!is_media_extension("pdf"));
        assert!(!is_media_extension(""));
    }

    #[test]
    fn test_uploaded_media_validation() {
        let media = assert_ok!(UploadedMedia::new(vec![1, 2, 3], ".MP4"));
        assert_eq!(media.extension, "mp4");

        assert_err!(UploadedMedia::new(vec![1, 2, 3], "txt"));
        assert_err!(UploadedMedia::new(Vec::new(), "mp4"));
    }

    #[test]
    fn test_looks_like_link() {
        assert!(looks_like_link("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(looks_like_link("youtube.com/watch?v=ABC123"));
        assert!(looks_like_link("https://example.com/video"));
        assert!(!looks_like_link("/path/to/video.mp4"));
        assert!(!looks_like_link("talk.mov"));
    }

    #[tokio::test]
    async fn test_from_input_link() {
        let source = TranscriptSource::from_input("youtube.com/watch?v=ABC123")
            .await
            .unwrap();
        assert!(matches!(source, TranscriptSource::YouTubeLink { url } if url == "youtube.com/watch?v=ABC123"));
    }

    #[tokio::test]
    async fn test_from_input_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mov");
        std::fs::write(&path, b"not really a movie").unwrap();

        let source = TranscriptSource::from_input(path.to_str().unwrap())
            .await
            .unwrap();
        match source {
            TranscriptSource::UploadedFile(media) => {
                assert_eq!(media.extension, "mov");
                assert_eq!(media.content, b"not really a movie");
            }
            other => panic!("expected upload, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_from_input_rejects_missing_and_empty() {
        assert_err!(TranscriptSource::from_input("   ").await);
        assert_err!(TranscriptSource::from_input("/definitely/not/here.mp4").await);
    }
}
