//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::config::{Settings, TranscriptionProvider};
use crate::error::{Result, SporError};
use crate::transcription::check_ffmpeg;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Asking questions requires a generation API key.
    Ask,
    /// Transcribing an upload requires ffmpeg, plus a key for the hosted recognizer.
    Upload,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Ask => {
            check_generation_key(settings)?;
        }
        Operation::Upload => {
            check_ffmpeg()?;
            if settings.transcription.provider == TranscriptionProvider::OpenAI {
                check_transcription_key(settings)?;
            }
        }
    }
    Ok(())
}

/// Check that the generation API key is configured.
fn check_generation_key(settings: &Settings) -> Result<()> {
    let env = &settings.generation.api_key_env;
    match settings.generation.resolve_api_key() {
        Some(_) => Ok(()),
        None => Err(SporError::Config(format!(
            "{} not set. Set it with: export {}='...' (or generation.api_key in the config file)",
            env, env
        ))),
    }
}

/// Check that the hosted transcription key is configured.
fn check_transcription_key(settings: &Settings) -> Result<()> {
    let env = &settings.transcription.api_key_env;
    match settings.transcription.resolve_api_key() {
        Some(_) => Ok(()),
        None => Err(SporError::Config(format!(
            "{} not set. Set it with: export {}='sk-...'",
            env, env
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_ask_requires_key() {
        let mut settings = Settings::default();
        settings.generation.api_key_env = "SPOR_TEST_PREFLIGHT_UNSET".to_string();
        assert!(matches!(check(Operation::Ask, &settings), Err(SporError::Config(_))));

        settings.generation.api_key = Some("k".to_string());
        assert!(check(Operation::Ask, &settings).is_ok());
    }
}
