//! Audio extraction via ffmpeg.

use crate::error::{Result, SporError};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Extract 16 kHz mono PCM WAV, the input format whisper.cpp expects.
#[instrument(skip_all, fields(source = %source.display()))]
pub async fn extract_wav_16k_mono(source: &Path, dest: &Path) -> Result<()> {
    debug!("Extracting 16 kHz mono WAV to {}", dest.display());

    let mut cmd = Command::new("ffmpeg");
    cmd.arg("-i").arg(source)
        .arg("-vn")
        .arg("-ac").arg("1")
        .arg("-ar").arg("16000")
        .arg("-c:a").arg("pcm_s16le")
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(dest);

    run_ffmpeg(cmd).await
}

/// Extract compact mono MP3 audio for upload to a hosted recognizer.
#[instrument(skip_all, fields(source = %source.display()))]
pub async fn extract_mp3(source: &Path, dest: &Path) -> Result<()> {
    debug!("Extracting MP3 audio to {}", dest.display());

    let mut cmd = Command::new("ffmpeg");
    cmd.arg("-i").arg(source)
        .arg("-vn")
        .arg("-ac").arg("1")
        .arg("-codec:a").arg("libmp3lame")
        .arg("-qscale:a").arg("4")
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(dest);

    run_ffmpeg(cmd).await
}

async fn run_ffmpeg(mut cmd: Command) -> Result<()> {
    let result = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    match result {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => {
            let err = String::from_utf8_lossy(&out.stderr);
            Err(SporError::TranscriptionFailed(format!(
                "ffmpeg could not decode the media: {}",
                err.trim()
            )))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(SporError::MediaToolchainMissing("ffmpeg".into()))
        }
        Err(e) => Err(SporError::TranscriptionFailed(format!("ffmpeg error: {e}"))),
    }
}

/// Check that ffmpeg is installed and runnable.
pub fn check_ffmpeg() -> Result<String> {
    match std::process::Command::new("ffmpeg").arg("-version").output() {
        Ok(output) if output.status.success() => Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or("installed")
            .trim()
            .to_string()),
        Ok(_) => Err(SporError::TranscriptionFailed(
            "ffmpeg is installed but not working correctly".to_string(),
        )),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(SporError::MediaToolchainMissing("ffmpeg".to_string()))
        }
        Err(e) => Err(SporError::TranscriptionFailed(format!("ffmpeg: {}", e))),
    }
}
