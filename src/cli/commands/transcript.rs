//! Transcript command: load a transcript and print or save it.

use super::ask::resolve_source;
use crate::cli::Output;
use crate::config::Settings;
use crate::controller::{build_fetcher, build_transcriber};
use crate::source::TranscriptSource;
use anyhow::Result;
use std::path::PathBuf;

/// Run the transcript command.
pub async fn run_transcript(source: &str, output: Option<String>, settings: Settings) -> Result<()> {
    let source = match resolve_source(source, &settings).await {
        Ok(source) => source,
        Err(e) => {
            Output::failure("Failed to load source", &e);
            return Err(e.into());
        }
    };

    // Only the component the source needs is built, so no generation key is required.
    let spinner = Output::spinner("Loading transcript...");
    let result = match &source {
        TranscriptSource::YouTubeLink { url } => match build_fetcher(&settings) {
            Ok(fetcher) => fetcher.fetch(url).await,
            Err(e) => Err(e),
        },
        TranscriptSource::UploadedFile(media) => match build_transcriber(&settings) {
            Ok(transcriber) => transcriber.transcribe(media).await,
            Err(e) => Err(e),
        },
    };
    spinner.finish_and_clear();

    let transcript = match result {
        Ok(transcript) => transcript,
        Err(e) => {
            Output::failure("Failed to load transcript", &e);
            return Err(e.into());
        }
    };

    match output {
        Some(path) => {
            let path = PathBuf::from(shellexpand::tilde(&path).to_string());
            std::fs::write(&path, &transcript)?;
            Output::success(&format!("Transcript saved to {}", path.display()));
        }
        None => println!("{}", transcript),
    }

    Ok(())
}
