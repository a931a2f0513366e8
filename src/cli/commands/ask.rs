//! Ask command implementation.

use super::chat::load_into;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::controller::SessionController;
use crate::source::TranscriptSource;
use anyhow::Result;

/// Classify a command-line source, checking upload requirements up front.
pub(super) async fn resolve_source(
    input: &str,
    settings: &Settings,
) -> crate::error::Result<TranscriptSource> {
    let expanded = Settings::expand_path(input.trim());
    let source = TranscriptSource::from_input(&expanded.to_string_lossy()).await?;
    if matches!(source, TranscriptSource::UploadedFile(_)) {
        preflight::check(Operation::Upload, settings)?;
    }
    Ok(source)
}

/// Run the ask command.
pub async fn run_ask(source: &str, question: &str, settings: Settings) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'spor doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let source = match resolve_source(source, &settings).await {
        Ok(source) => source,
        Err(e) => {
            Output::failure("Failed to load source", &e);
            return Err(e.into());
        }
    };

    let mut controller = SessionController::from_settings(&settings)?;

    let busy = match &source {
        TranscriptSource::YouTubeLink { .. } => "Fetching transcript...",
        TranscriptSource::UploadedFile(_) => "Transcribing media...",
    };
    if !load_into(&mut controller, source, busy).await {
        anyhow::bail!("no transcript loaded");
    }

    let spinner = Output::spinner("Thinking...");
    let result = controller.ask(question).await;
    spinner.finish_and_clear();

    match result {
        Ok(entry) => {
            println!("\n{}\n", entry.text);
        }
        Err(e) => {
            Output::failure("Failed to answer", &e);
            return Err(e.into());
        }
    }

    Ok(())
}
