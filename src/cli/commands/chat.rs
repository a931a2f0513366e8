//! Interactive chat command.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::controller::SessionController;
use crate::error::{Result, SporError};
use crate::source::{TranscriptSource, UploadedMedia};
use console::style;
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing::debug;

/// One line of user input, classified.
#[derive(Debug, PartialEq, Eq)]
enum ChatCommand<'a> {
    Link(&'a str),
    Upload(&'a str),
    ShowTranscript,
    ShowHistory,
    Help,
    Exit,
    Unknown(&'a str),
    Question(&'a str),
}

impl<'a> ChatCommand<'a> {
    fn parse(line: &'a str) -> Self {
        let line = line.trim();
        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            return ChatCommand::Exit;
        }

        let Some(rest) = line.strip_prefix('/') else {
            return ChatCommand::Question(line);
        };
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        match name.to_lowercase().as_str() {
            "link" => ChatCommand::Link(arg),
            "upload" => ChatCommand::Upload(arg),
            "transcript" => ChatCommand::ShowTranscript,
            "history" => ChatCommand::ShowHistory,
            "help" => ChatCommand::Help,
            "exit" | "quit" => ChatCommand::Exit,
            _ => ChatCommand::Unknown(name),
        }
    }
}

/// Run the interactive chat command.
pub async fn run_chat(
    link: Option<String>,
    file: Option<String>,
    settings: Settings,
) -> anyhow::Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'spor doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let mut controller = SessionController::from_settings(&settings)?;

    println!("\n{}", style("Spor Chat").bold().cyan());
    println!(
        "{}\n",
        style("Load a video with /link <url> or /upload <file>, then ask away. /help lists commands, 'exit' quits.").dim()
    );

    if let Some(url) = link {
        load_link(&mut controller, &url).await;
    } else if let Some(path) = file {
        load_upload(&mut controller, &path, &settings).await;
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            println!();
            break;
        }

        if input.trim().is_empty() {
            continue;
        }

        match ChatCommand::parse(&input) {
            ChatCommand::Exit => {
                Output::info("Goodbye!");
                break;
            }
            ChatCommand::Help => print_help(),
            ChatCommand::Link(url) => load_link(&mut controller, url).await,
            ChatCommand::Upload(path) => load_upload(&mut controller, path, &settings).await,
            ChatCommand::ShowTranscript => match controller.transcript() {
                Some(transcript) => {
                    Output::header("Transcript");
                    println!("{}\n", transcript);
                }
                None => Output::info("No transcript loaded yet."),
            },
            ChatCommand::ShowHistory => {
                if controller.history().is_empty() {
                    Output::info("No questions asked yet.");
                }
                for entry in controller.history() {
                    Output::chat_entry(entry);
                }
            }
            ChatCommand::Unknown(name) => {
                Output::warning(&format!("Unknown command '/{}'. Type /help for commands.", name));
            }
            ChatCommand::Question(question) => ask(&mut controller, question).await,
        }
    }

    Ok(())
}

fn print_help() {
    Output::header("Commands");
    Output::kv("/link <url>", "Load a YouTube transcript");
    Output::kv("/upload <path>", "Transcribe an audio or video file");
    Output::kv("/transcript", "Show the loaded transcript");
    Output::kv("/history", "Show the chat so far");
    Output::kv("/help", "Show this list");
    Output::kv("exit", "Leave the session");
    println!();
}

async fn load_link(controller: &mut SessionController, url: &str) {
    if url.trim().is_empty() {
        Output::warning("Please enter a YouTube link");
        return;
    }

    let source = TranscriptSource::YouTubeLink {
        url: url.trim().to_string(),
    };
    load_into(controller, source, "Fetching transcript...").await;
}

async fn load_upload(controller: &mut SessionController, path: &str, settings: &Settings) {
    if path.trim().is_empty() {
        Output::warning("Please provide a video file");
        return;
    }

    let media = match read_upload(path, settings).await {
        Ok(media) => media,
        Err(e) => {
            Output::failure("Failed to load file", &e);
            return;
        }
    };

    load_into(
        controller,
        TranscriptSource::UploadedFile(media),
        "Transcribing media (this can take a while)...",
    )
    .await;
}

/// Read an upload from disk after checking the recognizer's requirements.
async fn read_upload(path: &str, settings: &Settings) -> Result<UploadedMedia> {
    let path = Settings::expand_path(path.trim());
    preflight::check(Operation::Upload, settings)?;
    UploadedMedia::from_path(Path::new(&path)).await
}

/// Load a source with a spinner and report the outcome.
pub(super) async fn load_into(
    controller: &mut SessionController,
    source: TranscriptSource,
    busy: &str,
) -> bool {
    let spinner = Output::spinner(busy);
    let result = controller.load_transcript(source).await;
    spinner.finish_and_clear();

    match result {
        Ok(transcript) => {
            Output::success("Transcript loaded.");
            Output::transcript_preview(transcript);
            true
        }
        Err(e) => {
            Output::failure("Failed to load transcript", &e);
            false
        }
    }
}

async fn ask(controller: &mut SessionController, question: &str) {
    let spinner = Output::spinner("Thinking...");
    let result = controller.ask(question).await;
    spinner.finish_and_clear();

    match result {
        Ok(entry) => {
            println!("\n{} {}\n", style("Spor:").cyan().bold(), entry.text);
        }
        Err(e @ SporError::TranscriptRequired) => {
            Output::warning(&e.to_string());
            for line in e.remediation() {
                Output::info(&line);
            }
        }
        Err(e) => {
            debug!("Ask failed with category {}", e.category());
            Output::failure("Failed to answer", &e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            ChatCommand::parse("/link https://youtube.com/watch?v=abc"),
            ChatCommand::Link("https://youtube.com/watch?v=abc")
        );
        assert_eq!(ChatCommand::parse("/upload  talk.mp4 "), ChatCommand::Upload("talk.mp4"));
        assert_eq!(ChatCommand::parse("/TRANSCRIPT"), ChatCommand::ShowTranscript);
        assert_eq!(ChatCommand::parse("/history"), ChatCommand::ShowHistory);
        assert_eq!(ChatCommand::parse("quit"), ChatCommand::Exit);
        assert_eq!(ChatCommand::parse("/exit"), ChatCommand::Exit);
    }

    #[test]
    fn test_parse_empty_arguments() {
        assert_eq!(ChatCommand::parse("/link"), ChatCommand::Link(""));
        assert_eq!(ChatCommand::parse("/upload   "), ChatCommand::Upload(""));
    }

    #[test]
    fn test_parse_questions_and_unknown() {
        assert_eq!(
            ChatCommand::parse("  what is said at the start?\n"),
            ChatCommand::Question("what is said at the start?")
        );
        assert_eq!(ChatCommand::parse("/summarize"), ChatCommand::Unknown("summarize"));
        // Only an exact word exits.
        assert_eq!(ChatCommand::parse("exit now?"), ChatCommand::Question("exit now?"));
    }
}
