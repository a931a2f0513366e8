//! Spor - Ask questions about a video's transcript
//!
//! A terminal tool that loads the transcript of a YouTube video (or transcribes an
//! uploaded media file) and answers questions about it with a hosted language model.
//!
//! The name "Spor" is Norwegian for "track", as in a recording's audio track.
//!
//! # Architecture
//!
//! - `config` - Configuration and prompt templates
//! - `source` - Transcript sources and the YouTube transcript fetcher
//! - `transcription` - Speech-to-text for uploaded media
//! - `generation` - Prompt composition and text generation clients
//! - `session` - Transcript and chat history
//! - `controller` - Routes load and ask actions and updates the session
//!
//! # Example
//!
//! ```rust,no_run
//! use spor::config::Settings;
//! use spor::controller::SessionController;
//! use spor::source::TranscriptSource;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let mut controller = SessionController::from_settings(&settings)?;
//!
//!     let source = TranscriptSource::from_input("https://www.youtube.com/watch?v=dQw4w9WgXcQ").await?;
//!     controller.load_transcript(source).await?;
//!
//!     let answer = controller.ask("What is this video about?").await?;
//!     println!("{}", answer.text);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod generation;
pub mod openai;
pub mod session;
pub mod source;
pub mod transcription;

pub use error::{Result, SporError};
