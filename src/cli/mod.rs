//! CLI module for Spor.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Spor - Ask questions about a video's transcript
///
/// Load a YouTube transcript or transcribe a media file, then chat about it.
#[derive(Parser, Debug)]
#[command(name = "spor")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "SPOR_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive session about one video
    Chat {
        /// YouTube link to load before the first prompt
        #[arg(short, long, conflicts_with = "file")]
        link: Option<String>,

        /// Audio/video file to transcribe before the first prompt
        #[arg(short, long)]
        file: Option<String>,
    },

    /// Load a transcript and ask a single question about it
    Ask {
        /// YouTube link or local audio/video file path
        source: String,

        /// The question to ask
        question: String,
    },

    /// Print or save a transcript without asking anything
    Transcript {
        /// YouTube link or local audio/video file path
        source: String,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
