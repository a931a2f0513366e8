//! CLI output formatting utilities.

use crate::error::SporError;
use crate::session::{ChatEntry, Role};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a failed action with its error and any remediation lines.
    pub fn failure(action: &str, err: &SporError) {
        Self::error(&format!("{}: {}", action, err));
        for line in err.remediation() {
            eprintln!("   {} {}", style("→").dim(), style(line).dim());
        }
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print the collapsed one-line view of a transcript.
    pub fn transcript_preview(transcript: &str) {
        println!(
            "  {} {} {}",
            style("▸").cyan(),
            content_preview(transcript, 120),
            style(format!("({} chars, /transcript to expand)", transcript.chars().count())).dim()
        );
    }

    /// Print a chat entry.
    pub fn chat_entry(entry: &ChatEntry) {
        let who = match entry.role {
            Role::User => style("You:").green().bold(),
            Role::Assistant => style("Spor:").cyan().bold(),
        };
        println!(
            "{} {} {}",
            style(entry.at.format("%H:%M:%S").to_string()).dim(),
            who,
            entry.text
        );
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Collapse whitespace and truncate content with ellipsis.
fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if content.chars().count() <= max_chars {
        content
    } else {
        let cut: String = content.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}
