//! Doctor command - verify system requirements and configuration.

use crate::cli::Output;
use crate::config::{Settings, TranscriptionProvider};
use crate::error::{install_hint_ffmpeg, SporError};
use crate::transcription::check_ffmpeg;
use console::style;
use std::path::Path;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: Option<&Path>) -> anyhow::Result<()> {
    Output::header("Spor Doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let mut checks = Vec::new();

    println!("{}", style("External Tools").bold());
    let ffmpeg = check_media_toolchain();
    ffmpeg.print();
    checks.push(ffmpeg);

    println!();

    println!("{}", style("API Configuration").bold());
    let api_checks = check_api_keys(settings);
    for check in &api_checks {
        check.print();
    }
    checks.extend(api_checks);

    println!();

    println!("{}", style("Speech Recognition").bold());
    let model_check = check_speech_model(settings);
    model_check.print();
    checks.push(model_check);

    println!();

    println!("{}", style("Configuration").bold());
    let config_check = match config_path {
        Some(path) => check_config_file(path),
        None => check_config_file(&Settings::default_config_path()),
    };
    config_check.print();
    checks.push(config_check);

    println!();

    // Summary
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Spor.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Spor is ready to use.");
    }

    Ok(())
}

/// ffmpeg is only needed for uploads, so its absence is a warning.
fn check_media_toolchain() -> CheckResult {
    match check_ffmpeg() {
        Ok(version) => {
            let version_display: String = if version.chars().count() > 50 {
                format!("{}...", version.chars().take(50).collect::<String>())
            } else {
                version
            };
            CheckResult::ok("ffmpeg", &version_display)
        }
        Err(SporError::MediaToolchainMissing(_)) => CheckResult::warning(
            "ffmpeg",
            "not found (needed to transcribe uploaded files)",
            install_hint_ffmpeg(),
        ),
        Err(e) => CheckResult::error("ffmpeg", &e.to_string(), install_hint_ffmpeg()),
    }
}

/// Check the generation key, and the transcription key for the hosted recognizer.
fn check_api_keys(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let gen = &settings.generation;
    results.push(match gen.resolve_api_key() {
        Some(key) => CheckResult::ok(
            &gen.api_key_env,
            &format!("configured for {} ({})", gen.provider, mask_key(&key)),
        ),
        None => CheckResult::error(
            &gen.api_key_env,
            "not set",
            &format!(
                "Set with: export {}='...' (or generation.api_key in the config file)",
                gen.api_key_env
            ),
        ),
    });

    let tx = &settings.transcription;
    if tx.provider == TranscriptionProvider::OpenAI {
        results.push(match tx.resolve_api_key() {
            Some(key) => CheckResult::ok(&tx.api_key_env, &format!("configured ({})", mask_key(&key))),
            None => CheckResult::warning(
                &tx.api_key_env,
                "not set (uploads cannot be transcribed)",
                &format!("Set with: export {}='sk-...'", tx.api_key_env),
            ),
        });
    }

    results
}

#[cfg(feature = "local-whisper")]
fn check_speech_model(settings: &Settings) -> CheckResult {
    use crate::transcription::{model_exists, WhisperModel};

    let tx = &settings.transcription;
    if tx.provider != TranscriptionProvider::Local {
        return CheckResult::ok("Recognizer", &format!("{} ({})", tx.provider, tx.api_model));
    }

    let Some(model) = WhisperModel::from_name(&tx.model_size) else {
        return CheckResult::error(
            "Speech model",
            &format!("unknown size '{}'", tx.model_size),
            "Use one of: tiny, base, small, medium, large-v3-turbo",
        );
    };

    let dir = settings.models_dir();
    if model_exists(model, &dir) {
        CheckResult::ok("Speech model", &format!("{}", model.path_in(&dir).display()))
    } else {
        CheckResult::warning(
            "Speech model",
            &format!("{} not downloaded yet", model.filename()),
            "It will be downloaded on the first upload",
        )
    }
}

#[cfg(not(feature = "local-whisper"))]
fn check_speech_model(settings: &Settings) -> CheckResult {
    let tx = &settings.transcription;
    match tx.provider {
        TranscriptionProvider::OpenAI => {
            CheckResult::ok("Recognizer", &format!("{} ({})", tx.provider, tx.api_model))
        }
        TranscriptionProvider::Local => CheckResult::error(
            "Recognizer",
            "local recognition is not compiled in",
            "Rebuild with --features local-whisper, or set transcription.provider = \"openai\"",
        ),
    }
}

/// Check that the config file in use exists and parses.
fn check_config_file(config_path: &Path) -> CheckResult {
    if !config_path.exists() {
        return CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: spor config edit",
        );
    }

    match Settings::load_from(Some(&config_path.to_path_buf())) {
        Ok(_) => CheckResult::ok("Config file", &format!("{}", config_path.display())),
        Err(e) => CheckResult::error(
            "Config file",
            &format!("{} does not parse", config_path.display()),
            &e.to_string(),
        ),
    }
}

/// Show only the ends of a key.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 12 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_ok() {
        let result = CheckResult::ok("test", "passed");
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.hint.is_none());
    }

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("short"), "****");
        assert_eq!(mask_key("AIzaSyABCDEFGHIJ1234"), "AIza...1234");
    }

    #[test]
    fn test_config_check_uses_given_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");

        assert_eq!(check_config_file(&path).status, CheckStatus::Warning);

        std::fs::write(&path, "[generation]\nmodel = \"gemini-1.5-pro\"\n").unwrap();
        let result = check_config_file(&path);
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.message.contains("custom.toml"));

        std::fs::write(&path, "[generation\n").unwrap();
        assert_eq!(check_config_file(&path).status, CheckStatus::Error);
    }

    #[test]
    fn test_missing_generation_key_is_error() {
        let mut settings = Settings::default();
        settings.generation.api_key_env = "SPOR_TEST_DOCTOR_UNSET".to_string();
        let results = check_api_keys(&settings);
        assert_eq!(results[0].status, CheckStatus::Error);
    }
}
