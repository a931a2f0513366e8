//! Configuration module for Spor.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AnswerPrompts, Prompts};
pub use settings::{
    GeneralSettings, GenerationProvider, GenerationSettings, PromptSettings, Settings,
    TranscriptionProvider, TranscriptionSettings, YoutubeSettings,
};
