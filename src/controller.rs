//! Session controller: routes user actions to components and updates the session.

use crate::config::{GenerationProvider, Prompts, Settings, TranscriptionProvider};
use crate::error::{Result, SporError};
use crate::generation::{AnswerGenerator, GeminiClient, OpenAIChatClient, TextGenerationClient};
use crate::openai::create_client;
use crate::session::{ChatEntry, Session, SessionState};
use crate::source::{TranscriptFetcher, TranscriptSource, YoutubeTranscriptApi};
use crate::transcription::{
    MediaTranscriber, SpeechRecognizer, UnavailableRecognizer, WhisperApiRecognizer,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Owns the session and drives it through load and ask actions.
pub struct SessionController {
    fetcher: TranscriptFetcher,
    transcriber: MediaTranscriber,
    generator: AnswerGenerator,
    session: Session,
}

impl SessionController {
    /// Wire the production backends from settings.
    ///
    /// A recognizer that cannot be configured does not prevent startup: uploads
    /// then fail with the configuration problem while links keep working.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let transcriber = build_transcriber(settings).unwrap_or_else(|e| {
            warn!("Speech recognition unavailable: {}", e);
            MediaTranscriber::new(
                Arc::new(UnavailableRecognizer::new(e.to_string())),
                settings.temp_dir(),
            )
        });

        Ok(Self::with_components(
            build_fetcher(settings)?,
            transcriber,
            build_generator(settings)?,
        ))
    }

    /// Create a controller with custom components.
    pub fn with_components(
        fetcher: TranscriptFetcher,
        transcriber: MediaTranscriber,
        generator: AnswerGenerator,
    ) -> Self {
        Self {
            fetcher,
            transcriber,
            generator,
            session: Session::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn transcript(&self) -> Option<&str> {
        self.session.transcript()
    }

    pub fn history(&self) -> &[ChatEntry] {
        self.session.history()
    }

    /// Load a transcript from a source, replacing any current one.
    ///
    /// History is kept across loads. On failure the session is unchanged.
    #[instrument(skip(self, source), fields(source = %source.describe()))]
    pub async fn load_transcript(&mut self, source: TranscriptSource) -> Result<&str> {
        let transcript = match &source {
            TranscriptSource::YouTubeLink { url } => self.fetcher.fetch(url).await?,
            TranscriptSource::UploadedFile(media) => self.transcriber.transcribe(media).await?,
        };

        if transcript.trim().is_empty() {
            return Err(SporError::TranscriptUnavailable(
                "the transcript is empty".to_string(),
            ));
        }

        info!("Loaded transcript ({} characters)", transcript.len());
        self.session.set_transcript(transcript);
        Ok(self.session.transcript().unwrap_or_default())
    }

    /// Ask a question about the loaded transcript.
    ///
    /// On success the question and answer are appended together and the
    /// answer entry is returned. On any failure history is untouched.
    #[instrument(skip(self))]
    pub async fn ask(&mut self, question: &str) -> Result<&ChatEntry> {
        if question.trim().is_empty() {
            return Err(SporError::InvalidInput("Please enter a question.".to_string()));
        }

        let Some(transcript) = self.session.transcript() else {
            warn!("Question asked before a transcript was loaded");
            return Err(SporError::TranscriptRequired);
        };

        let answer = self.generator.answer(transcript, question).await?;

        Ok(self.session.record_exchange(question, &answer))
    }
}

/// Build the YouTube transcript fetcher.
pub fn build_fetcher(settings: &Settings) -> Result<TranscriptFetcher> {
    let service = YoutubeTranscriptApi::new(
        settings.youtube.languages.clone(),
        Duration::from_secs(settings.youtube.timeout_secs),
    )?;
    Ok(TranscriptFetcher::new(Arc::new(service)))
}

/// Build the media transcriber for the configured recognizer.
pub fn build_transcriber(settings: &Settings) -> Result<MediaTranscriber> {
    let recognizer: Arc<dyn SpeechRecognizer> = match settings.transcription.provider {
        TranscriptionProvider::Local => local_recognizer(settings)?,
        TranscriptionProvider::OpenAI => {
            let api_key = settings.transcription.resolve_api_key().ok_or_else(|| {
                SporError::Config(format!(
                    "{} not set. Set it with: export {}='sk-...' (needed to transcribe uploads)",
                    settings.transcription.api_key_env, settings.transcription.api_key_env
                ))
            })?;
            let client = create_client(
                &api_key,
                None,
                Duration::from_secs(crate::openai::DEFAULT_TIMEOUT_SECS),
            )?;
            Arc::new(WhisperApiRecognizer::new(client, &settings.transcription.api_model))
        }
    };

    Ok(MediaTranscriber::new(recognizer, settings.temp_dir()))
}

#[cfg(feature = "local-whisper")]
fn local_recognizer(settings: &Settings) -> Result<Arc<dyn SpeechRecognizer>> {
    use crate::transcription::{LocalWhisperRecognizer, WhisperModel};

    let model = WhisperModel::from_name(&settings.transcription.model_size).ok_or_else(|| {
        SporError::Config(format!(
            "Unknown speech model size '{}'",
            settings.transcription.model_size
        ))
    })?;
    Ok(Arc::new(LocalWhisperRecognizer::new(model, settings.models_dir())))
}

#[cfg(not(feature = "local-whisper"))]
fn local_recognizer(_settings: &Settings) -> Result<Arc<dyn SpeechRecognizer>> {
    Err(SporError::Config(
        "Local transcription requires building spor with --features local-whisper. \
         Set transcription.provider = \"openai\" to use the hosted API instead."
            .to_string(),
    ))
}

/// Build the answer generator for the configured provider.
pub fn build_generator(settings: &Settings) -> Result<AnswerGenerator> {
    let gen = &settings.generation;
    let api_key = gen.resolve_api_key().ok_or_else(|| {
        SporError::Config(format!(
            "{} not set. Set it with: export {}='...' or generation.api_key in the config file",
            gen.api_key_env, gen.api_key_env
        ))
    })?;
    let timeout = Duration::from_secs(gen.timeout_secs);

    let client: Arc<dyn TextGenerationClient> = match gen.provider {
        GenerationProvider::Gemini => {
            Arc::new(GeminiClient::new(&api_key, gen.api_base.as_deref(), timeout)?)
        }
        GenerationProvider::OpenAI => Arc::new(OpenAIChatClient::new(create_client(
            &api_key,
            gen.api_base.as_deref(),
            timeout,
        )?)),
    };

    let prompts = Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )?;

    Ok(AnswerGenerator::new(client, &gen.model).with_prompts(prompts))
}
