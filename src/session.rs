//! In-memory session state: the loaded transcript and the chat history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who said a chat entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One line of the chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub role: Role,
    pub text: String,
    pub at: DateTime<Utc>,
}

impl ChatEntry {
    fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            at: Utc::now(),
        }
    }
}

/// Whether a transcript is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Empty,
    Ready,
}

/// Transcript plus append-only chat history.
#[derive(Debug, Clone, Default)]
pub struct Session {
    transcript: Option<String>,
    history: Vec<ChatEntry>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        if self.transcript().is_some() {
            SessionState::Ready
        } else {
            SessionState::Empty
        }
    }

    /// The loaded transcript, if it is non-empty.
    pub fn transcript(&self) -> Option<&str> {
        self.transcript.as_deref().filter(|t| !t.is_empty())
    }

    pub fn history(&self) -> &[ChatEntry] {
        &self.history
    }

    /// Replace the transcript. History is kept.
    pub(crate) fn set_transcript(&mut self, transcript: String) {
        self.transcript = Some(transcript);
    }

    /// Append a question and its answer as one pair.
    pub(crate) fn record_exchange(&mut self, question: &str, answer: &str) -> &ChatEntry {
        self.history.push(ChatEntry::new(Role::User, question));
        self.history.push(ChatEntry::new(Role::Assistant, answer));
        &self.history[self.history.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_empty() {
        let session = Session::new();
        assert_eq!(session.state(), SessionState::Empty);
        assert!(session.transcript().is_none());
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_empty_transcript_is_not_ready() {
        let mut session = Session::new();
        session.set_transcript(String::new());
        assert_eq!(session.state(), SessionState::Empty);
    }

    #[test]
    fn test_record_exchange_order() {
        let mut session = Session::new();
        session.set_transcript("t".to_string());
        let last = session.record_exchange("q", "a").clone();

        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.text, "a");
        let roles: Vec<Role> = session.history().iter().map(|e| e.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
        assert_eq!(Role::User.to_string(), "user");
    }
}
