//! UI-agnostic chat log.
//!
//! The transcript is append-only: entries are never edited or removed while
//! the session lives, and every entry remembers which exchange produced it.

use std::fmt;

use crate::artifact::Artifact;

pub const USER_LABEL: &str = "나";
pub const SYSTEM_LABEL: &str = "오류";

/// Client-local sequence number for one round trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExchangeId(pub u64);

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Artifact(Artifact),
    System,
}

impl Sender {
    pub fn label(&self) -> &'static str {
        match self {
            Sender::User => USER_LABEL,
            Sender::Artifact(artifact) => artifact.label(),
            Sender::System => SYSTEM_LABEL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
    pub exchange: ExchangeId,
}

impl fmt::Display for ChatMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.sender.label(), self.text)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sender: Sender, text: impl Into<String>, exchange: ExchangeId) {
        self.entries.push(ChatMessage {
            sender,
            text: text.into(),
            exchange,
        });
    }

    pub fn entries(&self) -> &[ChatMessage] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.entries.last()
    }

    /// Rendered `sender: text` lines in append order
    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.to_string()).collect()
    }

    /// True when the entry at `index` answers an exchange other than the one just above it,
    /// i.e. a reply that arrived after a later message was sent.
    pub fn is_detached_reply(&self, index: usize) -> bool {
        let Some(entry) = self.entries.get(index) else {
            return false;
        };
        if entry.sender == Sender::User || index == 0 {
            return false;
        }
        self.entries[index - 1].exchange != entry.exchange
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_format() {
        let mut transcript = Transcript::new();
        transcript.push(Sender::User, "hi", ExchangeId(1));
        transcript.push(Sender::Artifact(Artifact::B), "안녕", ExchangeId(1));
        assert_eq!(transcript.lines(), vec!["나: hi", "유물 B: 안녕"]);
    }

    #[test]
    fn test_text_is_not_interpreted() {
        let mut transcript = Transcript::new();
        transcript.push(Sender::User, "<b>bold</b> **md**", ExchangeId(1));
        assert_eq!(transcript.lines()[0], "나: <b>bold</b> **md**");
    }

    #[test]
    fn test_detached_reply() {
        let mut transcript = Transcript::new();
        transcript.push(Sender::User, "one", ExchangeId(1));
        transcript.push(Sender::User, "two", ExchangeId(2));
        transcript.push(Sender::Artifact(Artifact::B), "reply one", ExchangeId(1));
        transcript.push(Sender::Artifact(Artifact::B), "reply two", ExchangeId(2));

        assert!(!transcript.is_detached_reply(0));
        assert!(!transcript.is_detached_reply(1));
        assert!(transcript.is_detached_reply(2));
        assert!(transcript.is_detached_reply(3));
        assert!(!transcript.is_detached_reply(9));
    }

    #[test]
    fn test_exchange_id_display() {
        assert_eq!(ExchangeId(7).to_string(), "#7");
    }
}
