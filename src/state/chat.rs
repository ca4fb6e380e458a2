//! In-call chat log.
//!
//! Messages are append-only. A transcript may carry the original recognized
//! text next to the corrected one; which of the two is shown is a per-message
//! view flag and never rewrites the message.

use std::collections::HashSet;

use time::{OffsetDateTime, UtcOffset};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: u64,
    pub text: String,
    pub sender_label: String,
    /// Local wall-clock time, `HH:MM`.
    pub timestamp: String,
    pub original_text: Option<String>,
}

#[derive(Debug)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
    next_id: u64,
    showing_original: HashSet<u64>,
    offset: UtcOffset,
}

impl Default for ChatLog {
    fn default() -> Self {
        Self::new(UtcOffset::UTC)
    }
}

impl ChatLog {
    /// `offset` is the display time zone for timestamps.
    #[must_use]
    pub fn new(offset: UtcOffset) -> Self {
        Self { messages: Vec::new(), next_id: 1, showing_original: HashSet::new(), offset }
    }

    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Append a typed message. Blank input is ignored and returns `None`.
    pub fn send(&mut self, sender_label: &str, text: &str) -> Option<&ChatMessage> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(self.push(sender_label, text.to_owned(), None))
    }

    /// Append a speech transcript, keeping the recognizer's raw text when it
    /// differs from the corrected text.
    pub fn append_transcript(&mut self, sender_label: &str, corrected: &str, original: &str) -> Option<&ChatMessage> {
        let corrected = corrected.trim();
        if corrected.is_empty() {
            return None;
        }
        let original = original.trim();
        let original = (!original.is_empty() && original != corrected).then(|| original.to_owned());
        Some(self.push(sender_label, corrected.to_owned(), original))
    }

    fn push(&mut self, sender_label: &str, text: String, original_text: Option<String>) -> &ChatMessage {
        let id = self.next_id;
        self.next_id += 1;
        let now = OffsetDateTime::now_utc().to_offset(self.offset);
        self.messages.push(ChatMessage {
            id,
            text,
            sender_label: sender_label.to_owned(),
            timestamp: format!("{:02}:{:02}", now.hour(), now.minute()),
            original_text,
        });
        tracing::debug!(id, "chat message appended");
        &self.messages[self.messages.len() - 1]
    }

    /// Flip between corrected and original text for one message. Returns
    /// whether the original is now shown; `false` for messages without one.
    pub fn toggle_original(&mut self, id: u64) -> bool {
        let has_original = self
            .messages
            .iter()
            .any(|m| m.id == id && m.original_text.is_some());
        if !has_original {
            return false;
        }
        if self.showing_original.remove(&id) {
            false
        } else {
            self.showing_original.insert(id);
            true
        }
    }

    /// Text to render for `message` under the current view flags.
    #[must_use]
    pub fn display_text<'a>(&self, message: &'a ChatMessage) -> &'a str {
        match &message.original_text {
            Some(original) if self.showing_original.contains(&message.id) => original,
            _ => &message.text,
        }
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.showing_original.clear();
    }
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
