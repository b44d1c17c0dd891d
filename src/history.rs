//! Transcript messages and their persisted form.
use serde::{Deserialize, Serialize};

pub const DEFAULT_HISTORY_KEY: &str = "accessibility-chat-history";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "bot")]
    Bot,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Bot => "bot",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
    /// Bot line produced by a failed exchange. Only affects styling.
    pub error: bool,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            error: false,
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            role: Role::Bot,
            text: text.into(),
            error: false,
        }
    }

    pub fn bot_error(text: impl Into<String>) -> Self {
        Self {
            error: true,
            ..Self::bot(text)
        }
    }
}

/// Stored shape of one transcript line: `{ "type": "user"|"bot", "content": "..." }`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    #[serde(rename = "type")]
    pub kind: Role,
    pub content: String,
}

impl From<&ChatMessage> for HistoryEntry {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            kind: msg.role,
            content: msg.text.clone(),
        }
    }
}

impl From<HistoryEntry> for ChatMessage {
    fn from(entry: HistoryEntry) -> Self {
        Self {
            role: entry.kind,
            text: entry.content,
            error: false,
        }
    }
}

pub fn encode_history(messages: &[ChatMessage]) -> Result<String, serde_json::Error> {
    let entries: Vec<HistoryEntry> = messages.iter().map(HistoryEntry::from).collect();
    serde_json::to_string(&entries)
}

pub fn decode_history(raw: &str) -> Result<Vec<ChatMessage>, serde_json::Error> {
    let entries: Vec<HistoryEntry> = serde_json::from_str(raw)?;
    Ok(entries.into_iter().map(ChatMessage::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persisted_shape_uses_type_and_content() {
        let raw = encode_history(&[ChatMessage::user("hi"), ChatMessage::bot_error("oops")]).unwrap();
        assert_eq!(
            raw,
            r#"[{"type":"user","content":"hi"},{"type":"bot","content":"oops"}]"#
        );
    }

    #[test]
    fn decode_keeps_order_and_drops_error_flag() {
        let raw = r#"[{"type":"bot","content":"Hello"},{"type":"user","content":"a\nb"},{"type":"bot","content":"c"}]"#;
        let messages = decode_history(raw).unwrap();
        assert_eq!(
            messages,
            vec![
                ChatMessage::bot("Hello"),
                ChatMessage::user("a\nb"),
                ChatMessage::bot("c"),
            ]
        );
    }

    #[test]
    fn decode_rejects_unknown_roles_and_garbage() {
        assert!(decode_history(r#"[{"type":"system","content":"x"}]"#).is_err());
        assert!(decode_history("not json").is_err());
        assert!(decode_history(r#"{"type":"user"}"#).is_err());
    }
}
