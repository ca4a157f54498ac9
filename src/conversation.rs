//! Conversation assembly
//!
//! History is owned by the caller: it arrives with every request and goes
//! back extended by exactly two entries (the new user turn, then the
//! assistant turn). Nothing is stored server-side and nothing is truncated.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::models::ModelResult;

/// Assistant history content recorded when the model produced an image
pub const IMAGE_PLACEHOLDER: &str = "[Image generated]";

/// Message author accepted by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Parse a wire role, `None` for anything outside the known three
    pub fn parse(role: &str) -> Option<Self> {
        match role {
            "system" => Some(Role::System),
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Outbound message sent to the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// History entry as exchanged with the caller
///
/// Held as raw JSON so whatever the caller sent, including entries the
/// gateway cannot use, is echoed back verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryEntry(Value);

impl HistoryEntry {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self(json!({ "role": role.into(), "content": content.into() }))
    }

    /// The `role` field, when it is a string
    pub fn role(&self) -> Option<&str> {
        self.0.get("role").and_then(Value::as_str)
    }

    /// Outbound message for this entry
    ///
    /// `None` for unknown or missing roles and for non-text content. Null or
    /// absent content counts as empty text.
    pub fn to_message(&self) -> Option<Message> {
        let role = Role::parse(self.role()?)?;
        let content = match self.0.get("content") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(text)) => text.clone(),
            Some(_) => return None,
        };
        Some(Message { role, content })
    }
}

impl From<Message> for HistoryEntry {
    fn from(message: Message) -> Self {
        Self::new(message.role.as_str(), message.content)
    }
}

/// Messages to send to the backend: usable history plus the new prompt
pub fn build_request_messages(history: &[HistoryEntry], prompt: &str) -> Vec<Message> {
    history
        .iter()
        .filter_map(HistoryEntry::to_message)
        .chain(std::iter::once(Message::user(prompt)))
        .collect()
}

/// History to return: the caller's history as supplied, the prompt, the reply
pub fn build_updated_history(
    history: &[HistoryEntry],
    prompt: &str,
    result: &ModelResult,
) -> Vec<HistoryEntry> {
    let assistant_content = if !result.text().is_empty() {
        result.text()
    } else if result.is_image() {
        IMAGE_PLACEHOLDER
    } else {
        ""
    };

    let mut updated = Vec::with_capacity(history.len() + 2);
    updated.extend_from_slice(history);
    updated.push(HistoryEntry::new(Role::User.as_str(), prompt));
    updated.push(HistoryEntry::new(Role::Assistant.as_str(), assistant_content));
    updated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_history_hello_hi() {
        let updated = build_updated_history(&[], "hello", &ModelResult::Text("hi".into()));
        assert_eq!(
            updated,
            vec![
                HistoryEntry::new("user", "hello"),
                HistoryEntry::new("assistant", "hi"),
            ]
        );
    }

    #[test]
    fn test_unknown_roles_dropped_outbound_kept_in_echo() {
        let history = vec![
            HistoryEntry::new("system", "be brief"),
            HistoryEntry::new("system-debug", "internal"),
            HistoryEntry::new("user", "earlier"),
            HistoryEntry::new("assistant", "reply"),
        ];

        let outbound = build_request_messages(&history, "next");
        assert_eq!(
            outbound,
            vec![
                Message { role: Role::System, content: "be brief".into() },
                Message { role: Role::User, content: "earlier".into() },
                Message { role: Role::Assistant, content: "reply".into() },
                Message::user("next"),
            ]
        );

        let echoed = build_updated_history(&history, "next", &ModelResult::Text("ok".into()));
        assert_eq!(echoed.len(), history.len() + 2);
        assert_eq!(&echoed[..history.len()], history.as_slice());
        assert_eq!(echoed[1].role(), Some("system-debug"));
    }

    #[test]
    fn test_role_parse_is_exact() {
        assert_eq!(Role::parse("user"), Some(Role::User));
        assert_eq!(Role::parse("User"), None);
        assert_eq!(Role::parse("tool"), None);
    }

    #[test]
    fn test_image_placeholder_in_history() {
        let updated = build_updated_history(
            &[],
            "draw a cat",
            &ModelResult::Image { url: "https://img.example/cat.png".into() },
        );
        assert_eq!(updated[1], HistoryEntry::new("assistant", IMAGE_PLACEHOLDER));
    }

    #[test]
    fn test_empty_text_recorded_as_empty() {
        let updated = build_updated_history(&[], "hello", &ModelResult::Text(String::new()));
        assert_eq!(updated[1], HistoryEntry::new("assistant", ""));
    }

    #[test]
    fn test_message_serializes_lowercase_role() {
        let json = serde_json::to_value(Message::user("hi")).unwrap();
        assert_eq!(json, serde_json::json!({ "role": "user", "content": "hi" }));
    }

    #[test]
    fn test_history_entry_null_content() {
        let entry: HistoryEntry =
            serde_json::from_str(r#"{"role":"assistant","content":null}"#).unwrap();
        assert_eq!(entry.to_message().unwrap().content, "");
        let entry: HistoryEntry = serde_json::from_str(r#"{"role":"assistant"}"#).unwrap();
        assert_eq!(entry.to_message().unwrap().content, "");
    }

    #[test]
    fn test_malformed_entries_dropped_outbound_and_echoed() {
        let history: Vec<HistoryEntry> = serde_json::from_value(serde_json::json!([
            { "content": "no role" },
            "not-an-object",
            { "role": "user", "content": [{ "type": "text", "text": "multipart" }] },
            { "role": 5, "content": "numeric role" },
            { "role": "assistant", "content": "kept", "extra": true }
        ]))
        .unwrap();

        let outbound = build_request_messages(&history, "next");
        assert_eq!(
            outbound,
            vec![
                Message { role: Role::Assistant, content: "kept".into() },
                Message::user("next"),
            ]
        );

        let echoed = build_updated_history(&history, "next", &ModelResult::Text("ok".into()));
        assert_eq!(&echoed[..history.len()], history.as_slice());
        assert_eq!(
            serde_json::to_value(&echoed[1]).unwrap(),
            serde_json::json!("not-an-object")
        );
    }
}
