use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

/// One turn of a tutor conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    #[must_use]
    pub fn user(text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
            timestamp,
        }
    }

    #[must_use]
    pub fn model(text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.into(),
            timestamp,
        }
    }

    #[must_use]
    pub fn is_from_user(&self) -> bool {
        self.role == ChatRole::User
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn chat_message_serializes_with_lowercase_role() {
        let message = ChatMessage::model("أهلاً", fixed_now());
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["role"], "model");
        assert_eq!(json["timestamp"], "2023-11-14T22:13:20Z");

        let back: ChatMessage = serde_json::from_value(json).unwrap();
        assert_eq!(back, message);
        assert!(!back.is_from_user());
    }
}
