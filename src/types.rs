// src/types.rs
// Wire data model shared by the relay endpoint and the chat client.
// Field names on the wire match the browser protocol exactly
// (camelCase `mimeType`, lowercase roles).

use serde::{Deserialize, Serialize};

/// One chat turn as submitted to `POST /chat`.
///
/// At least one of `message` (non-empty after trimming) or `image` must be
/// present; the relay rejects the turn with 400 otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Prior turns, oldest first. Optional; a turn is answerable without it.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<HistoryEntry>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageAttachment>,
}

/// Inline image attachment: raw base64 payload (no data-URI header) plus
/// its MIME type. Held in memory for one turn, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAttachment {
    pub data: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

/// A prior turn in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub parts: Vec<TextPart>,
}

impl HistoryEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![TextPart { text: text.into() }],
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            parts: vec![TextPart { text: text.into() }],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextPart {
    pub text: String,
}

/// One streamed delta record: `data: {"text":"<chunk>"}`.
///
/// Carries no sequence number; ordering is the transmission order over the
/// single response body, and records are not replayable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextDeltaEvent {
    pub text: String,
}
