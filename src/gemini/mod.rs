// src/gemini/mod.rs
// Upstream generation capability.
//
// The relay talks to the model through the `Generator` seam so the HTTP
// layer can be exercised against a scripted implementation in tests.

mod client;
pub mod types;

pub use client::{DEFAULT_TEXT_MODEL, DEFAULT_VISION_MODEL, GeminiClient};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::types::{HistoryEntry, ImageAttachment};

/// A capability-selected prompt for one turn.
///
/// The two-state choice (text-only vs vision) is made once, by
/// `relay::capability::select_capability`; adding another modality later
/// means a new variant here, not another nested conditional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelRequest {
    Text {
        message: String,
        history: Vec<HistoryEntry>,
    },
    Vision {
        /// May be empty; the text part is still sent first.
        message: String,
        image: ImageAttachment,
        history: Vec<HistoryEntry>,
    },
}

impl ModelRequest {
    pub fn history(&self) -> &[HistoryEntry] {
        match self {
            Self::Text { history, .. } | Self::Vision { history, .. } => history,
        }
    }

    pub fn is_vision(&self) -> bool {
        matches!(self, Self::Vision { .. })
    }
}

/// One event from the upstream stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    TextDelta(String),
    /// Transport or decode failure after the stream started. Terminal.
    Error(String),
    /// Upstream stream completed normally. Terminal.
    Done,
}

/// Failure before any delta was produced. Surfaces as HTTP 500 at the
/// relay; detail stays in the server log.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("failed to reach the generation API: {0}")]
    Connect(#[from] reqwest::Error),
    #[error("generation API returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Upstream generation capability: submit a prompt, receive an async
/// sequence of text deltas.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Submit one turn and stream the response.
    ///
    /// Returns `Err` only for failures before the stream starts (connect
    /// failure, non-success status); later failures arrive in-band as
    /// `StreamEvent::Error`. The receiver always ends with a terminal
    /// event (`Done` or `Error`) or a closed channel.
    async fn stream_turn(
        &self,
        request: ModelRequest,
    ) -> Result<mpsc::Receiver<StreamEvent>, UpstreamError>;

    /// Provider name for logging.
    fn name(&self) -> &'static str;
}
