// src/client/transport.rs
// Drives one chat turn over HTTP: POST the snapshot, then feed the
// response body through the record reader into the session until the
// transport reports end-of-stream. No explicit end-of-message marker is
// relied upon.

use futures::StreamExt;
use reqwest::Client;
use thiserror::Error;
use tracing::warn;

use super::session::{ChatSession, SubmitError};
use crate::sse::SseRecordReader;
use crate::types::{ChatTurn, TextDeltaEvent};

#[derive(Debug, Error)]
enum TurnError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("relay returned {0}")]
    Status(reqwest::StatusCode),
}

/// Submit the session's composer and stream the reply into it.
///
/// An empty composer is a no-op, as in the browser. Any failure (refused
/// request, broken stream) lands in the session as the fixed generic
/// error; nothing structured is surfaced.
pub async fn send_turn(http: &Client, endpoint: &str, session: &mut ChatSession) {
    let turn = match session.begin_send() {
        Ok(turn) => turn,
        Err(SubmitError::EmptyTurn) | Err(SubmitError::TurnInFlight) => return,
    };

    match stream_into_session(http, endpoint, &turn, session).await {
        Ok(()) => session.finish_turn(),
        Err(e) => {
            warn!("chat turn failed: {}", e);
            session.fail_turn();
        }
    }
}

async fn stream_into_session(
    http: &Client,
    endpoint: &str,
    turn: &ChatTurn,
    session: &mut ChatSession,
) -> Result<(), TurnError> {
    let response = http.post(endpoint).json(turn).send().await?;
    if !response.status().is_success() {
        return Err(TurnError::Status(response.status()));
    }

    session.streaming_started();

    let mut reader = SseRecordReader::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let bytes = chunk?;
        reader.push(&bytes);
        while let Some(payload) = reader.next_payload() {
            apply_payload(session, &payload);
        }
    }
    if let Some(payload) = reader.finish() {
        apply_payload(session, &payload);
    }

    Ok(())
}

/// Decode one record payload and apply its delta. A malformed record is
/// logged and dropped without aborting the stream.
fn apply_payload(session: &mut ChatSession, payload: &str) {
    match serde_json::from_str::<TextDeltaEvent>(payload) {
        Ok(event) => session.apply_delta(&event.text),
        Err(e) => warn!("dropping malformed event record: {}", e),
    }
}
