// src/relay/stream.rs
// The streaming chat endpoint: validate one turn, select the capability
// variant, and relay upstream text deltas as SSE records.

use std::convert::Infallible;

use axum::Json;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::response::sse::{Event, Sse};
use futures::stream::Stream;
use tracing::{error, warn};

use super::AppState;
use super::capability::select_capability;
use super::error::RelayError;
use crate::gemini::StreamEvent;
use crate::types::{ChatTurn, TextDeltaEvent};

/// `POST /chat`: submit one turn, stream the reply.
///
/// Each upstream delta is serialized and flushed as one
/// `data: {"text":"<chunk>"}\n\n` record. The response carries no trailing
/// done marker; closing the body is the completion signal. A failure after
/// the headers are out can only end the stream early, and the client treats
/// that the same as normal completion.
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(turn): Json<ChatTurn>,
) -> Result<impl IntoResponse, RelayError> {
    let request = select_capability(&turn)?;

    let mut rx = state
        .generator
        .stream_turn(request)
        .await
        .inspect_err(|e| error!("upstream request failed before streaming: {}", e))?;

    let stream: std::pin::Pin<Box<dyn Stream<Item = Result<Event, Infallible>> + Send>> =
        Box::pin(async_stream::stream! {
            while let Some(event) = rx.recv().await {
                match event {
                    StreamEvent::TextDelta(text) => {
                        let record = TextDeltaEvent { text };
                        let data = serde_json::to_string(&record).unwrap_or_default();
                        yield Ok(Event::default().data(data));
                    }
                    StreamEvent::Error(message) => {
                        // Headers are already sent; all we can do is stop.
                        warn!("upstream stream failed mid-response: {}", message);
                        break;
                    }
                    StreamEvent::Done => break,
                }
            }
        });

    Ok((
        [(header::CACHE_CONTROL, "no-cache")],
        Sse::new(stream),
    ))
}
