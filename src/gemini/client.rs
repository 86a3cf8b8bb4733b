// src/gemini/client.rs
// Google Gemini streaming client.
//
// Speaks `streamGenerateContent?alt=sse` and forwards each candidate text
// part as a `StreamEvent::TextDelta`. The request is sent and its status
// checked before a receiver is handed back, so pre-stream failures can
// still become a plain HTTP error at the relay.

use futures::StreamExt;
use reqwest::Client as HttpClient;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::types::{GeminiContent, GeminiInlineData, GeminiPart, GeminiRequest, GeminiStreamResponse};
use super::{Generator, ModelRequest, StreamEvent, UpstreamError};
use crate::sse::SseRecordReader;
use crate::types::Role;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Text-only model variant.
pub const DEFAULT_TEXT_MODEL: &str = "gemini-pro";
/// Vision-capable model variant, selected when a turn carries an image.
pub const DEFAULT_VISION_MODEL: &str = "gemini-pro-vision";

/// Gemini API client implementing the `Generator` capability.
pub struct GeminiClient {
    http: HttpClient,
    api_key: String,
    base_url: String,
    text_model: String,
    vision_model: String,
}

impl GeminiClient {
    /// Create a client with the default model variants.
    pub fn new(api_key: String) -> Self {
        Self::with_models(
            api_key,
            DEFAULT_TEXT_MODEL.to_string(),
            DEFAULT_VISION_MODEL.to_string(),
        )
    }

    /// Create a client with custom model identifiers.
    pub fn with_models(api_key: String, text_model: String, vision_model: String) -> Self {
        Self {
            http: HttpClient::new(),
            api_key,
            base_url: GEMINI_API_BASE.to_string(),
            text_model,
            vision_model,
        }
    }

    /// Point the client at a different API base (used by tests to target a
    /// local stand-in server).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Model identifier for a capability-selected request.
    fn model_for(&self, request: &ModelRequest) -> &str {
        if request.is_vision() {
            &self.vision_model
        } else {
            &self.text_model
        }
    }

    /// Translate a capability request into Gemini `contents`: prior turns
    /// first, then the current user turn. Vision turns carry the text part
    /// first and the inline image second.
    fn build_contents(request: &ModelRequest) -> Vec<GeminiContent> {
        let mut contents: Vec<GeminiContent> = request
            .history()
            .iter()
            .map(|entry| GeminiContent {
                role: match entry.role {
                    Role::User => "user".to_string(),
                    Role::Model => "model".to_string(),
                },
                parts: entry
                    .parts
                    .iter()
                    .map(|part| GeminiPart::Text {
                        text: part.text.clone(),
                    })
                    .collect(),
            })
            .collect();

        let parts = match request {
            ModelRequest::Text { message, .. } => vec![GeminiPart::Text {
                text: message.clone(),
            }],
            ModelRequest::Vision { message, image, .. } => vec![
                GeminiPart::Text {
                    text: message.clone(),
                },
                GeminiPart::InlineData {
                    inline_data: GeminiInlineData {
                        mime_type: image.mime_type.clone(),
                        data: image.data.clone(),
                    },
                },
            ],
        };

        contents.push(GeminiContent {
            role: "user".to_string(),
            parts,
        });
        contents
    }
}

#[async_trait::async_trait]
impl Generator for GeminiClient {
    async fn stream_turn(
        &self,
        request: ModelRequest,
    ) -> Result<mpsc::Receiver<StreamEvent>, UpstreamError> {
        let request_id = Uuid::new_v4();
        let model = self.model_for(&request).to_string();
        let body = GeminiRequest {
            contents: Self::build_contents(&request),
        };

        info!(
            %request_id,
            model = %model,
            vision = request.is_vision(),
            history_len = request.history().len(),
            "dispatching generation request"
        );

        let url = format!(
            "{}/{}:streamGenerateContent?alt=sse&key={}",
            self.base_url, model, self.api_key
        );

        let response = self.http.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status { status, body });
        }

        let (tx, rx) = mpsc::channel(100);

        tokio::spawn(async move {
            let mut stream = response.bytes_stream();
            let mut reader = SseRecordReader::new();

            while let Some(chunk) = stream.next().await {
                match chunk {
                    Ok(bytes) => {
                        reader.push(&bytes);
                        while let Some(payload) = reader.next_payload() {
                            if forward_payload(&tx, &request_id, &payload).await.is_err() {
                                // Receiver dropped; the turn was abandoned.
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        warn!(%request_id, "generation stream failed mid-flight: {}", e);
                        let _ = tx.send(StreamEvent::Error(e.to_string())).await;
                        return;
                    }
                }
            }

            if let Some(payload) = reader.finish() {
                if forward_payload(&tx, &request_id, &payload).await.is_err() {
                    return;
                }
            }

            debug!(%request_id, "generation stream complete");
            let _ = tx.send(StreamEvent::Done).await;
        });

        Ok(rx)
    }

    fn name(&self) -> &'static str {
        "Gemini"
    }
}

/// Parse one upstream record and forward any text it carries.
///
/// Malformed records are logged and dropped; the error return only signals
/// a closed channel.
async fn forward_payload(
    tx: &mpsc::Sender<StreamEvent>,
    request_id: &Uuid,
    payload: &str,
) -> Result<(), ()> {
    match serde_json::from_str::<GeminiStreamResponse>(payload) {
        Ok(chunk) => {
            if let Some(error) = chunk.error {
                warn!(%request_id, "generation API reported an error mid-stream: {}", error.message);
                let _ = tx.send(StreamEvent::Error(error.message)).await;
                return Err(());
            }
            if let Some(text) = chunk.text() {
                tx.send(StreamEvent::TextDelta(text)).await.map_err(|_| ())?;
            }
            Ok(())
        }
        Err(e) => {
            warn!(%request_id, "dropping unparseable generation record: {}", e);
            Ok(())
        }
    }
}
