// src/relay/capability.rs
// Capability selection: one function turns a validated chat turn into the
// explicit text-or-vision request variant. No fallback between variants.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use super::error::RelayError;
use crate::gemini::ModelRequest;
use crate::types::ChatTurn;

/// Validate one turn and select the capability variant.
///
/// A turn with an image selects the vision variant (message may be empty);
/// a turn without one must carry a non-empty message after trimming. An
/// image with empty or undecodable base64 data, or an empty MIME type, is
/// rejected before any upstream call.
pub fn select_capability(turn: &ChatTurn) -> Result<ModelRequest, RelayError> {
    let message = turn.message.as_deref().unwrap_or("").trim().to_string();

    match &turn.image {
        Some(image) => {
            if image.data.trim().is_empty() {
                return Err(RelayError::InvalidImage("empty image data".into()));
            }
            if BASE64.decode(image.data.trim()).is_err() {
                return Err(RelayError::InvalidImage("data is not valid base64".into()));
            }
            if image.mime_type.trim().is_empty() {
                return Err(RelayError::InvalidImage("missing MIME type".into()));
            }
            Ok(ModelRequest::Vision {
                message,
                image: image.clone(),
                history: turn.history.clone(),
            })
        }
        None if message.is_empty() => Err(RelayError::EmptyTurn),
        None => Ok(ModelRequest::Text {
            message,
            history: turn.history.clone(),
        }),
    }
}
