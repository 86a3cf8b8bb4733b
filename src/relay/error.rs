// src/relay/error.rs
// Error taxonomy for the relay endpoint.
//
// Validation failures go back to the caller verbatim as 400 JSON; anything
// upstream becomes an opaque 500 with the detail kept in the server log.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::gemini::UpstreamError;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Message or image is required")]
    EmptyTurn,
    #[error("Invalid image attachment: {0}")]
    InvalidImage(String),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::EmptyTurn | Self::InvalidImage(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        match &self {
            RelayError::EmptyTurn | RelayError::InvalidImage(_) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": self.to_string() })),
            )
                .into_response(),
            // Opaque body; the handler has already logged the detail.
            RelayError::Upstream(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_400() {
        assert_eq!(RelayError::EmptyTurn.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            RelayError::InvalidImage("bad base64".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_upstream_errors_are_500() {
        let err = RelayError::Upstream(UpstreamError::Status {
            status: reqwest::StatusCode::FORBIDDEN,
            body: "key rejected".into(),
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
