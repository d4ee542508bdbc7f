//! Crate-wide error type.
//!
//! Browser APIs hand back `JsValue` errors; everything above the thin
//! web-sys layer works with [`ClientError`] and only converts back to
//! `JsValue` at the wasm-bindgen boundary.

use thiserror::Error;
use wasm_bindgen::JsValue;

use crate::canvas::graph::GraphError;
use crate::constants::error_messages;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(String),

    #[error("API request failed: {status} {status_text}")]
    Http { status: u16, status_text: String },

    #[error("unauthorized")]
    Unauthorized,

    #[error("client is in offline mode")]
    Offline,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("storage is not available")]
    StorageUnavailable,

    #[error("websocket error: {0}")]
    WebSocket(String),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("javascript error: {0}")]
    Js(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    /// Short text suitable for a notification.
    pub fn user_message(&self) -> &'static str {
        match self {
            ClientError::Network(_) | ClientError::Js(_) | ClientError::WebSocket(_) => {
                error_messages::NETWORK_ERROR
            }
            ClientError::Http { status, .. } => match status {
                401 => error_messages::UNAUTHORIZED,
                403 => error_messages::FORBIDDEN,
                404 => error_messages::NOT_FOUND,
                400 | 422 => error_messages::VALIDATION_ERROR,
                500..=599 => error_messages::SERVER_ERROR,
                _ => error_messages::UNKNOWN_ERROR,
            },
            ClientError::Unauthorized => error_messages::UNAUTHORIZED,
            ClientError::Offline => error_messages::OFFLINE,
            ClientError::Validation(_) | ClientError::Graph(_) => error_messages::VALIDATION_ERROR,
            ClientError::Serialization(_)
            | ClientError::Storage(_)
            | ClientError::StorageUnavailable => error_messages::UNKNOWN_ERROR,
        }
    }

    pub fn from_status(status: u16, status_text: impl Into<String>) -> Self {
        if status == 401 {
            ClientError::Unauthorized
        } else {
            ClientError::Http {
                status,
                status_text: status_text.into(),
            }
        }
    }
}

impl From<JsValue> for ClientError {
    fn from(value: JsValue) -> Self {
        let text = value
            .as_string()
            .unwrap_or_else(|| format!("{:?}", value));
        ClientError::Js(text)
    }
}

impl From<ClientError> for JsValue {
    fn from(err: ClientError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_user_messages() {
        assert_eq!(
            ClientError::from_status(404, "Not Found").user_message(),
            error_messages::NOT_FOUND
        );
        assert_eq!(
            ClientError::from_status(503, "Unavailable").user_message(),
            error_messages::SERVER_ERROR
        );
        assert!(matches!(
            ClientError::from_status(401, "Unauthorized"),
            ClientError::Unauthorized
        ));
    }

    #[test]
    fn http_error_display_includes_status() {
        let err = ClientError::from_status(500, "Internal Server Error");
        assert_eq!(err.to_string(), "API request failed: 500 Internal Server Error");
    }
}
