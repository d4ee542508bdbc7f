//! Chat WebSocket frames.
//!
//! Every frame is a JSON object whose `type` field selects the variant:
//!
//! ```text
//! -> {"type":"message","content":"hello"}
//! <- {"type":"response","message":"hi there"}
//! <- {"type":"error","message":"model unavailable"}
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChatFrame {
    /// Outgoing user message.
    Message { content: String },
    /// Agent reply.
    Response { message: String },
    Error { message: String },
}

impl ChatFrame {
    pub fn user(content: impl Into<String>) -> Self {
        ChatFrame::Message { content: content.into() }
    }

    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outgoing_message_shape() {
        let json = ChatFrame::user("hello").encode().unwrap();
        assert_eq!(json, r#"{"type":"message","content":"hello"}"#);
    }

    #[test]
    fn incoming_frames_decode() {
        assert_eq!(
            ChatFrame::decode(r#"{"type":"response","message":"hi","extra":1}"#).unwrap(),
            ChatFrame::Response { message: "hi".into() }
        );
        assert_eq!(
            ChatFrame::decode(r#"{"type":"error","message":"boom"}"#).unwrap(),
            ChatFrame::Error { message: "boom".into() }
        );
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!(ChatFrame::decode(r#"{"type":"typing"}"#).is_err());
        assert!(ChatFrame::decode("not json").is_err());
    }
}
