//! Phoenix V2 JSON frames.
//!
//! Every message on the socket is a five element JSON array:
//! `[join_ref, ref, topic, event, payload]`. `join_ref` and `ref` are strings
//! or `null`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Reserved channel event names.
pub mod events {
    pub const JOIN: &str = "phx_join";
    pub const LEAVE: &str = "phx_leave";
    pub const REPLY: &str = "phx_reply";
    pub const ERROR: &str = "phx_error";
    pub const CLOSE: &str = "phx_close";
    pub const HEARTBEAT: &str = "heartbeat";

    /// True for events the channel layer handles itself.
    pub fn is_lifecycle(event: &str) -> bool {
        matches!(event, JOIN | LEAVE | REPLY | ERROR | CLOSE)
    }
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Reply payload is missing a status")]
    MissingStatus,

    #[error("Unknown reply status: {0}")]
    UnknownStatus(String),
}

/// A single Phoenix wire message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireFrame", into = "WireFrame")]
pub struct Frame {
    pub join_ref: Option<String>,
    pub msg_ref: Option<String>,
    pub topic: String,
    pub event: String,
    pub payload: Value,
}

#[derive(Serialize, Deserialize)]
struct WireFrame(Option<String>, Option<String>, String, String, Value);

impl From<WireFrame> for Frame {
    fn from(WireFrame(join_ref, msg_ref, topic, event, payload): WireFrame) -> Self {
        Self {
            join_ref,
            msg_ref,
            topic,
            event,
            payload,
        }
    }
}

impl From<Frame> for WireFrame {
    fn from(frame: Frame) -> Self {
        WireFrame(
            frame.join_ref,
            frame.msg_ref,
            frame.topic,
            frame.event,
            frame.payload,
        )
    }
}

impl Frame {
    pub fn new(
        topic: impl Into<String>,
        event: impl Into<String>,
        payload: Value,
        msg_ref: Option<String>,
        join_ref: Option<String>,
    ) -> Self {
        Self {
            join_ref,
            msg_ref,
            topic: topic.into(),
            event: event.into(),
            payload,
        }
    }

    /// Heartbeat frame for the reserved `phoenix` topic.
    pub fn heartbeat(msg_ref: String) -> Self {
        Self::new(
            crate::topic::PHOENIX_TOPIC,
            events::HEARTBEAT,
            Value::Object(Default::default()),
            Some(msg_ref),
            None,
        )
    }

    pub fn encode(&self) -> Result<String, FrameError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(text: &str) -> Result<Self, FrameError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn is_reply(&self) -> bool {
        self.event == events::REPLY
    }

    /// Parse the payload of a `phx_reply` frame.
    pub fn reply(&self) -> Result<Reply, FrameError> {
        Reply::from_payload(&self.payload)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStatus {
    Ok,
    Error,
    /// Emitted locally by clients when no reply arrives in time.
    Timeout,
}

impl std::str::FromStr for ReplyStatus {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ok" => Ok(ReplyStatus::Ok),
            "error" => Ok(ReplyStatus::Error),
            "timeout" => Ok(ReplyStatus::Timeout),
            other => Err(FrameError::UnknownStatus(other.to_string())),
        }
    }
}

/// Envelope carried by `phx_reply`: `{"status": "...", "response": {...}}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: ReplyStatus,
    pub response: Value,
}

impl Reply {
    pub fn from_payload(payload: &Value) -> Result<Self, FrameError> {
        let status = payload
            .get("status")
            .and_then(Value::as_str)
            .ok_or(FrameError::MissingStatus)?
            .parse()?;
        let response = payload
            .get("response")
            .cloned()
            .unwrap_or(Value::Object(Default::default()));
        Ok(Self { status, response })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn encodes_as_five_element_array() {
        let frame = Frame::new(
            "game:moon",
            events::JOIN,
            json!({"screen_name": "player1"}),
            Some("1".into()),
            Some("1".into()),
        );
        assert_eq!(
            frame.encode().unwrap(),
            r#"["1","1","game:moon","phx_join",{"screen_name":"player1"}]"#
        );
    }

    #[test]
    fn decodes_null_refs() {
        let frame = Frame::decode(r#"[null,null,"game:moon","player_added",{"id":3}]"#).unwrap();
        assert_eq!(frame.join_ref, None);
        assert_eq!(frame.msg_ref, None);
        assert_eq!(frame.event, "player_added");
        assert_eq!(frame.payload, json!({"id": 3}));
    }

    #[test]
    fn heartbeat_targets_phoenix_topic() {
        let frame = Frame::heartbeat("7".into());
        assert_eq!(
            frame.encode().unwrap(),
            r#"[null,"7","phoenix","heartbeat",{}]"#
        );
    }

    #[test]
    fn rejects_short_arrays() {
        assert!(matches!(
            Frame::decode(r#"["1","game:moon"]"#),
            Err(FrameError::Malformed(_))
        ));
    }

    #[test]
    fn parses_reply_envelope() {
        let frame =
            Frame::decode(r#"["1","2","game:moon","phx_reply",{"status":"error","response":{"reason":"full"}}]"#)
                .unwrap();
        assert!(frame.is_reply());
        let reply = frame.reply().unwrap();
        assert_eq!(reply.status, ReplyStatus::Error);
        assert_eq!(reply.response, json!({"reason": "full"}));
    }

    #[test]
    fn reply_without_response_defaults_to_empty_object() {
        let reply = Reply::from_payload(&json!({"status": "ok"})).unwrap();
        assert_eq!(reply.response, json!({}));
    }

    #[test]
    fn reply_without_status_is_an_error() {
        assert!(matches!(
            Reply::from_payload(&json!({"response": {}})),
            Err(FrameError::MissingStatus)
        ));
        assert!(matches!(
            Reply::from_payload(&json!({"status": "maybe"})),
            Err(FrameError::UnknownStatus(s)) if s == "maybe"
        ));
    }

    #[test]
    fn lifecycle_events() {
        assert!(events::is_lifecycle("phx_reply"));
        assert!(events::is_lifecycle("phx_close"));
        assert!(!events::is_lifecycle("hello"));
    }
}
