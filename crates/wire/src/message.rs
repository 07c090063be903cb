//! Message envelopes — JSON text frames over the persistent connection.
//!
//! **Client → Server:**
//! - `{ "type": "hello", "client": { ...metadata } }`
//! - `{ "type": "log", "level": "...", "values": [...], ... }`
//!
//! **Server → Client:**
//! - `{ "type": "config", "config": { "networkEnabled": ..., ... } }`
//!
//! Frames that fail to parse (bad JSON, missing or unknown `type`) are
//! discarded silently at the receiving end.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::event::LogEventPayload;
use crate::options::ConfigUpdate;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    Hello {
        /// Free-form runtime metadata, merged additively into the session.
        client: HashMap<String, Value>,
    },
    Log(LogEventPayload),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    Config { config: ConfigUpdate },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_frame_shape() {
        let mut client = HashMap::new();
        client.insert("runtime".to_string(), Value::from("server"));
        let frame = serde_json::to_value(ClientMessage::Hello { client }).unwrap();
        assert_eq!(frame["type"], "hello");
        assert_eq!(frame["client"]["runtime"], "server");
    }

    #[test]
    fn log_frame_flattens_payload_fields() {
        let msg = ClientMessage::Log(LogEventPayload {
            level: Some("warn".to_string()),
            text: Some("disk low".to_string()),
            ..Default::default()
        });
        let frame = serde_json::to_value(&msg).unwrap();
        assert_eq!(frame["type"], "log");
        assert_eq!(frame["level"], "warn");
        assert_eq!(frame["text"], "disk low");
    }

    #[test]
    fn log_frame_round_trip() {
        let text = r#"{"type":"log","level":"error","line":10,"file":"/app/x.rs"}"#;
        let msg: ClientMessage = serde_json::from_str(text).unwrap();
        match msg {
            ClientMessage::Log(payload) => {
                assert_eq!(payload.level.as_deref(), Some("error"));
                assert_eq!(payload.line, Some(10));
            }
            other => panic!("expected log frame, got {:?}", other),
        }
    }

    #[test]
    fn unknown_type_fails_to_parse() {
        let result = serde_json::from_str::<ClientMessage>(r#"{"type":"metrics"}"#);
        assert!(result.is_err(), "unknown frame types must be rejected");
    }

    #[test]
    fn missing_type_fails_to_parse() {
        let result = serde_json::from_str::<ClientMessage>(r#"{"level":"info"}"#);
        assert!(result.is_err(), "frames without a type must be rejected");
    }

    #[test]
    fn config_frame_shape() {
        let text = r#"{"type":"config","config":{"networkEnabled":true}}"#;
        let msg: ServerMessage = serde_json::from_str(text).unwrap();
        let ServerMessage::Config { config } = msg;
        assert_eq!(config.network_enabled, Some(true));
    }
}
