//! JSON envelopes exchanged with the extension, and the query → response table.

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::NmError;

/// A message sent by the extension to the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IncomingMessage {
    #[serde(default)]
    pub query: String,
}

/// A response to an incoming query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingMessage {
    pub query: String,
    pub response: String,
}

impl OutgoingMessage {
    /// Reply to `query` using the [`respond`] table.
    pub fn answer(query: impl Into<String>) -> Self {
        let query = query.into();
        let response = respond(&query).to_string();
        Self { query, response }
    }

    /// Message whose response repeats the query.
    pub fn echo(query: impl Into<String>) -> Self {
        let query = query.into();
        Self {
            response: query.clone(),
            query,
        }
    }
}

/// Map a query to its response. Total: anything unknown answers `"42"`.
pub fn respond(query: &str) -> &'static str {
    match query {
        "ping" => "pong",
        "hello" => "goodbye",
        _ => "42",
    }
}

/// Parse a frame payload as `{"query": ...}`.
pub fn decode_incoming(payload: &[u8]) -> Result<IncomingMessage, NmError> {
    serde_json::from_slice(payload).map_err(NmError::DeserializeJson)
}

/// Like [`decode_incoming`], but a malformed payload is logged and becomes an empty query.
pub fn decode_incoming_or_default(payload: &[u8]) -> IncomingMessage {
    decode_incoming(payload).unwrap_or_else(|e| {
        error!(error = %e, "malformed message, treating it as an empty query");
        IncomingMessage::default()
    })
}

/// Serialize the wire body for `msg`.
///
/// Only the `response` string goes over stdio (e.g. `"pong"`), not the
/// whole `{query, response}` object. Extensions rely on this shape.
pub fn encode_outgoing(msg: &OutgoingMessage) -> Result<Vec<u8>, NmError> {
    serde_json::to_vec(&msg.response).map_err(NmError::SerializeJson)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_table_is_total() {
        assert_eq!(respond("ping"), "pong");
        assert_eq!(respond("hello"), "goodbye");
        assert_eq!(respond(""), "42");
        assert_eq!(respond("anything-else"), "42");
        assert_eq!(respond("PING"), "42");
    }

    #[test]
    fn decodes_query_envelope() {
        let msg = decode_incoming(br#"{"query":"ping","extra":1}"#).unwrap();
        assert_eq!(msg.query, "ping");
    }

    #[test]
    fn missing_query_field_is_empty() {
        let msg = decode_incoming(b"{}").unwrap();
        assert_eq!(msg.query, "");
    }

    #[test]
    fn malformed_json_degrades_to_empty_query() {
        assert!(matches!(
            decode_incoming(br#"{"qu"#),
            Err(NmError::DeserializeJson(_))
        ));
        let msg = decode_incoming_or_default(br#"{"qu"#);
        assert_eq!(msg, IncomingMessage::default());
        assert_eq!(respond(&msg.query), "42");
    }

    #[test]
    fn encodes_response_only() {
        let out = OutgoingMessage::answer("hello");
        assert_eq!(out.response, "goodbye");
        assert_eq!(encode_outgoing(&out).unwrap(), br#""goodbye""#.to_vec());
    }

    #[test]
    fn full_envelope_carries_both_fields() {
        let json = serde_json::to_value(OutgoingMessage::answer("ping")).unwrap();
        assert_eq!(json, serde_json::json!({"query": "ping", "response": "pong"}));
    }

    #[test]
    fn echo_copies_query_into_response() {
        let out = OutgoingMessage::echo("ping");
        assert_eq!(out.query, "ping");
        assert_eq!(out.response, "ping");
    }

    #[test]
    fn response_string_is_json_escaped() {
        let out = OutgoingMessage::echo("say \"hi\"");
        assert_eq!(encode_outgoing(&out).unwrap(), br#""say \"hi\"""#.to_vec());
    }
}
