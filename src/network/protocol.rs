//! SignalR JSON hub protocol, version 1.
//!
//! Every message is a JSON object terminated by [`RECORD_SEPARATOR`]. A
//! single WebSocket text frame may carry any number of records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::HubError;

pub const RECORD_SEPARATOR: char = '\u{1e}';
pub const PROTOCOL_NAME: &str = "json";
pub const PROTOCOL_VERSION: u32 = 1;

const INVOCATION: u8 = 1;
const PING: u8 = 6;
const CLOSE: u8 = 7;

#[derive(Debug, Serialize)]
struct HandshakeRequest<'a> {
    protocol: &'a str,
    version: u32,
}

#[derive(Debug, Default, Deserialize)]
struct HandshakeResponse {
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OutboundInvocation<'a> {
    #[serde(rename = "type")]
    kind: u8,
    target: &'a str,
    arguments: &'a [Value],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMessage {
    #[serde(rename = "type")]
    kind: u8,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    arguments: Vec<Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Messages the client cares about. Everything else is `Other(type)`.
#[derive(Debug, Clone, PartialEq)]
pub enum HubMessage {
    Invocation {
        target: String,
        arguments: Vec<Value>,
    },
    Ping,
    Close {
        error: Option<String>,
    },
    Other(u8),
}

pub fn handshake_request() -> String {
    let request = HandshakeRequest {
        protocol: PROTOCOL_NAME,
        version: PROTOCOL_VERSION,
    };
    // Serializing two plain fields cannot fail.
    let mut frame = serde_json::to_string(&request).unwrap_or_default();
    frame.push(RECORD_SEPARATOR);
    frame
}

/// Splits the handshake response off the front of `buffer`.
///
/// Returns `Ok(None)` while the separator has not arrived yet. On success the
/// bytes after the handshake record are returned so the caller can decode
/// any hub messages that shared the frame.
pub fn parse_handshake_response(buffer: &str) -> Result<Option<String>, HubError> {
    let Some(end) = buffer.find(RECORD_SEPARATOR) else {
        return Ok(None);
    };

    let response: HandshakeResponse = serde_json::from_str(&buffer[..end])
        .map_err(|err| HubError::Handshake(format!("malformed response: {err}")))?;
    if let Some(error) = response.error {
        return Err(HubError::Handshake(error));
    }

    Ok(Some(buffer[end + RECORD_SEPARATOR.len_utf8()..].to_string()))
}

pub fn encode_invocation(target: &str, arguments: &[Value]) -> Result<String, HubError> {
    let message = OutboundInvocation {
        kind: INVOCATION,
        target,
        arguments,
    };
    let mut frame = serde_json::to_string(&message)?;
    frame.push(RECORD_SEPARATOR);
    Ok(frame)
}

pub fn encode_ping() -> String {
    format!("{{\"type\":{PING}}}{RECORD_SEPARATOR}")
}

/// Decodes every complete record in `frame`. A malformed record is reported
/// as an error in its slot so one bad message does not drop its neighbours.
pub fn decode_frame(frame: &str) -> Vec<Result<HubMessage, HubError>> {
    frame
        .split(RECORD_SEPARATOR)
        .filter(|record| !record.trim().is_empty())
        .map(decode_record)
        .collect()
}

fn decode_record(record: &str) -> Result<HubMessage, HubError> {
    let raw: RawMessage = serde_json::from_str(record)?;
    let message = match raw.kind {
        INVOCATION => {
            let target = raw
                .target
                .ok_or_else(|| HubError::Protocol("invocation without target".to_string()))?;
            HubMessage::Invocation {
                target,
                arguments: raw.arguments,
            }
        }
        PING => HubMessage::Ping,
        CLOSE => HubMessage::Close { error: raw.error },
        other => HubMessage::Other(other),
    };
    Ok(message)
}
