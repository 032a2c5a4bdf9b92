//! Envelope normalization
//!
//! Turns a raw response body into an [`Envelope`]. Pure: no retries, no
//! logging, no classification. Those belong to the executor.

use chainscan_domain::Envelope;
use serde_json::{Map, Value};

const KEY_JSON_RPC: &str = "jsonrpc";
const KEY_STATUS: &str = "status";
const KEY_MESSAGE: &str = "message";
const KEY_RESULT: &str = "result";

/// Why a body could not be normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyDefect {
    /// Zero bytes or only whitespace
    Empty,
    /// Not JSON, or JSON that is not an object
    Malformed,
}

/// Parse a response body into an [`Envelope`].
///
/// Objects carrying a `jsonrpc` key are proxy responses and become the
/// payload as a whole; every other object contributes its `result` field
/// (`null` when absent).
pub fn normalize(body: &[u8]) -> Result<Envelope, BodyDefect> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(BodyDefect::Empty);
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(object)) => Ok(from_object(object)),
        Ok(_) | Err(_) => Err(BodyDefect::Malformed),
    }
}

fn from_object(mut object: Map<String, Value>) -> Envelope {
    let status = object.get(KEY_STATUS).map(scalar_to_string).unwrap_or_default();
    let message = object.get(KEY_MESSAGE).map(scalar_to_string).unwrap_or_default();

    if object.contains_key(KEY_JSON_RPC) {
        return Envelope { status, message, payload: Value::Object(object), json_rpc: true };
    }

    let payload = object.remove(KEY_RESULT).unwrap_or(Value::Null);
    Envelope { status, message, payload, json_rpc: false }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn rest_envelope_extracts_result() {
        let envelope =
            normalize(br#"{"status":"1","message":"OK","result":[{"hash":"0x1"}]}"#).unwrap();
        assert_eq!(envelope.status, "1");
        assert_eq!(envelope.message, "OK");
        assert_eq!(envelope.payload, json!([{"hash": "0x1"}]));
        assert!(!envelope.json_rpc);
        assert!(envelope.is_ok());
    }

    #[test]
    fn json_rpc_envelope_keeps_whole_object() {
        let body = br#"{"jsonrpc":"2.0","id":83,"result":"0x10d4f"}"#;
        let envelope = normalize(body).unwrap();
        assert_eq!(envelope.payload, json!({"jsonrpc": "2.0", "id": 83, "result": "0x10d4f"}));
        assert!(envelope.json_rpc);
        assert_eq!(envelope.status, "");
        assert!(!envelope.is_notok());
    }

    #[test]
    fn numeric_status_is_stringified() {
        let envelope = normalize(br#"{"status":0,"message":"No transactions found","result":[]}"#)
            .unwrap();
        assert_eq!(envelope.status, "0");
        assert!(envelope.is_notok());
    }

    #[test]
    fn missing_result_becomes_null() {
        let envelope = normalize(br#"{"status":"1","message":"OK"}"#).unwrap();
        assert_eq!(envelope.payload, Value::Null);
    }

    #[test]
    fn defects_are_classified() {
        assert_eq!(normalize(b""), Err(BodyDefect::Empty));
        assert_eq!(normalize(b"  \n"), Err(BodyDefect::Empty));
        assert_eq!(normalize(b"<html>502 Bad Gateway</html>"), Err(BodyDefect::Malformed));
        assert_eq!(normalize(b"[1,2,3]"), Err(BodyDefect::Malformed));
        assert_eq!(normalize(b"{\"status\":"), Err(BodyDefect::Malformed));
    }
}
