//! Response envelope shared by every remote operation

use serde_json::Value;

use crate::constants::{STATUS_NOTOK, STATUS_OK};

/// Normalized response wrapper.
///
/// REST responses look like `{"status":"1","message":"OK","result":...}` and
/// carry their payload under `result`. JSON-RPC proxy responses carry a
/// `jsonrpc` key and no status; the whole object is the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// `"1"`, `"0"`, or whatever else the remote sent (empty when absent)
    pub status: String,
    /// Human-readable remote message (empty when absent)
    pub message: String,
    /// `result` for REST responses, the whole object for JSON-RPC
    pub payload: Value,
    /// Set when the body carried a `jsonrpc` key
    pub json_rpc: bool,
}

impl Envelope {
    /// Explicit success status
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }

    /// Explicit failure status; everything else counts as success
    pub fn is_notok(&self) -> bool {
        self.status == STATUS_NOTOK
    }
}
