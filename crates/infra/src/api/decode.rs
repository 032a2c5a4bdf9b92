//! Typed decoding of response payloads

use chainscan_domain::{ChainScanError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Decode a raw payload into `T`.
pub fn decode_payload<T: DeserializeOwned>(payload: Value) -> Result<T> {
    serde_json::from_value(payload).map_err(|err| decode_error::<T>(&err))
}

/// Re-encode any serializable value and decode it as `T`.
///
/// Useful when an adapter holds a loosely typed structure (for example a
/// JSON-RPC object with a nested `result`) and wants a concrete model.
pub fn convert<S, T>(value: &S) -> Result<T>
where
    S: Serialize + ?Sized,
    T: DeserializeOwned,
{
    let intermediate = serde_json::to_value(value).map_err(|err| decode_error::<T>(&err))?;
    decode_payload(intermediate)
}

fn decode_error<T>(err: &serde_json::Error) -> ChainScanError {
    ChainScanError::Decode {
        target: std::any::type_name::<T>().to_string(),
        message: err.to_string(),
    }
}
