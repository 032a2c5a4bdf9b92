//! Request descriptors
//!
//! A [`RequestDescriptor`] is everything the executor needs to perform one
//! logical remote call. Adapters build one per call and hand it over by
//! reference; the executor never mutates it.

use std::collections::BTreeMap;
use std::fmt;

use chainscan_common::resilience::OverflowBehavior;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// HTTP method used to transmit the call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransportMethod {
    /// Every parameter travels in the query string
    #[default]
    Get,
    /// Non-identifying parameters travel as a JSON body
    Post,
}

impl fmt::Display for TransportMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => f.write_str("GET"),
            Self::Post => f.write_str("POST"),
        }
    }
}

/// Description of one remote call
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    module: String,
    action: String,
    params: BTreeMap<String, String>,
    method: TransportMethod,
    base_url: String,
    empty_sentinel: Value,
    overflow: Option<OverflowBehavior>,
    retry_depth: u32,
}

impl RequestDescriptor {
    /// New GET descriptor with no parameters and a `null` sentinel
    pub fn new(
        base_url: impl Into<String>,
        module: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            module: module.into(),
            action: action.into(),
            params: BTreeMap::new(),
            method: TransportMethod::Get,
            base_url: base_url.into(),
            empty_sentinel: Value::Null,
            overflow: None,
            retry_depth: 0,
        }
    }

    /// Add or replace one operation parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Add several operation parameters
    pub fn params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.params.extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Transport layout, GET by default
    pub fn method(mut self, method: TransportMethod) -> Self {
        self.method = method;
        self
    }

    /// Value returned in place of a payload when the remote reports no data
    pub fn empty_sentinel(mut self, sentinel: Value) -> Self {
        self.empty_sentinel = sentinel;
        self
    }

    /// Per-call overflow behavior, overriding the client default
    pub fn overflow(mut self, behavior: OverflowBehavior) -> Self {
        self.overflow = Some(behavior);
        self
    }

    /// Throttle retries already spent on this call
    pub fn retry_depth(mut self, depth: u32) -> Self {
        self.retry_depth = depth;
        self
    }

    /// Remote module, sent as `module`
    pub fn module_name(&self) -> &str {
        &self.module
    }

    /// Remote action, sent as `action`
    pub fn action_name(&self) -> &str {
        &self.action
    }

    /// Adapter parameters as given, before injection and pruning
    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// GET or POST
    pub fn transport_method(&self) -> TransportMethod {
        self.method
    }

    /// Endpoint the call is sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Value returned in place of an empty result
    pub fn sentinel(&self) -> &Value {
        &self.empty_sentinel
    }

    /// Per-call overflow behavior, if set
    pub fn overflow_override(&self) -> Option<OverflowBehavior> {
        self.overflow
    }

    /// Throttle retry depth this call starts from
    pub fn depth(&self) -> u32 {
        self.retry_depth
    }

    /// `module.action`, used in logs and error messages
    pub fn operation(&self) -> String {
        format!("{}.{}", self.module, self.action)
    }
}
