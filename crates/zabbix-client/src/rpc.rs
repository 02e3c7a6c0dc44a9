//! JSON-RPC 2.0 envelope used on the wire to the Zabbix API.

use serde::{Deserialize, Serialize};

/// JSON-RPC protocol version tag.
pub const JSONRPC_VERSION: &str = "2.0";

/// Outbound request envelope.
#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest<'a, P: Serialize> {
    /// Always "2.0".
    pub jsonrpc: &'static str,

    /// Dot-namespaced API method, e.g. `host.get`.
    pub method: &'a str,

    /// Method parameters.
    pub params: P,

    /// Call identifier echoed back by the server.
    pub id: u64,
}

impl<'a, P: Serialize> RpcRequest<'a, P> {
    /// Create a request envelope.
    pub fn new(method: &'a str, params: P, id: u64) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method,
            params,
            id,
        }
    }
}

/// Inbound response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse {
    /// Protocol version reported by the server.
    #[serde(default)]
    pub jsonrpc: Option<String>,

    /// Result payload on success.
    #[serde(default)]
    pub result: Option<serde_json::Value>,

    /// Error object on failure.
    #[serde(default)]
    pub error: Option<RpcErrorObject>,

    /// Call identifier. Zabbix sends a number; some proxies echo strings.
    #[serde(default)]
    pub id: Option<serde_json::Value>,
}

impl RpcResponse {
    /// Whether the response id refers to the given call id.
    pub fn matches(&self, id: u64) -> bool {
        match &self.id {
            Some(serde_json::Value::Number(n)) => n.as_u64() == Some(id),
            Some(serde_json::Value::String(s)) => s.parse::<u64>().ok() == Some(id),
            _ => false,
        }
    }
}

/// Error object carried by a failed response.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RpcErrorObject {
    /// Error code.
    pub code: i64,

    /// Short error message.
    pub message: String,

    /// Additional detail.
    #[serde(default)]
    pub data: String,
}
