//! Zabbix API client.
//!
//! One [`ZabbixClient`] owns one API URL, one optional bearer token and one
//! HTTP transport. Every [`invoke`](ZabbixClient::invoke) performs exactly one
//! JSON-RPC request/response exchange; nothing is retried.

use crate::credentials::ClientConfig;
use crate::error::{ZabbixError, ZabbixResult};
use crate::rpc::{RpcRequest, RpcResponse};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, instrument, warn};

/// Content type expected by the Zabbix JSON-RPC endpoint.
pub const CONTENT_TYPE_JSON_RPC: &str = "application/json-rpc";

/// Zabbix API client.
///
/// Safe to share between tasks: each call takes its own id from an atomic
/// counter, so concurrent calls never reuse an identifier.
#[derive(Debug)]
pub struct ZabbixClient {
    /// HTTP client instance.
    client: Client,

    /// Resolved connection settings.
    config: ClientConfig,

    /// Next JSON-RPC call id.
    next_id: AtomicU64,
}

impl ZabbixClient {
    /// Create a new client.
    ///
    /// Fails only if the TLS backend cannot be initialised.
    pub fn new(config: ClientConfig) -> ZabbixResult<Self> {
        let client = Client::builder()
            .danger_accept_invalid_certs(config.skip_tls_verify)
            .build()?;

        Ok(Self {
            client,
            config,
            next_id: AtomicU64::new(1),
        })
    }

    /// API endpoint URL.
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Whether a bearer token is attached to calls.
    pub fn has_auth(&self) -> bool {
        self.config.token.is_some()
    }

    /// Connection settings this client was built from.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Call an API method and return its raw result payload.
    ///
    /// The result is decoded only as far as [`serde_json::Value`]; typed
    /// decoding is left to the caller.
    #[instrument(skip(self, params), fields(url = %self.config.url))]
    pub async fn invoke<P>(&self, method: &str, params: &P) -> ZabbixResult<serde_json::Value>
    where
        P: Serialize + ?Sized,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = serde_json::to_vec(&RpcRequest::new(method, params, id))?;

        debug!(id, "Making Zabbix API call");

        let mut request = self
            .client
            .post(&self.config.url)
            .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE_JSON_RPC)
            .body(body);

        if let Some(ref token) = self.config.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        decode_response(id, status, &body)
    }

    /// Exchange a username and password for an API session token.
    ///
    /// Sent without an `Authorization` header regardless of the configured
    /// token, as `user.login` requires.
    #[instrument(skip(self, password), fields(url = %self.config.url))]
    pub async fn login(&self, username: &str, password: &str) -> ZabbixResult<String> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let params = serde_json::json!({ "username": username, "password": password });
        let body = serde_json::to_vec(&RpcRequest::new("user.login", &params, id))?;

        let response = self
            .client
            .post(&self.config.url)
            .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE_JSON_RPC)
            .body(body)
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;

        match decode_response(id, status, &body)? {
            serde_json::Value::String(token) => Ok(token),
            other => Err(ZabbixError::Protocol(format!(
                "user.login returned a non-string result: {}",
                other
            ))),
        }
    }
}

/// Turn a response body into a result payload or an error.
fn decode_response(id: u64, status: StatusCode, body: &[u8]) -> ZabbixResult<serde_json::Value> {
    let response: RpcResponse = serde_json::from_slice(body).map_err(|e| {
        warn!(status = status.as_u16(), "Zabbix API returned an unparseable body");
        ZabbixError::Protocol(format!(
            "failed to unmarshal response (HTTP {}): {}",
            status.as_u16(),
            e
        ))
    })?;

    if let Some(error) = response.error {
        debug!(code = error.code, "Zabbix API returned an error object");
        return Err(ZabbixError::Api {
            code: error.code,
            message: error.message,
            data: error.data,
        });
    }

    if !response.matches(id) {
        return Err(ZabbixError::Protocol(format!(
            "response id {:?} does not match request id {}",
            response.id, id
        )));
    }

    response
        .result
        .ok_or_else(|| ZabbixError::Protocol("response carries neither result nor error".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = ZabbixClient::new(
            ClientConfig::new("http://localhost/api_jsonrpc.php").with_token("test-token"),
        )
        .unwrap();
        assert!(client.has_auth());
        assert_eq!(client.url(), "http://localhost/api_jsonrpc.php");
    }

    #[test]
    fn test_decode_success() {
        let body = br#"{"jsonrpc":"2.0","result":[{"hostid":"10084"}],"id":3}"#;
        let result = decode_response(3, StatusCode::OK, body).unwrap();
        assert_eq!(result[0]["hostid"], "10084");
    }

    #[test]
    fn test_decode_error_wins_over_id() {
        // Zabbix answers parse failures with a null id.
        let body = br#"{"jsonrpc":"2.0","error":{"code":-32700,"message":"Parse error","data":"Invalid JSON."},"id":null}"#;
        let err = decode_response(1, StatusCode::OK, body).unwrap_err();
        assert_eq!(err.api_code(), Some(-32700));
    }

    #[test]
    fn test_decode_id_mismatch() {
        let body = br#"{"jsonrpc":"2.0","result":[],"id":2}"#;
        let err = decode_response(1, StatusCode::OK, body).unwrap_err();
        assert!(matches!(err, ZabbixError::Protocol(_)));
    }

    #[test]
    fn test_decode_missing_result() {
        let body = br#"{"jsonrpc":"2.0","id":1}"#;
        let err = decode_response(1, StatusCode::OK, body).unwrap_err();
        assert!(matches!(err, ZabbixError::Protocol(_)));
    }

    #[test]
    fn test_decode_garbage() {
        let err = decode_response(1, StatusCode::BAD_GATEWAY, b"<html>bad gateway</html>").unwrap_err();
        match err {
            ZabbixError::Protocol(message) => assert!(message.contains("HTTP 502")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
