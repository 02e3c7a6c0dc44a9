//! # Zabbix Client
//!
//! JSON-RPC client for the Zabbix 7.0 management API, plus the rules that
//! decide which API URL and token a session talks to.
//!
//! ## Overview
//!
//! - **Client**: [`ZabbixClient`] performs one JSON-RPC exchange per call,
//!   authenticated with `Authorization: Bearer <token>`
//! - **Envelope**: [`rpc`] holds the request/response framing
//! - **Credentials**: [`credentials::resolve`] picks URL and token from
//!   request-scoped values, then environment defaults
//! - **Errors**: transport, protocol and API failures are kept apart in
//!   [`ZabbixError`]
//!
//! ## Usage
//!
//! ```rust,no_run
//! use zabbix_client::{resolve, BackendDefaults, RequestValues, ZabbixClient};
//!
//! async fn list_hosts() -> Result<(), Box<dyn std::error::Error>> {
//!     let values = RequestValues::new().with_token("api-token");
//!     let config = resolve(&values, &BackendDefaults::from_env())?;
//!     let client = ZabbixClient::new(config)?;
//!
//!     let hosts = client
//!         .invoke("host.get", &serde_json::json!({"output": "extend", "limit": 10}))
//!         .await?;
//!     println!("{}", hosts);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod credentials;
pub mod error;
pub mod rpc;

pub use client::{ZabbixClient, CONTENT_TYPE_JSON_RPC};
pub use credentials::{
    resolve, resolve_url, BackendDefaults, ClientConfig, RequestValues, DEFAULT_ZABBIX_URL,
};
pub use error::{CredentialError, ZabbixError, ZabbixResult};
pub use rpc::{RpcErrorObject, RpcRequest, RpcResponse};
