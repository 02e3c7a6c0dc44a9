//! # Zabbix MCP
//!
//! MCP (Model Context Protocol) server exposing the Zabbix management API as
//! tools, over stdio or streamable HTTP.
//!
//! ## Overview
//!
//! - **Server**: [`McpServer`] routes JSON-RPC methods and owns the tool
//!   registry
//! - **Sessions**: [`SessionBackends`] gives every MCP session its own
//!   [`zabbix_client::ZabbixClient`], stored in a [`SessionStore`]
//! - **Transports**: [`stdio`] (one implicit session) and [`http`]
//!   (`Mcp-Session-Id` sessions behind the [`middleware`] stack)
//! - **Lifecycle**: [`Shutdown`] drives `Running -> Draining -> Stopped`
//!
//! Supported methods:
//! - `initialize`: Initialize the MCP session
//! - `ping`: Liveness check
//! - `tools/list`: List available tools
//! - `tools/call`: Execute a tool
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use zabbix_mcp::{tools::all_tools, McpServer, SessionBackends, Shutdown};
//!
//! async fn run() -> Result<(), zabbix_mcp::ServerError> {
//!     let server = Arc::new(McpServer::zabbix(Arc::new(SessionBackends::from_env())));
//!     server.register_tools(all_tools()).await;
//!
//!     let shutdown = Shutdown::default();
//!     shutdown.spawn_signal_handler();
//!     zabbix_mcp::stdio::serve_stdio(server, &shutdown).await
//! }
//! ```

pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod logging;
pub mod middleware;
pub mod server;
pub mod session;
pub mod shutdown;
pub mod stdio;
pub mod tools;
pub mod types;

pub use config::{Cli, ConfigError, HttpConfig, ServerConfig, TransportMode};
pub use error::{ServerError, ServerResult};
pub use middleware::{CorsConfig, CorsMode};
pub use server::{
    decode_request, FunctionTool, InvokeError, McpServer, McpServerError, McpServerResult, Tool,
    ToolContext,
};
pub use session::{LruSessionRegistry, SessionBackends, SessionError, SessionRegistry, SessionStore};
pub use shutdown::{Shutdown, ShutdownState, DRAIN_TIMEOUT};
pub use types::{
    ContentBlock, McpError, McpRequest, McpResponse, RequestId, ServerCapabilities, ServerInfo,
    ToolAnnotations, ToolCall, ToolCapabilities, ToolDefinition, ToolResult,
};
