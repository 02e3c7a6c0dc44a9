//! MCP method dispatch and the tool registry.
//!
//! This module provides the tool-dispatch core shared by both transports:
//! the tool registry, JSON-RPC method routing and the per-call context that
//! ties a tool invocation to its session's Zabbix client.

use crate::session::{SessionBackends, SessionError};
use crate::types::*;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};
use zabbix_client::{RequestValues, ZabbixClient, ZabbixError};

/// Dispatch failures, mapped to JSON-RPC error objects.
#[derive(Debug, Error)]
pub enum McpServerError {
    /// Tool not found
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Invalid parameters
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),
}

impl From<McpServerError> for McpError {
    fn from(err: McpServerError) -> Self {
        // Both variants describe a bad `tools/call` request.
        McpError::invalid_params(err.to_string())
    }
}

/// Result of dispatch and tool execution.
pub type McpServerResult<T> = Result<T, McpServerError>;

/// Failure of [`ToolContext::invoke`].
#[derive(Debug, Error)]
pub enum InvokeError {
    /// The session has no client and none could be created.
    #[error("Failed to get Zabbix client: {0}")]
    Client(#[from] SessionError),

    /// The backend call itself failed.
    #[error(transparent)]
    Call(#[from] ZabbixError),
}

/// A callable MCP tool.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Entry for `tools/list`.
    fn definition(&self) -> ToolDefinition;

    /// Run with the raw `arguments` object of `tools/call`.
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult>;
}

/// Per-call view of the session a tool runs in.
///
/// Carries the calling session and the request-scoped values of the call, so
/// a tool reaches the right Zabbix deployment without any ambient state.
#[derive(Clone)]
pub struct ToolContext {
    /// Session the call belongs to
    pub session_id: String,

    /// URL/token values supplied with this request
    pub request_values: RequestValues,

    backends: Arc<SessionBackends>,
}

impl ToolContext {
    /// Create a context for one call.
    pub fn new(
        session_id: impl Into<String>,
        request_values: RequestValues,
        backends: Arc<SessionBackends>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            request_values,
            backends,
        }
    }

    /// The session's client, created on demand from this call's values.
    pub async fn client(&self) -> Result<Arc<ZabbixClient>, SessionError> {
        self.backends
            .client_for(&self.session_id, &self.request_values)
            .await
    }

    /// Call a Zabbix API method on behalf of the session.
    pub async fn invoke<P>(&self, method: &str, params: &P) -> Result<serde_json::Value, InvokeError>
    where
        P: Serialize + ?Sized + Sync,
    {
        let client = self.client().await?;
        Ok(client.invoke(method, params).await?)
    }
}

impl std::fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolContext")
            .field("session_id", &self.session_id)
            .field("has_url", &self.request_values.url.is_some())
            .field("has_token", &self.request_values.token.is_some())
            .finish()
    }
}

/// Decode one JSON-RPC message, or produce the error response for it.
pub fn decode_request(body: &[u8]) -> Result<McpRequest, McpResponse> {
    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|_| McpResponse::error(RequestId::Null, McpError::parse_error()))?;

    let id = value
        .get("id")
        .cloned()
        .and_then(|id| serde_json::from_value::<RequestId>(id).ok())
        .unwrap_or_default();

    let request: McpRequest = serde_json::from_value(value)
        .map_err(|e| McpResponse::error(id.clone(), McpError::invalid_request().with_data(e.to_string().into())))?;

    if request.jsonrpc != "2.0" {
        return Err(McpResponse::error(id, McpError::invalid_request()));
    }
    Ok(request)
}

/// Zabbix MCP server.
///
/// Holds the tool registry and the session backends every tool call is
/// routed through.
pub struct McpServer {
    /// Server info
    info: ServerInfo,

    /// Server capabilities
    capabilities: ServerCapabilities,

    /// Registered tools
    tools: Arc<RwLock<HashMap<String, Arc<dyn Tool>>>>,

    /// Session-scoped Zabbix clients
    backends: Arc<SessionBackends>,
}

impl McpServer {
    /// Server with an empty registry.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        backends: Arc<SessionBackends>,
    ) -> Self {
        Self {
            info: ServerInfo {
                name: name.into(),
                version: version.into(),
            },
            capabilities: ServerCapabilities {
                tools: Some(ToolCapabilities { list_changed: false }),
                experimental: HashMap::new(),
            },
            tools: Arc::new(RwLock::new(HashMap::new())),
            backends,
        }
    }

    /// Create with the default server name and crate version.
    pub fn zabbix(backends: Arc<SessionBackends>) -> Self {
        Self::new("zabbix-mcp-server", env!("CARGO_PKG_VERSION"), backends)
    }

    /// Register a tool. A tool with the same name is replaced.
    pub async fn register_tool(&self, tool: Arc<dyn Tool>) {
        let name = tool.definition().name;

        let mut tools = self.tools.write().await;
        if tools.insert(name.clone(), tool).is_some() {
            warn!(tool = %name, "Replaced previously registered tool");
        }
    }

    /// Register each tool in order.
    pub async fn register_tools(&self, tools: Vec<Arc<dyn Tool>>) {
        for tool in tools {
            self.register_tool(tool).await;
        }
    }

    /// Get all tool definitions, ordered by name.
    pub async fn list_tools(&self) -> Vec<ToolDefinition> {
        let tools = self.tools.read().await;
        let mut definitions: Vec<_> = tools.values().map(|t| t.definition()).collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    /// Execute a tool.
    #[instrument(skip(self, arguments, context), fields(session_id = %context.session_id))]
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        // Clone out so the registry lock is not held across the backend call.
        let tool = self
            .tools
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| McpServerError::ToolNotFound(name.to_string()))?;

        tool.execute(arguments, context).await
    }

    /// Build the tool context for a call on a session.
    pub fn context(&self, session_id: &str, values: RequestValues) -> ToolContext {
        ToolContext::new(session_id, values, Arc::clone(&self.backends))
    }

    /// Dispatch one JSON-RPC message.
    ///
    /// Returns `None` for notifications, which get no response.
    pub async fn handle_request(
        &self,
        request: McpRequest,
        session_id: &str,
        values: &RequestValues,
    ) -> Option<McpResponse> {
        if request.is_notification() {
            debug!(method = %request.method, "Received notification");
            return None;
        }

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.id, request.params.as_ref()),
            "ping" => McpResponse::success(request.id, serde_json::json!({})),
            "tools/list" => self.handle_tools_list(request.id).await,
            "tools/call" => {
                let context = self.context(session_id, values.clone());
                self.handle_tools_call(request.id, request.params, &context)
                    .await
            }
            _ => McpResponse::error(request.id, McpError::method_not_found(&request.method)),
        };
        Some(response)
    }

    fn handle_initialize(&self, id: RequestId, params: Option<&serde_json::Value>) -> McpResponse {
        let requested = params
            .and_then(|p| p.get("protocolVersion"))
            .and_then(|v| v.as_str());

        McpResponse::success(
            id,
            serde_json::json!({
                "protocolVersion": negotiate_protocol_version(requested),
                "capabilities": self.capabilities,
                "serverInfo": self.info
            }),
        )
    }

    async fn handle_tools_list(&self, id: RequestId) -> McpResponse {
        let tools = self.list_tools().await;
        McpResponse::success(id, serde_json::json!({ "tools": tools }))
    }

    async fn handle_tools_call(
        &self,
        id: RequestId,
        params: Option<serde_json::Value>,
        context: &ToolContext,
    ) -> McpResponse {
        let params = match params {
            Some(p) => p,
            None => return McpResponse::error(id, McpError::invalid_params("Missing params")),
        };

        let call: ToolCall = match serde_json::from_value(params) {
            Ok(c) => c,
            Err(e) => return McpResponse::error(id, McpError::invalid_params(e.to_string())),
        };

        match self.call_tool(&call.name, call.arguments, context).await {
            Ok(result) => match serde_json::to_value(result) {
                Ok(value) => McpResponse::success(id, value),
                Err(e) => McpResponse::error(id, McpError::internal_error(e.to_string())),
            },
            Err(e) => McpResponse::error(id, e.into()),
        }
    }

    /// Get server info.
    pub fn info(&self) -> &ServerInfo {
        &self.info
    }

    /// Capabilities advertised in `initialize`.
    pub fn capabilities(&self) -> &ServerCapabilities {
        &self.capabilities
    }

    /// Session backends shared by every tool call.
    pub fn backends(&self) -> &Arc<SessionBackends> {
        &self.backends
    }
}

/// Tool backed by a plain closure.
pub struct FunctionTool<F>
where
    F: Fn(serde_json::Value, &ToolContext) -> McpServerResult<ToolResult> + Send + Sync,
{
    definition: ToolDefinition,
    handler: F,
}

impl<F> FunctionTool<F>
where
    F: Fn(serde_json::Value, &ToolContext) -> McpServerResult<ToolResult> + Send + Sync,
{
    /// Wrap a synchronous handler.
    pub fn new(definition: ToolDefinition, handler: F) -> Self {
        Self {
            definition,
            handler,
        }
    }
}

#[async_trait]
impl<F> Tool for FunctionTool<F>
where
    F: Fn(serde_json::Value, &ToolContext) -> McpServerResult<ToolResult> + Send + Sync,
{
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        (self.handler)(args, context)
    }
}
