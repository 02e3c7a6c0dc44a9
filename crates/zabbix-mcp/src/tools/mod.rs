//! Zabbix MCP tools
//!
//! Every tool here is an [`ApiTool`]: a typed argument struct decoded from
//! the call arguments, mapped onto the parameters of one Zabbix API method.
//! The only hand-written RPC path is [`ToolContext::invoke`].

pub mod events;
pub mod hostgroups;
pub mod hosts;
pub mod problems;
pub mod triggers;

pub use events::AcknowledgeEvent;
pub use hostgroups::GetHostGroups;
pub use hosts::GetHosts;
pub use problems::GetProblems;
pub use triggers::GetTriggers;

use crate::server::{InvokeError, McpServerError, McpServerResult, Tool, ToolContext};
use crate::types::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, error, instrument};

/// Result limit applied when a call does not set one.
pub const DEFAULT_LIMIT: u64 = 100;

/// A Zabbix API method exposed as an MCP tool.
pub trait ApiCall: DeserializeOwned + Send + Sync + 'static {
    /// Tool name
    const NAME: &'static str;

    /// Tool description
    const DESCRIPTION: &'static str;

    /// Backend method, such as `host.get`
    const METHOD: &'static str;

    /// Prefix of the error text when the backend call fails
    const FAILURE: &'static str;

    /// JSON schema of the arguments.
    fn schema() -> serde_json::Value;

    /// Annotations; read-only unless overridden.
    fn annotate(definition: ToolDefinition) -> ToolDefinition {
        definition.idempotent()
    }

    /// Backend parameters for this call, or a message explaining why the
    /// arguments are unusable.
    fn into_params(self) -> Result<serde_json::Value, String>;

    /// Shape the backend result for the caller.
    fn render(_params: &serde_json::Value, result: serde_json::Value) -> serde_json::Value {
        result
    }
}

/// Tool adapter for any [`ApiCall`].
pub struct ApiTool<A> {
    _call: PhantomData<fn() -> A>,
}

impl<A: ApiCall> ApiTool<A> {
    pub fn new() -> Self {
        Self { _call: PhantomData }
    }

    /// Boxed for registration.
    pub fn shared() -> Arc<dyn Tool> {
        Arc::new(Self::new())
    }
}

impl<A: ApiCall> Default for ApiTool<A> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<A: ApiCall> Tool for ApiTool<A> {
    fn definition(&self) -> ToolDefinition {
        A::annotate(ToolDefinition::new(A::NAME, A::DESCRIPTION).with_schema(A::schema()))
    }

    #[instrument(skip(self, args, context), fields(tool = A::NAME, session_id = %context.session_id))]
    async fn execute(&self, args: serde_json::Value, context: &ToolContext) -> McpServerResult<ToolResult> {
        let args = if args.is_null() {
            serde_json::json!({})
        } else {
            args
        };
        let call: A =
            serde_json::from_value(args).map_err(|e| McpServerError::InvalidParams(e.to_string()))?;

        let params = match call.into_params() {
            Ok(params) => params,
            Err(message) => return Ok(ToolResult::error(message)),
        };

        match context.invoke(A::METHOD, &params).await {
            Ok(result) => {
                debug!(method = A::METHOD, "Zabbix call succeeded");
                Ok(ToolResult::json(A::render(&params, result)))
            }
            Err(e @ InvokeError::Client(_)) => {
                error!(error = %e, "Failed to get Zabbix client");
                Ok(ToolResult::error(e.to_string()))
            }
            Err(InvokeError::Call(e)) => {
                error!(error = %e, method = A::METHOD, "{}", A::FAILURE);
                Ok(ToolResult::error(format!("{}: {}", A::FAILURE, e)))
            }
        }
    }
}

/// Split a comma-separated id list, trimming and dropping empties.
pub fn split_ids(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a comma-separated severity list, keeping values in `0..=5`.
pub fn parse_severities(list: &str) -> Vec<u8> {
    list.split(',')
        .filter_map(|s| s.trim().parse::<u8>().ok())
        .filter(|severity| *severity <= 5)
        .collect()
}

/// Positive `limit` argument, or [`DEFAULT_LIMIT`].
pub fn limit_or_default(limit: Option<f64>) -> u64 {
    match limit {
        Some(limit) if limit >= 1.0 => limit as u64,
        _ => DEFAULT_LIMIT,
    }
}

/// Optional comma-separated argument as an id list.
pub(crate) fn ids(list: Option<&str>) -> Vec<String> {
    list.map(split_ids).unwrap_or_default()
}

/// Get all available MCP tools.
pub fn all_tools() -> Vec<Arc<dyn Tool>> {
    vec![
        ApiTool::<GetHosts>::shared(),
        ApiTool::<GetHostGroups>::shared(),
        ApiTool::<GetTriggers>::shared(),
        ApiTool::<GetProblems>::shared(),
        ApiTool::<AcknowledgeEvent>::shared(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_ids() {
        assert_eq!(split_ids("10084, 10085 ,,10086"), vec!["10084", "10085", "10086"]);
        assert!(split_ids(" , ").is_empty());
    }

    #[test]
    fn test_parse_severities() {
        assert_eq!(parse_severities("0, 3,5"), vec![0, 3, 5]);
        assert_eq!(parse_severities("6,-1,x,4"), vec![4]);
    }

    #[test]
    fn test_limit_or_default() {
        assert_eq!(limit_or_default(None), 100);
        assert_eq!(limit_or_default(Some(0.0)), 100);
        assert_eq!(limit_or_default(Some(-5.0)), 100);
        assert_eq!(limit_or_default(Some(25.0)), 25);
    }

    #[test]
    fn test_all_tools_unique_names() {
        let tools = all_tools();
        let mut names = std::collections::HashSet::new();

        for tool in &tools {
            let def = tool.definition();
            assert!(names.insert(def.name.clone()), "Duplicate tool name: {}", def.name);
            assert_eq!(def.input_schema["type"], "object");
        }
        assert_eq!(names.len(), 5);
    }

    #[test]
    fn test_annotations() {
        let hosts = ApiTool::<GetHosts>::new().definition();
        assert_eq!(hosts.annotations.unwrap().idempotent_hint, Some(true));

        let ack = ApiTool::<AcknowledgeEvent>::new().definition();
        assert_eq!(ack.annotations.unwrap().destructive_hint, Some(true));
    }
}
