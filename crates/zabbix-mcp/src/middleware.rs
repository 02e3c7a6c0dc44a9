//! HTTP middleware pipeline.
//!
//! Layers, outermost first:
//!
//! 1. [`log_requests`] records method, path and remote address
//! 2. [`inject_request_values`] copies the Zabbix URL/token headers and the
//!    `ZABBIX_URL` query parameter into request extensions
//! 3. [`apply_cors`] adds CORS headers and answers preflight requests
//!
//! The endpoint handler reads the injected [`RequestValues`] back out of the
//! request extensions and hands them to credential resolution.

use crate::config::ConfigError;
use axum::{
    body::Body,
    extract::{ConnectInfo, Query, State},
    http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode},
    middleware::{from_fn, from_fn_with_state, Next},
    response::{IntoResponse, Response},
    Router,
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;
use zabbix_client::RequestValues;

/// Header carrying the Zabbix API URL.
pub const HEADER_ZABBIX_URL: &str = "x-zabbix-url";

/// Header carrying the Zabbix API token.
pub const HEADER_ZABBIX_TOKEN: &str = "x-zabbix-token";

/// Query parameter carrying the Zabbix API URL.
pub const QUERY_ZABBIX_URL: &str = "ZABBIX_URL";

/// Session header of the streamable HTTP transport.
pub const HEADER_MCP_SESSION_ID: &str = "mcp-session-id";

const ALLOW_METHODS: &str = "GET, POST, DELETE, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Authorization, X-Zabbix-Token, X-Zabbix-URL, Mcp-Session-Id";
const EXPOSE_HEADERS: &str = "Mcp-Session-Id";

/// CORS behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorsMode {
    /// No CORS headers.
    Disabled,
    /// Any origin is echoed back.
    Development,
    /// Only allow-listed origins are echoed back.
    #[default]
    Strict,
}

impl FromStr for CorsMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disabled" => Ok(Self::Disabled),
            "development" => Ok(Self::Development),
            "strict" => Ok(Self::Strict),
            _ => Err(ConfigError::InvalidCorsMode(s.to_string())),
        }
    }
}

/// CORS policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorsConfig {
    /// Mode
    pub mode: CorsMode,
    /// Origins accepted in strict mode
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    pub fn new(mode: CorsMode, allowed_origins: Vec<String>) -> Self {
        Self {
            mode,
            allowed_origins,
        }
    }

    /// Split a comma-separated allow-list, trimming and dropping empties.
    pub fn parse_origins(list: &str) -> Vec<String> {
        list.split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Origin to echo in `Access-Control-Allow-Origin`, if any.
    pub fn allowed_origin<'a>(&self, origin: Option<&'a str>) -> Option<&'a str> {
        let origin = origin?;
        match self.mode {
            CorsMode::Disabled => None,
            CorsMode::Development => Some(origin),
            CorsMode::Strict => self
                .allowed_origins
                .iter()
                .any(|allowed| allowed == origin)
                .then_some(origin),
        }
    }
}

/// Wrap the endpoint router with the full middleware stack.
pub fn apply_middleware(router: Router, cors: CorsConfig) -> Router {
    // Last layer added runs first.
    router
        .layer(from_fn_with_state(Arc::new(cors), apply_cors))
        .layer(from_fn(inject_request_values))
        .layer(from_fn(log_requests))
}

/// Add CORS headers; answer `OPTIONS` without calling the handler.
pub async fn apply_cors(
    State(cors): State<Arc<CorsConfig>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .and_then(|origin| cors.allowed_origin(Some(origin)))
        .and_then(|origin| HeaderValue::from_str(origin).ok());

    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::OK.into_response()
    } else {
        next.run(request).await
    };

    if let Some(origin) = origin {
        set_cors_headers(response.headers_mut(), origin);
    }
    response
}

fn set_cors_headers(headers: &mut HeaderMap, origin: HeaderValue) {
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(
        header::ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static(EXPOSE_HEADERS),
    );
}

/// Attach request-scoped Zabbix values to the request.
pub async fn inject_request_values(mut request: Request<Body>, next: Next) -> Response {
    let values = extract_request_values(&request);
    request.extensions_mut().insert(values);
    next.run(request).await
}

/// Read URL/token from headers and query. The query URL wins over the header.
pub fn extract_request_values<B>(request: &Request<B>) -> RequestValues {
    let header_value = |name: &str| {
        request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let query_url = Query::<HashMap<String, String>>::try_from_uri(request.uri())
        .ok()
        .and_then(|Query(mut params)| params.remove(QUERY_ZABBIX_URL))
        .filter(|v| !v.trim().is_empty());

    RequestValues {
        url: query_url.or_else(|| header_value(HEADER_ZABBIX_URL)),
        token: header_value(HEADER_ZABBIX_TOKEN),
    }
}

/// Log each request at debug level.
pub async fn log_requests(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    debug!(%method, %path, %remote, "HTTP request");
    let started = Instant::now();

    let response = next.run(request).await;

    debug!(
        %method,
        %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "HTTP response"
    );
    response
}
