//! Streamable HTTP transport.
//!
//! One endpoint path serves the MCP protocol:
//!
//! - `POST` carries a JSON-RPC message. An `initialize` request opens a
//!   session and returns its id in the `Mcp-Session-Id` header; every other
//!   message must carry that header.
//! - `DELETE` ends the session named by the header.
//! - `GET` is refused; this server never pushes messages.
//!
//! `/health` is served beside the endpoint, outside the middleware stack.

use crate::config::HttpConfig;
use crate::error::{ServerError, ServerResult};
use crate::health;
use crate::middleware::{apply_middleware, CorsConfig, HEADER_MCP_SESSION_ID};
use crate::server::{decode_request, McpServer};
use crate::shutdown::{Shutdown, ShutdownState};
use crate::types::McpResponse;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use dashmap::DashSet;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;
use zabbix_client::RequestValues;

/// Largest accepted request body. Larger bodies get 413.
pub const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// How long aborted connections get to close after the drain deadline.
const FORCE_CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Shared state of the HTTP transport.
pub struct AppState {
    /// Tool-dispatch core
    pub server: Arc<McpServer>,

    /// Ids of open sessions
    pub sessions: DashSet<String>,

    /// Cancelled when the drain deadline passes; in-flight requests stop.
    abort: CancellationToken,
}

impl AppState {
    pub fn new(server: Arc<McpServer>) -> Arc<Self> {
        Arc::new(Self {
            server,
            sessions: DashSet::new(),
            abort: CancellationToken::new(),
        })
    }

    /// End every open session.
    fn close_all(&self) {
        let count = self.sessions.len();
        self.sessions.clear();
        self.server.backends().clear();
        if count > 0 {
            info!(sessions = count, "Closed remaining sessions");
        }
    }

    /// Run request work unless the server is force-closing.
    async fn until_aborted(&self, work: impl Future<Output = Response>) -> Response {
        if self.abort.is_cancelled() {
            return aborted();
        }
        tokio::select! {
            response = work => response,
            () = self.abort.cancelled() => aborted(),
        }
    }
}

/// Response for requests cut off by the drain deadline.
fn aborted() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        [(header::CONNECTION, "close")],
        "Server shutting down",
    )
        .into_response()
}

/// Build the router: MCP endpoint behind the middleware stack, plus `/health`.
///
/// `OPTIONS` on the endpoint is answered by the CORS layer.
pub fn router(state: Arc<AppState>, endpoint: &str, cors: CorsConfig) -> Router {
    let mcp = Router::new()
        .route(
            endpoint,
            post(handle_post).delete(handle_delete).get(handle_get),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state);

    apply_middleware(mcp, cors).route("/health", get(health::health))
}

/// Bind and serve until shutdown.
///
/// A bind failure is returned immediately and is fatal to the caller.
pub async fn serve(config: &HttpConfig, server: Arc<McpServer>, shutdown: &Shutdown) -> ServerResult<()> {
    let addr = config.bind_addr();
    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;

    info!(%addr, endpoint = %config.endpoint, "Starting streamable HTTP server");

    let state = AppState::new(server);
    let app = router(Arc::clone(&state), &config.endpoint, config.cors.clone());
    serve_listener(listener, state, app, shutdown).await
}

/// Serve on a bound listener until shutdown, then drain.
///
/// Shutdown closes the listener at once. In-flight requests get the drain
/// deadline to finish; after that they are answered with 503 and their
/// connections closed. The timeout is logged, not returned. Sessions are
/// cleared only once no request can touch them anymore.
pub async fn serve_listener(
    listener: TcpListener,
    state: Arc<AppState>,
    app: Router,
    shutdown: &Shutdown,
) -> ServerResult<()> {
    let token = shutdown.token().clone();
    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { token.cancelled().await });

    let mut task = tokio::spawn(async move { server.await });
    shutdown.transition(ShutdownState::Running);

    let early = tokio::select! {
        result = &mut task => Some(result),
        () = shutdown.token().cancelled() => None,
    };

    let outcome = match early {
        Some(result) => flatten(result),
        None => {
            shutdown.transition(ShutdownState::Draining);
            match tokio::time::timeout(shutdown.drain_timeout(), &mut task).await {
                Ok(result) => flatten(result),
                Err(_) => {
                    let err = ServerError::DrainTimeout(shutdown.drain_timeout());
                    error!(error = %err, "Forcing remaining connections closed");

                    state.abort.cancel();
                    if tokio::time::timeout(FORCE_CLOSE_GRACE, &mut task).await.is_err() {
                        warn!("Connections still open after forced close, aborting server task");
                        task.abort();
                    }
                    Ok(())
                }
            }
        }
    };

    state.close_all();
    shutdown.transition(ShutdownState::Stopped);
    info!("HTTP server stopped");
    outcome
}

fn flatten(result: Result<std::io::Result<()>, tokio::task::JoinError>) -> ServerResult<()> {
    match result {
        Ok(inner) => inner.map_err(ServerError::Serve),
        Err(join) => Err(ServerError::Serve(std::io::Error::other(join))),
    }
}

fn header_session_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(HEADER_MCP_SESSION_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

fn plain(status: StatusCode, message: &'static str) -> Response {
    (status, message).into_response()
}

async fn handle_post(
    State(state): State<Arc<AppState>>,
    values: Option<Extension<RequestValues>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let values = values.map(|Extension(values)| values).unwrap_or_default();
    state
        .until_aborted(process_post(&state, &headers, &body, &values))
        .await
}

async fn process_post(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
    values: &RequestValues,
) -> Response {
    let message = match decode_request(body) {
        Ok(message) => message,
        Err(response) => return (StatusCode::BAD_REQUEST, Json(response)).into_response(),
    };

    if message.method == "initialize" && !message.is_notification() {
        let session_id = Uuid::now_v7().to_string();
        state.sessions.insert(session_id.clone());
        info!(%session_id, "Opened HTTP session");

        state.server.backends().start_session(&session_id, values).await;
        let response = state
            .server
            .handle_request(message, &session_id, values)
            .await;

        let mut http = json_response(response);
        if let Ok(value) = HeaderValue::from_str(&session_id) {
            http.headers_mut().insert(HEADER_MCP_SESSION_ID, value);
        }
        return http;
    }

    let Some(session_id) = header_session_id(headers) else {
        return plain(StatusCode::BAD_REQUEST, "Missing Mcp-Session-Id header");
    };
    if !state.sessions.contains(session_id) {
        return plain(StatusCode::NOT_FOUND, "Unknown session");
    }

    let response = state
        .server
        .handle_request(message, session_id, values)
        .await;

    // A DELETE may have ended the session while a client was being created.
    if !state.sessions.contains(session_id) {
        warn!(%session_id, "Session ended during request, dropping its client");
        state.server.backends().end_session(session_id);
    }
    json_response(response)
}

fn json_response(response: Option<McpResponse>) -> Response {
    match response {
        Some(response) => (StatusCode::OK, Json(response)).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

async fn handle_delete(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let Some(session_id) = header_session_id(&headers) else {
        return plain(StatusCode::BAD_REQUEST, "Missing Mcp-Session-Id header");
    };

    if state.sessions.remove(session_id).is_none() {
        return plain(StatusCode::NOT_FOUND, "Unknown session");
    }

    state.server.backends().end_session(session_id);
    info!(%session_id, "Closed HTTP session");
    StatusCode::OK.into_response()
}

async fn handle_get() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "POST, DELETE, OPTIONS")],
    )
        .into_response()
}
