//! Stdio transport.
//!
//! Newline-delimited JSON-RPC: one message per line on stdin, one response
//! per line on stdout. The process is a single session for its whole life.

use crate::error::ServerResult;
use crate::server::{decode_request, McpServer};
use crate::shutdown::{Shutdown, ShutdownState};
use crate::types::McpResponse;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info};
use zabbix_client::RequestValues;

/// Session id of the stdio transport.
pub const STDIO_SESSION_ID: &str = "stdio";

/// Serve MCP on the process's stdin and stdout.
pub async fn serve_stdio(server: Arc<McpServer>, shutdown: &Shutdown) -> ServerResult<()> {
    info!("Starting stdio server");
    serve_io(server, tokio::io::stdin(), tokio::io::stdout(), shutdown).await
}

/// Serve MCP over any line-oriented byte stream until EOF or shutdown.
///
/// The session-start hook runs before the first read and the session-end
/// hook after the last, regardless of how the loop ends.
pub async fn serve_io<R, W>(
    server: Arc<McpServer>,
    reader: R,
    mut writer: W,
    shutdown: &Shutdown,
) -> ServerResult<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    // Stdio sessions resolve from the environment only.
    let values = RequestValues::new();
    let backends = Arc::clone(server.backends());
    backends.start_session(STDIO_SESSION_ID, &values).await;

    let mut lines = BufReader::new(reader).lines();
    let result = loop {
        let line = tokio::select! {
            line = lines.next_line() => line,
            () = shutdown.token().cancelled() => break Ok(()),
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => {
                debug!("Stdin closed");
                break Ok(());
            }
            Err(e) => break Err(e.into()),
        };
        if line.trim().is_empty() {
            continue;
        }

        let response = match decode_request(line.as_bytes()) {
            Ok(request) => {
                server
                    .handle_request(request, STDIO_SESSION_ID, &values)
                    .await
            }
            Err(response) => Some(response),
        };

        if let Some(response) = response {
            if let Err(e) = write_message(&mut writer, &response).await {
                break Err(e);
            }
        }
    };

    backends.end_session(STDIO_SESSION_ID);
    shutdown.transition(ShutdownState::Stopped);
    result
}

async fn write_message<W>(writer: &mut W, response: &McpResponse) -> ServerResult<()>
where
    W: AsyncWrite + Unpin,
{
    let mut line = serde_json::to_vec(response).map_err(std::io::Error::from)?;
    line.push(b'\n');
    writer.write_all(&line).await?;
    writer.flush().await?;
    Ok(())
}
