//! `zabbix-mcp-server` entry point.

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};
use zabbix_mcp::config::{Cli, TransportMode};
use zabbix_mcp::{http, logging, stdio, tools, McpServer, SessionBackends, Shutdown};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _guard = logging::init_logging(&cli.log_level, cli.log_file.as_deref())
        .context("failed to initialise logging")?;

    if cli.uses_deprecated_alias() {
        warn!("The 'http' command is deprecated, use 'streamable-http' instead");
    }
    let config = cli.into_config().context("invalid configuration")?;

    let backends = Arc::new(SessionBackends::from_env());
    let server = Arc::new(McpServer::zabbix(backends));
    server.register_tools(tools::all_tools()).await;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        transport = ?config.transport,
        "Starting Zabbix MCP server"
    );

    let shutdown = Shutdown::default();
    shutdown.spawn_signal_handler();

    match config.transport {
        TransportMode::Stdio => stdio::serve_stdio(server, &shutdown).await?,
        TransportMode::StreamableHttp => http::serve(&config.http, server, &shutdown).await?,
    }

    info!("Server shut down gracefully");
    Ok(())
}
