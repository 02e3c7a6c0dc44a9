//! Server configuration.
//!
//! Settings come from the command line first, then the environment, then
//! built-in defaults. `clap` handles the first two; [`Cli::into_config`]
//! validates the result into a [`ServerConfig`].

use crate::middleware::{CorsConfig, CorsMode};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

/// Default bind host for the HTTP transport.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default bind port for the HTTP transport.
pub const DEFAULT_PORT: u16 = 8080;

/// Default MCP endpoint path.
pub const DEFAULT_ENDPOINT: &str = "/mcp";

/// Invalid configuration. Fatal at startup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// CORS mode is not one of `disabled`, `development`, `strict`.
    #[error("invalid CORS mode '{0}' (expected disabled, development or strict)")]
    InvalidCorsMode(String),

    /// Transport mode is not one of `stdio`, `http`, `streamable-http`.
    #[error("invalid transport mode '{0}' (expected stdio or streamable-http)")]
    InvalidTransportMode(String),

    /// Bind host is empty.
    #[error("invalid bind address '{0}'")]
    InvalidAddress(String),
}

/// Which front end serves the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportMode {
    /// Newline-delimited JSON-RPC on stdin/stdout.
    #[default]
    Stdio,
    /// Streamable HTTP listener.
    StreamableHttp,
}

impl FromStr for TransportMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stdio" => Ok(Self::Stdio),
            "http" | "streamable-http" => Ok(Self::StreamableHttp),
            _ => Err(ConfigError::InvalidTransportMode(s.to_string())),
        }
    }
}

impl TransportMode {
    /// Mode selected by `TRANSPORT_MODE` when no subcommand is given.
    ///
    /// Unrecognised values select stdio.
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value.map(str::parse::<Self>) {
            Some(Ok(mode)) => mode,
            Some(Err(e)) => {
                warn!(error = %e, "Falling back to stdio transport");
                Self::Stdio
            }
            None => Self::Stdio,
        }
    }
}

/// HTTP transport settings.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Bind host
    pub host: String,
    /// Bind port
    pub port: u16,
    /// MCP endpoint path, normalised
    pub endpoint: String,
    /// CORS policy
    pub cors: CorsConfig,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            cors: CorsConfig::default(),
        }
    }
}

impl HttpConfig {
    /// `host:port` for logging.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Complete server configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    /// Selected transport
    pub transport: TransportMode,
    /// HTTP settings (ignored for stdio)
    pub http: HttpConfig,
    /// Log level name
    pub log_level: String,
    /// Log file; stderr when absent
    pub log_file: Option<PathBuf>,
}

/// Command line of `zabbix-mcp-server`.
#[derive(Parser, Debug, Clone)]
#[command(name = "zabbix-mcp-server")]
#[command(version, about = "Expose the Zabbix API as MCP tools over stdio or streamable HTTP")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true, env = "LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Log level (debug, info, warn, error)
    #[arg(long, global = true, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// HTTP bind host
    #[arg(long, global = true, env = "TRANSPORT_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// HTTP bind port
    #[arg(long, global = true, env = "TRANSPORT_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// MCP endpoint path
    #[arg(long, global = true, env = "MCP_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// CORS mode (disabled, development, strict)
    #[arg(long, global = true, env = "MCP_CORS_MODE", default_value = "strict")]
    pub cors_mode: String,

    /// Comma-separated origins allowed in strict CORS mode
    #[arg(long, global = true, env = "MCP_ALLOWED_ORIGINS", default_value = "")]
    pub allowed_origins: String,

    /// Transport used when no subcommand is given
    #[arg(long, hide = true, env = "TRANSPORT_MODE")]
    pub transport_mode: Option<String>,
}

/// Transport subcommands.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Serve MCP over stdin/stdout (default)
    Stdio,
    /// Serve MCP over streamable HTTP
    StreamableHttp,
    /// Deprecated alias of `streamable-http`
    #[command(hide = true)]
    Http,
}

impl Cli {
    /// Whether the deprecated `http` subcommand was used.
    pub fn uses_deprecated_alias(&self) -> bool {
        self.command == Some(Command::Http)
    }

    /// Validate into a [`ServerConfig`].
    pub fn into_config(self) -> Result<ServerConfig, ConfigError> {
        let transport = match self.command {
            Some(Command::Stdio) => TransportMode::Stdio,
            Some(Command::StreamableHttp | Command::Http) => TransportMode::StreamableHttp,
            None => TransportMode::from_env_value(self.transport_mode.as_deref()),
        };

        let host = self.host.trim().to_string();
        if host.is_empty() {
            return Err(ConfigError::InvalidAddress(self.host));
        }

        let cors = CorsConfig::new(
            self.cors_mode.parse::<CorsMode>()?,
            CorsConfig::parse_origins(&self.allowed_origins),
        );

        Ok(ServerConfig {
            transport,
            http: HttpConfig {
                host,
                port: self.port,
                endpoint: normalize_endpoint(&self.endpoint),
                cors,
            },
            log_level: self.log_level,
            log_file: self.log_file,
        })
    }
}

/// Clean an endpoint path: force a leading `/`, drop empty and `.`
/// segments, resolve `..`, strip the trailing `/`.
pub fn normalize_endpoint(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    format!("/{}", segments.join("/"))
}
