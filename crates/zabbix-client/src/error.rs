//! Error types for Zabbix API calls and credential resolution.

use thiserror::Error;

/// Errors returned by [`ZabbixClient::invoke`](crate::ZabbixClient::invoke).
///
/// Variants follow the failure taxonomy of a JSON-RPC exchange: the request
/// never reached the server, the server answered with something that is not
/// a JSON-RPC response, or the server answered with an error object.
#[derive(Debug, Error)]
pub enum ZabbixError {
    /// Network, TLS or body-read failure talking to the API.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body is not a valid JSON-RPC response.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The API returned an error object.
    ///
    /// Code, message and data are kept exactly as the server sent them.
    #[error("Zabbix API error {code}: {message} - {data}")]
    Api {
        /// JSON-RPC error code (e.g. `-32500`).
        code: i64,
        /// Error message.
        message: String,
        /// Auxiliary detail string.
        data: String,
    },

    /// Request parameters could not be encoded.
    #[error("Failed to encode request: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ZabbixError {
    /// Whether this error was reported by the API itself.
    pub fn is_api_error(&self) -> bool {
        matches!(self, ZabbixError::Api { .. })
    }

    /// The API error code, if any.
    pub fn api_code(&self) -> Option<i64> {
        match self {
            ZabbixError::Api { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Errors produced while resolving a backend URL and credential.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    /// No token was supplied by the request or the environment.
    #[error("zabbix token not provided for session")]
    MissingCredential,

    /// The resolved backend URL is unusable.
    #[error("Invalid Zabbix URL: {0:?}")]
    InvalidUrl(String),
}

/// Result type for Zabbix API calls.
pub type ZabbixResult<T> = Result<T, ZabbixError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display_keeps_fields() {
        let err = ZabbixError::Api {
            code: -32500,
            message: "Application error.".to_string(),
            data: "No permissions".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Zabbix API error -32500: Application error. - No permissions"
        );
        assert!(err.is_api_error());
        assert_eq!(err.api_code(), Some(-32500));
    }

    #[test]
    fn test_protocol_error_has_no_code() {
        let err = ZabbixError::Protocol("bad body".to_string());
        assert!(!err.is_api_error());
        assert_eq!(err.api_code(), None);
    }
}
