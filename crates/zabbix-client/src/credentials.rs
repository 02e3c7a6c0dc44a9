//! Backend URL and credential resolution.
//!
//! A session's backend connection is computed from two sources, first match
//! wins per field:
//!
//! 1. Request-scoped values attached by the HTTP middleware (headers or the
//!    `ZABBIX_URL` query parameter).
//! 2. Process-wide defaults loaded from the environment.
//!
//! The URL falls back to [`DEFAULT_ZABBIX_URL`]. There is no fallback for the
//! token: resolution fails with [`CredentialError::MissingCredential`].

use crate::error::CredentialError;
use std::fmt;

/// URL used when neither the request nor the environment provides one.
pub const DEFAULT_ZABBIX_URL: &str = "http://127.0.0.1/api_jsonrpc.php";

/// Environment variable holding the default API URL.
pub const ENV_ZABBIX_URL: &str = "ZABBIX_URL";
/// Environment variable holding the default API token.
pub const ENV_ZABBIX_TOKEN: &str = "ZABBIX_TOKEN";
/// Environment variable holding the login user name.
pub const ENV_ZABBIX_USER: &str = "ZABBIX_USER";
/// Environment variable holding the login password.
pub const ENV_ZABBIX_PASSWORD: &str = "ZABBIX_PASSWORD";
/// Environment variable disabling TLS certificate verification.
pub const ENV_ZABBIX_SKIP_VERIFY: &str = "ZABBIX_SKIP_VERIFY";

/// Values attached to a single inbound request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestValues {
    /// Backend URL override.
    pub url: Option<String>,

    /// Bearer token override.
    pub token: Option<String>,
}

impl RequestValues {
    /// Create an empty value set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the URL override.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the token override.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Whether no value is set.
    pub fn is_empty(&self) -> bool {
        self.url.is_none() && self.token.is_none()
    }
}

/// Process-wide defaults read from the environment.
#[derive(Clone, Default)]
pub struct BackendDefaults {
    /// Default API URL.
    pub url: Option<String>,

    /// Default API token.
    pub token: Option<String>,

    /// User name for the `user.login` exchange.
    pub username: Option<String>,

    /// Password for the `user.login` exchange.
    pub password: Option<String>,

    /// Skip TLS certificate verification.
    pub skip_tls_verify: bool,
}

impl BackendDefaults {
    /// Load defaults from environment variables.
    ///
    /// Environment variables:
    /// - `ZABBIX_URL`: API URL (default: http://127.0.0.1/api_jsonrpc.php)
    /// - `ZABBIX_TOKEN`: API token
    /// - `ZABBIX_USER` / `ZABBIX_PASSWORD`: login credentials
    /// - `ZABBIX_SKIP_VERIFY`: `true` or `1` disables certificate checks
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load defaults through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            url: non_empty(lookup(ENV_ZABBIX_URL)),
            token: non_empty(lookup(ENV_ZABBIX_TOKEN)),
            username: non_empty(lookup(ENV_ZABBIX_USER)),
            password: non_empty(lookup(ENV_ZABBIX_PASSWORD)),
            skip_tls_verify: lookup(ENV_ZABBIX_SKIP_VERIFY)
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
        }
    }

    /// Whether a username/password pair is configured.
    pub fn has_login(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }
}

impl fmt::Debug for BackendDefaults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendDefaults")
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("skip_tls_verify", &self.skip_tls_verify)
            .finish()
    }
}

/// Resolved connection settings for one backend client.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API endpoint URL.
    pub url: String,

    /// Bearer token sent with every call.
    pub token: Option<String>,

    /// Skip TLS certificate verification.
    pub skip_tls_verify: bool,
}

impl ClientConfig {
    /// Create settings for a URL with no token and TLS verification on.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: None,
            skip_tls_verify: false,
        }
    }

    /// Set the bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the TLS verification policy.
    pub fn with_skip_tls_verify(mut self, skip: bool) -> Self {
        self.skip_tls_verify = skip;
        self
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("skip_tls_verify", &self.skip_tls_verify)
            .finish()
    }
}

/// Resolve the URL only. Never fails.
pub fn resolve_url(values: &RequestValues, defaults: &BackendDefaults) -> String {
    first_non_empty(values.url.as_deref(), defaults.url.as_deref())
        .unwrap_or(DEFAULT_ZABBIX_URL)
        .to_string()
}

/// Resolve the full client configuration for a session.
///
/// Returns [`CredentialError::MissingCredential`] when no token is available
/// from either source; no client should be created in that case.
pub fn resolve(
    values: &RequestValues,
    defaults: &BackendDefaults,
) -> Result<ClientConfig, CredentialError> {
    let url = resolve_url(values, defaults);
    validate_url(&url)?;

    let token = first_non_empty(values.token.as_deref(), defaults.token.as_deref())
        .ok_or(CredentialError::MissingCredential)?;

    Ok(ClientConfig::new(url)
        .with_token(token)
        .with_skip_tls_verify(defaults.skip_tls_verify))
}

fn validate_url(url: &str) -> Result<(), CredentialError> {
    let lower = url.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Ok(())
    } else {
        Err(CredentialError::InvalidUrl(url.to_string()))
    }
}

fn first_non_empty<'a>(primary: Option<&'a str>, fallback: Option<&'a str>) -> Option<&'a str> {
    primary
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| fallback.map(str::trim).filter(|s| !s.is_empty()))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_flag(value: &str) -> bool {
    let value = value.trim();
    value == "1" || value.eq_ignore_ascii_case("true")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn defaults(pairs: &[(&str, &str)]) -> BackendDefaults {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BackendDefaults::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_header_url_wins_over_env() {
        let env = defaults(&[
            (ENV_ZABBIX_URL, "https://env.example/api_jsonrpc.php"),
            (ENV_ZABBIX_TOKEN, "env-token"),
        ]);
        let values = RequestValues::new().with_url("https://header.example/api_jsonrpc.php");

        let config = resolve(&values, &env).unwrap();
        assert_eq!(config.url, "https://header.example/api_jsonrpc.php");
        assert_eq!(config.token.as_deref(), Some("env-token"));
    }

    #[test]
    fn test_env_url_used_without_header() {
        let env = defaults(&[
            (ENV_ZABBIX_URL, "https://env.example/api_jsonrpc.php"),
            (ENV_ZABBIX_TOKEN, "env-token"),
        ]);
        let config = resolve(&RequestValues::new(), &env).unwrap();
        assert_eq!(config.url, "https://env.example/api_jsonrpc.php");
    }

    #[test]
    fn test_hardcoded_url_fallback() {
        let env = defaults(&[(ENV_ZABBIX_TOKEN, "env-token")]);
        let config = resolve(&RequestValues::new(), &env).unwrap();
        assert_eq!(config.url, DEFAULT_ZABBIX_URL);
    }

    #[test]
    fn test_request_token_wins_over_env() {
        let env = defaults(&[(ENV_ZABBIX_TOKEN, "env-token")]);
        let values = RequestValues::new().with_token("header-token");
        let config = resolve(&values, &env).unwrap();
        assert_eq!(config.token.as_deref(), Some("header-token"));
    }

    #[test]
    fn test_missing_credential_fails() {
        let env = defaults(&[(ENV_ZABBIX_URL, "https://env.example/api_jsonrpc.php")]);
        let err = resolve(&RequestValues::new(), &env).unwrap_err();
        assert_eq!(err, CredentialError::MissingCredential);

        // Blank values count as absent.
        let values = RequestValues::new().with_token("   ");
        assert_eq!(
            resolve(&values, &env).unwrap_err(),
            CredentialError::MissingCredential
        );
    }

    #[test]
    fn test_login_pair_does_not_satisfy_resolution() {
        let env = defaults(&[(ENV_ZABBIX_USER, "Admin"), (ENV_ZABBIX_PASSWORD, "zabbix")]);
        assert!(env.has_login());
        assert_eq!(
            resolve(&RequestValues::new(), &env).unwrap_err(),
            CredentialError::MissingCredential
        );
    }

    #[test]
    fn test_invalid_url_rejected() {
        let env = defaults(&[(ENV_ZABBIX_TOKEN, "t")]);
        let values = RequestValues::new().with_url("ftp://zabbix.local");
        assert!(matches!(
            resolve(&values, &env),
            Err(CredentialError::InvalidUrl(_))
        ));

        let env = defaults(&[(ENV_ZABBIX_URL, "zabbix.local/api_jsonrpc.php"), (ENV_ZABBIX_TOKEN, "t")]);
        assert_eq!(
            resolve(&RequestValues::new(), &env).unwrap_err(),
            CredentialError::InvalidUrl("zabbix.local/api_jsonrpc.php".to_string())
        );
    }

    #[test]
    fn test_blank_header_url_falls_through() {
        let env = defaults(&[(ENV_ZABBIX_TOKEN, "t")]);
        let values = RequestValues::new().with_url("   ");
        let config = resolve(&values, &env).unwrap();
        assert_eq!(config.url, DEFAULT_ZABBIX_URL);
    }

    #[test]
    fn test_skip_verify_flag() {
        for (raw, expected) in [("true", true), ("1", true), ("TRUE", true), ("false", false), ("yes", false)] {
            let env = defaults(&[(ENV_ZABBIX_TOKEN, "t"), (ENV_ZABBIX_SKIP_VERIFY, raw)]);
            let config = resolve(&RequestValues::new(), &env).unwrap();
            assert_eq!(config.skip_tls_verify, expected, "value {raw:?}");
        }

        let env = defaults(&[(ENV_ZABBIX_TOKEN, "t")]);
        assert!(!resolve(&RequestValues::new(), &env).unwrap().skip_tls_verify);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = ClientConfig::new(DEFAULT_ZABBIX_URL).with_token("secret-token");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("secret-token"));

        let env = defaults(&[(ENV_ZABBIX_PASSWORD, "hunter2")]);
        assert!(!format!("{env:?}").contains("hunter2"));
    }
}
