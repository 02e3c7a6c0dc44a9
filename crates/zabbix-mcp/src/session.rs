//! Session-scoped Zabbix clients.
//!
//! Every MCP session (one stdio process, or one `Mcp-Session-Id` over HTTP)
//! talks to its own Zabbix deployment. This module maps session ids to
//! [`ZabbixClient`]s and owns the create-on-start / create-on-demand /
//! remove-on-end lifecycle around that map.
//!
//! The map is behind the [`SessionStore`] trait so a bounded store
//! ([`LruSessionRegistry`]) can replace the default unbounded one
//! ([`SessionRegistry`]) without touching callers.

use dashmap::DashMap;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};
use zabbix_client::{
    resolve, resolve_url, BackendDefaults, ClientConfig, CredentialError, RequestValues,
    ZabbixClient, ZabbixError,
};

/// Errors raised while obtaining a session's client.
#[derive(Debug, Error)]
pub enum SessionError {
    /// URL or token could not be resolved.
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// Client construction or the login exchange failed.
    #[error(transparent)]
    Client(#[from] ZabbixError),
}

/// Concurrent map from session id to Zabbix client.
///
/// Implementations synchronise internally; callers never lock. A stored
/// client is inserted fully built, so `get` never observes a partial entry.
pub trait SessionStore: Send + Sync {
    /// Store or overwrite the client for a session.
    fn put(&self, session_id: &str, client: Arc<ZabbixClient>);

    /// Look up the client for a session.
    fn get(&self, session_id: &str) -> Option<Arc<ZabbixClient>>;

    /// Remove the client for a session. Removing an unknown id is a no-op.
    fn remove(&self, session_id: &str);

    /// Number of stored clients.
    fn len(&self) -> usize;

    /// Whether no client is stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every client.
    fn clear(&self);
}

/// Unbounded session store.
#[derive(Default)]
pub struct SessionRegistry {
    clients: DashMap<String, Arc<ZabbixClient>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for SessionRegistry {
    fn put(&self, session_id: &str, client: Arc<ZabbixClient>) {
        self.clients.insert(session_id.to_string(), client);
    }

    fn get(&self, session_id: &str) -> Option<Arc<ZabbixClient>> {
        self.clients.get(session_id).map(|entry| Arc::clone(entry.value()))
    }

    fn remove(&self, session_id: &str) {
        self.clients.remove(session_id);
    }

    fn len(&self) -> usize {
        self.clients.len()
    }

    fn clear(&self) {
        self.clients.clear();
    }
}

/// Bounded session store that evicts the least recently used client.
pub struct LruSessionRegistry {
    clients: Mutex<LruCache<String, Arc<ZabbixClient>>>,
    capacity: NonZeroUsize,
}

impl LruSessionRegistry {
    /// Create a store holding at most `capacity` clients (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            clients: Mutex::new(LruCache::new(capacity)),
            capacity,
        }
    }

    /// Maximum number of stored clients.
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }
}

impl SessionStore for LruSessionRegistry {
    fn put(&self, session_id: &str, client: Arc<ZabbixClient>) {
        let evicted = self.clients.lock().push(session_id.to_string(), client);
        if let Some((evicted_id, _)) = evicted {
            if evicted_id != session_id {
                debug!(session_id = %evicted_id, "Evicted least recently used Zabbix client");
            }
        }
    }

    fn get(&self, session_id: &str) -> Option<Arc<ZabbixClient>> {
        self.clients.lock().get(session_id).cloned()
    }

    fn remove(&self, session_id: &str) {
        self.clients.lock().pop(session_id);
    }

    fn len(&self) -> usize {
        self.clients.lock().len()
    }

    fn clear(&self) {
        self.clients.lock().clear();
    }
}

/// Session lifecycle around a [`SessionStore`].
///
/// Resolves URL and token for new sessions, creates clients eagerly at
/// session start or lazily on first use, and drops them at session end.
pub struct SessionBackends {
    store: Arc<dyn SessionStore>,
    defaults: BackendDefaults,
}

impl SessionBackends {
    /// Create a lifecycle manager over a store.
    pub fn new(store: Arc<dyn SessionStore>, defaults: BackendDefaults) -> Self {
        Self { store, defaults }
    }

    /// Unbounded registry with defaults from the environment.
    pub fn from_env() -> Self {
        Self::new(Arc::new(SessionRegistry::new()), BackendDefaults::from_env())
    }

    /// Underlying store.
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Environment defaults used for resolution.
    pub fn defaults(&self) -> &BackendDefaults {
        &self.defaults
    }

    /// Session-start hook: try to create the session's client now.
    ///
    /// Failure is logged and swallowed; a later call carrying a token in its
    /// request values retries through [`client_for`](Self::client_for).
    #[instrument(skip(self, values))]
    pub async fn start_session(&self, session_id: &str, values: &RequestValues) {
        if let Err(e) = self.create(session_id, values).await {
            error!(error = %e, "Failed to create Zabbix client for new session");
        }
    }

    /// Client for a session, created from `values` if none exists yet.
    #[instrument(skip(self, values))]
    pub async fn client_for(
        &self,
        session_id: &str,
        values: &RequestValues,
    ) -> Result<Arc<ZabbixClient>, SessionError> {
        if let Some(client) = self.store.get(session_id) {
            return Ok(client);
        }

        warn!("Zabbix client not found, creating a new one");
        self.create(session_id, values).await
    }

    /// Session-end hook: drop the session's client.
    pub fn end_session(&self, session_id: &str) {
        self.store.remove(session_id);
        info!(session_id, "Cleaned up Zabbix client for session");
    }

    /// Drop every client.
    pub fn clear(&self) {
        self.store.clear();
    }

    async fn create(
        &self,
        session_id: &str,
        values: &RequestValues,
    ) -> Result<Arc<ZabbixClient>, SessionError> {
        let config = match resolve(values, &self.defaults) {
            Ok(config) => config,
            Err(CredentialError::MissingCredential) if self.defaults.has_login() => {
                self.login(values).await?
            }
            Err(e) => return Err(e.into()),
        };

        let client = Arc::new(ZabbixClient::new(config)?);
        self.store.put(session_id, Arc::clone(&client));

        info!(session_id, zabbix_url = client.url(), "Created Zabbix client for session");
        Ok(client)
    }

    /// Obtain a token through `user.login` with the configured user/password.
    async fn login(&self, values: &RequestValues) -> Result<ClientConfig, SessionError> {
        let (Some(username), Some(password)) =
            (self.defaults.username.as_deref(), self.defaults.password.as_deref())
        else {
            return Err(CredentialError::MissingCredential.into());
        };

        let config = ClientConfig::new(resolve_url(values, &self.defaults))
            .with_skip_tls_verify(self.defaults.skip_tls_verify);

        debug!(zabbix_url = %config.url, username, "No token configured, logging in");
        let token = ZabbixClient::new(config.clone())?
            .login(username, password)
            .await?;

        Ok(config.with_token(token))
    }
}
