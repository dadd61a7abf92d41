//! Session context: the single owner of the persisted bearer token
//!
//! Consumers subscribe to [`SessionEvent`]s instead of polling storage. The
//! API client writes through this context on refresh and invalidation, and the
//! login/logout flows write through it on explicit user actions.

use crate::auth::{self, TokenClaims};
use crate::error::{CoreError, CoreResult};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;

/// Storage key for the bearer token
pub const TOKEN_KEY: &str = "token";
/// Storage key for the cached user flag
pub const USER_KEY: &str = "user";
/// Storage key for the cached player flag
pub const PLAYER_KEY: &str = "player";

const EVENT_CAPACITY: usize = 16;

/// Changes to the session, broadcast to subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn,
    TokenRefreshed,
    LoggedOut,
    /// The server rejected the session or refresh failed; the user must log in again
    Invalidated { reason: String },
}

/// Persistent key-value storage for session state
pub trait TokenStore: Send + Sync + fmt::Debug {
    fn get(&self, key: &str) -> CoreResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> CoreResult<()>;
    fn remove(&self, key: &str) -> CoreResult<()>;
}

/// Process-local store, used by tests and one-shot tools
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> CoreResult<Option<String>> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> CoreResult<()> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.remove(key);
        Ok(())
    }
}

/// JSON file store, one object of string values
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> CoreResult<HashMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(HashMap::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, values: &HashMap<String, String>) -> CoreResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> CoreResult<Option<String>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut values = self.load()?;
        values.insert(key.to_string(), value.to_string());
        self.save(&values)
    }

    fn remove(&self, key: &str) -> CoreResult<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut values = self.load()?;
        if values.remove(key).is_some() {
            self.save(&values)?;
        }
        Ok(())
    }
}

/// Shared handle to the current session
#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    store: Box<dyn TokenStore>,
    events: broadcast::Sender<SessionEvent>,
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("store", &self.inner.store)
            .field("subscribers", &self.inner.events.receiver_count())
            .finish()
    }
}

impl SessionContext {
    /// Create a context over the given store
    pub fn new(store: impl TokenStore + 'static) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(SessionInner {
                store: Box::new(store),
                events,
            }),
        }
    }

    /// Create a context backed by process memory
    pub fn in_memory() -> Self {
        Self::new(MemoryTokenStore::new())
    }

    /// Subscribe to session changes
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Current bearer token, if any.
    ///
    /// A store that cannot be read is treated as holding no token.
    pub fn token(&self) -> Option<String> {
        match self.inner.store.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!("Failed to read session token: {e}");
                None
            }
        }
    }

    /// Claims of the current token
    pub fn claims(&self) -> Option<TokenClaims> {
        self.token().as_deref().and_then(auth::decode_claims)
    }

    /// Whether a locally unexpired token is present. Advisory only.
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some_and(|t| auth::is_token_valid(&t))
    }

    /// Whether the current token carries the administrator role. Advisory only.
    pub fn is_administrator(&self) -> bool {
        self.token().is_some_and(|t| auth::has_administrator_role(&t))
    }

    /// Store a freshly issued token after login
    pub fn login(&self, token: &str) -> CoreResult<()> {
        if token.is_empty() {
            return Err(CoreError::invalid_value("Token not provided by backend"));
        }
        // Flags of a previous login must not outlive its token
        for key in [USER_KEY, PLAYER_KEY] {
            self.inner.store.remove(key)?;
        }
        self.inner.store.set(TOKEN_KEY, token)?;
        tracing::info!("Session started");
        self.notify(SessionEvent::LoggedIn);
        Ok(())
    }

    /// Replace the token after a successful refresh
    pub fn replace_token(&self, token: &str) -> CoreResult<()> {
        if token.is_empty() {
            return Err(CoreError::invalid_value("Refresh returned an empty token"));
        }
        self.inner.store.set(TOKEN_KEY, token)?;
        tracing::debug!("Session token refreshed");
        self.notify(SessionEvent::TokenRefreshed);
        Ok(())
    }

    /// Drop the token and its user/player flags because the server no longer
    /// accepts it
    pub fn invalidate(&self, reason: impl Into<String>) {
        let reason = reason.into();
        for key in [TOKEN_KEY, USER_KEY, PLAYER_KEY] {
            if let Err(e) = self.inner.store.remove(key) {
                tracing::warn!("Failed to remove invalidated {key}: {e}");
            }
        }
        tracing::warn!("Session invalidated: {reason}");
        self.notify(SessionEvent::Invalidated { reason });
    }

    /// Clear the token and the cached user/player flags
    pub fn logout(&self) -> CoreResult<()> {
        for key in [TOKEN_KEY, USER_KEY, PLAYER_KEY] {
            self.inner.store.remove(key)?;
        }
        tracing::info!("Logged out");
        self.notify(SessionEvent::LoggedOut);
        Ok(())
    }

    pub fn user(&self) -> CoreResult<Option<String>> {
        self.inner.store.get(USER_KEY)
    }

    pub fn set_user(&self, user: &str) -> CoreResult<()> {
        self.inner.store.set(USER_KEY, user)
    }

    pub fn player(&self) -> CoreResult<Option<String>> {
        self.inner.store.get(PLAYER_KEY)
    }

    pub fn set_player(&self, player: &str) -> CoreResult<()> {
        self.inner.store.set(PLAYER_KEY, player)
    }

    fn notify(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.inner.events.send(event);
    }
}
