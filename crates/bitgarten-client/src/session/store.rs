//! Durable storage for the serialized session record.
//!
//! Stores hold the record as an opaque JSON string; the format itself is
//! owned by [`super::Session`]. Reads are synchronous so header derivation
//! never has to await.

use std::fmt;

use keyring::Entry;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

/// Service name used for keyring entries.
const SERVICE_NAME: &str = "bitgarten";

/// Well-known key the session record lives under.
pub const SESSION_KEY: &str = "user";

/// Error type for session storage.
#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    /// Failed to access keyring.
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    /// Record could not be serialized.
    #[error("Session format error: {0}")]
    Format(#[from] serde_json::Error),
}

/// Result type for session storage.
pub type SessionStoreResult<T> = std::result::Result<T, SessionStoreError>;

/// Synchronous key-value slot holding the serialized session.
pub trait SessionStore: Send + Sync + fmt::Debug {
    /// Reads the raw record, if one is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn load(&self) -> SessionStoreResult<Option<String>>;

    /// Replaces the raw record.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn save(&self, raw: &str) -> SessionStoreResult<()>;

    /// Deletes the record. Deleting a missing record succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn remove(&self) -> SessionStoreResult<()>;
}

/// Process-local store; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<String>>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> SessionStoreResult<Option<String>> {
        Ok(self.slot.lock().clone())
    }

    fn save(&self, raw: &str) -> SessionStoreResult<()> {
        *self.slot.lock() = Some(raw.to_string());
        Ok(())
    }

    fn remove(&self) -> SessionStoreResult<()> {
        self.slot.lock().take();
        Ok(())
    }
}

/// Read-through cache in front of a slower store.
///
/// The first successful [`SessionStore::load`] is remembered; later loads
/// answer from memory until the next `save` or `remove`, which write
/// through and refresh the cached value. Failed reads are not cached.
#[derive(Debug)]
pub struct CachedSessionStore<S> {
    inner: S,
    // `None` until the inner store has been read once.
    cached: RwLock<Option<Option<String>>>,
}

impl<S: SessionStore> CachedSessionStore<S> {
    /// Wraps `inner`.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cached: RwLock::new(None),
        }
    }

    /// The wrapped store.
    pub const fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: SessionStore> SessionStore for CachedSessionStore<S> {
    fn load(&self) -> SessionStoreResult<Option<String>> {
        if let Some(raw) = self.cached.read().as_ref() {
            return Ok(raw.clone());
        }
        let raw = self.inner.load()?;
        *self.cached.write() = Some(raw.clone());
        Ok(raw)
    }

    fn save(&self, raw: &str) -> SessionStoreResult<()> {
        let result = self.inner.save(raw);
        *self.cached.write() = result.is_ok().then(|| Some(raw.to_string()));
        result
    }

    fn remove(&self) -> SessionStoreResult<()> {
        let result = self.inner.remove();
        *self.cached.write() = result.is_ok().then_some(None);
        result
    }
}

/// Store backed by the platform credential store.
///
/// - Linux: Secret Service (GNOME Keyring, `KWallet`)
/// - macOS: Keychain
/// - Windows: Credential Manager
#[derive(Debug, Clone)]
pub struct KeyringSessionStore {
    key: String,
}

impl Default for KeyringSessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyringSessionStore {
    /// Creates a store using the well-known session key.
    #[must_use]
    pub fn new() -> Self {
        Self::with_key(SESSION_KEY)
    }

    /// Creates a store under a custom key (one per server profile, say).
    #[must_use]
    pub fn with_key(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    fn entry(&self) -> SessionStoreResult<Entry> {
        Entry::new(SERVICE_NAME, &self.key).map_err(Into::into)
    }
}

impl SessionStore for KeyringSessionStore {
    fn load(&self) -> SessionStoreResult<Option<String>> {
        match self.entry()?.get_password() {
            Ok(raw) => Ok(Some(raw)),
            Err(keyring::Error::NoEntry) => {
                debug!("No session stored under {}", self.key);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, raw: &str) -> SessionStoreResult<()> {
        self.entry()?.set_password(raw)?;
        debug!("Stored session under {}", self.key);
        Ok(())
    }

    fn remove(&self) -> SessionStoreResult<()> {
        match self.entry()?.delete_credential() {
            Ok(()) => {
                debug!("Deleted session under {}", self.key);
                Ok(())
            }
            Err(keyring::Error::NoEntry) => {
                debug!("No session to delete under {}", self.key);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to delete session: {e}");
                Err(e.into())
            }
        }
    }
}
