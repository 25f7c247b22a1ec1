use std::fmt;
use std::path::PathBuf;
use std::sync::Mutex;

use thiserror::Error;
use tracing::debug;

/// Fixed storage key under which the access token is persisted.
pub const ACCESS_KEY: &str = "access_token";

/// Opaque bearer credential issued by the remote service.
///
/// Can only be built from a non-empty string, so a stored token is always
/// a usable one.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a raw token, returning `None` for an empty string.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

// Never print the credential itself
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessToken(<{} bytes>)", self.0.len())
    }
}

/// The persistence layer itself is inaccessible.
///
/// Fatal to the session subsystem: no session can be maintained, so every
/// caller propagates it instead of treating it as "logged out".
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Token storage unavailable at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Keychain unavailable: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("Token slot poisoned by a panicking writer")]
    Poisoned,
}

/// Durable single-slot storage for the access token.
///
/// Implementations own the persisted value; callers never keep a private
/// copy, and `get` always reflects the latest `set`/`clear`.
pub trait TokenStore: Send + Sync {
    /// Overwrite any previous token.
    fn set(&self, token: &AccessToken) -> Result<(), StoreError>;

    /// Read the stored token, `None` if never set or cleared.
    fn get(&self) -> Result<Option<AccessToken>, StoreError>;

    /// Remove the token. Clearing an empty store is a no-op.
    fn clear(&self) -> Result<(), StoreError>;

    /// True iff a non-empty token is stored.
    fn is_authenticated(&self) -> Result<bool, StoreError> {
        Ok(self.get()?.is_some())
    }
}

/// In-memory slot, used for ephemeral sessions and as the test double.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<AccessToken>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a token already present
    pub fn with_token(token: AccessToken) -> Self {
        Self {
            slot: Mutex::new(Some(token)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn set(&self, token: &AccessToken) -> Result<(), StoreError> {
        let mut slot = self.slot.lock().map_err(|_| StoreError::Poisoned)?;
        *slot = Some(token.clone());
        debug!("Token stored in memory");
        Ok(())
    }

    fn get(&self) -> Result<Option<AccessToken>, StoreError> {
        let slot = self.slot.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(slot.clone())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut slot = self.slot.lock().map_err(|_| StoreError::Poisoned)?;
        if slot.take().is_some() {
            debug!("Token cleared from memory");
        }
        Ok(())
    }
}
