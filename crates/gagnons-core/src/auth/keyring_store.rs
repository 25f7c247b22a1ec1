use keyring::Entry;
use tracing::debug;

use super::store::{AccessToken, StoreError, TokenStore, ACCESS_KEY};

/// Keychain service name the token entry is filed under.
pub const SERVICE_NAME: &str = "gagnons";

/// Token kept in the platform credential store, one entry under the fixed
/// access key: Keychain on macOS, Credential Manager on Windows, the kernel
/// keyutils session keyring on Linux.
pub struct KeyringTokenStore {
    entry: Entry,
}

impl KeyringTokenStore {
    pub fn new() -> Result<Self, StoreError> {
        Self::for_service(SERVICE_NAME)
    }

    pub fn for_service(service: &str) -> Result<Self, StoreError> {
        let entry = Entry::new(service, ACCESS_KEY)?;
        Ok(Self { entry })
    }

    /// Wrap an existing entry, e.g. one backed by a specific credential
    pub fn with_entry(entry: Entry) -> Self {
        Self { entry }
    }
}

impl TokenStore for KeyringTokenStore {
    fn set(&self, token: &AccessToken) -> Result<(), StoreError> {
        self.entry.set_password(token.as_str())?;
        debug!("Token stored in keychain");
        Ok(())
    }

    fn get(&self) -> Result<Option<AccessToken>, StoreError> {
        match self.entry.get_password() {
            Ok(raw) => Ok(AccessToken::new(raw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn clear(&self) -> Result<(), StoreError> {
        match self.entry.delete_credential() {
            Ok(()) => {
                debug!("Token removed from keychain");
                Ok(())
            }
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
