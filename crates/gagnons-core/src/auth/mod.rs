//! Session state and admission control.
//!
//! This module provides:
//! - `TokenStore`: single-slot persistence of the access token, with file,
//!   keychain and in-memory backends
//! - `SessionGate`: the admission check consulted before protected views
//!
//! Presence of a token is the only signal of authentication; there is no
//! expiry tracking on the client.

pub mod file_store;
pub mod gate;
pub mod keyring_store;
pub mod store;

pub use file_store::FileTokenStore;
pub use gate::{Decision, SessionGate, SessionState};
pub use keyring_store::KeyringTokenStore;
pub use store::{AccessToken, MemoryTokenStore, StoreError, TokenStore, ACCESS_KEY};
