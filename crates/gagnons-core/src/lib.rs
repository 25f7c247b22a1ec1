//! Session and access-control core for the Gagnons client.
//!
//! The pipeline is `TokenStore -> SessionGate -> AuthorizedClient`:
//! a successful login stores the access token, the gate admits protected
//! views while a token is held, and any failed protected call clears the
//! store and reports a forced logout so the caller returns to `/`.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

pub use api::{AuthorizedClient, CallResult, Greeting, LoginFailure, LoginResult};
pub use auth::{AccessToken, Decision, SessionGate, SessionState, StoreError, TokenStore};
pub use config::{Config, TokenBackend};
pub use error::SessionError;
pub use routes::{Navigation, Route, Router};
