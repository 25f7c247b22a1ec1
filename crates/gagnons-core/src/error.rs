use thiserror::Error;

use crate::api::LoginFailure;
use crate::auth::StoreError;

/// Session-level failures as seen by the view layer.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Login refused or answered with a malformed body. Show the form again.
    #[error("Login failed: {0}")]
    CredentialsRejected(LoginFailure),

    /// A protected call failed and the session was cleared.
    #[error("Session expired, please log in again")]
    SessionExpiredOrInvalid,

    /// No session can be kept at all.
    #[error(transparent)]
    EnvironmentUnavailable(#[from] StoreError),
}

impl SessionError {
    /// Fatal errors end the program rather than returning to the login view
    pub fn is_fatal(&self) -> bool {
        matches!(self, SessionError::EnvironmentUnavailable(_))
    }
}
