//! Authorized client for the remote authentication and resource service.
//!
//! This module provides the `AuthorizedClient`, which logs in, attaches the
//! stored token to protected calls, and tears the session down as soon as
//! a protected call fails.

use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{info, warn};

use super::transport::{ApiRequest, Transport};
use super::ApiError;
use crate::auth::{AccessToken, StoreError, TokenStore};
use crate::error::SessionError;

/// Credential exchange endpoint.
pub const LOGIN_PATH: &str = "/api/login/";

/// Protected greeting endpoint backing the dashboard.
pub const HELLO_PATH: &str = "/api/hello/";

/// Shown when the greeting endpoint sends no message.
pub const DEFAULT_GREETING: &str = "Bienvenue !";

/// Why a login did not produce a session.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFailure {
    #[error("username and password are required")]
    MissingCredentials,

    #[error("unexpected response shape")]
    UnexpectedResponse,

    #[error("invalid credentials or service unavailable")]
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginResult {
    Success,
    Failure(LoginFailure),
}

impl LoginResult {
    pub fn is_success(&self) -> bool {
        matches!(self, LoginResult::Success)
    }

    pub fn into_result(self) -> Result<(), SessionError> {
        match self {
            LoginResult::Success => Ok(()),
            LoginResult::Failure(reason) => Err(SessionError::CredentialsRejected(reason)),
        }
    }
}

/// Outcome of a protected call.
///
/// `forced_logout` tells the caller the session is gone and it must move
/// to the unauthenticated entry view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallResult<T> {
    Success(T),
    Failure { forced_logout: bool },
}

impl<T> CallResult<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CallResult<U> {
        match self {
            CallResult::Success(payload) => CallResult::Success(f(payload)),
            CallResult::Failure { forced_logout } => CallResult::Failure { forced_logout },
        }
    }

    pub fn forced_logout(&self) -> bool {
        matches!(self, CallResult::Failure { forced_logout: true })
    }

    pub fn into_result(self) -> Result<T, SessionError> {
        match self {
            CallResult::Success(payload) => Ok(payload),
            CallResult::Failure { .. } => Err(SessionError::SessionExpiredOrInvalid),
        }
    }
}

/// Payload of the dashboard greeting endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Greeting {
    pub message: String,
}

impl Greeting {
    /// Read the greeting from any 2xx body, falling back to the default
    /// when the body carries no non-empty string `message`.
    pub fn from_body(body: &str) -> Self {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .as_ref()
            .and_then(|value| value.get("message"))
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_GREETING)
            .to_string();
        Self { message }
    }
}

/// Client for the remote service.
/// Clone is cheap - transport and store are shared.
#[derive(Clone)]
pub struct AuthorizedClient {
    transport: Arc<dyn Transport>,
    store: Arc<dyn TokenStore>,
}

impl AuthorizedClient {
    pub fn new(transport: Arc<dyn Transport>, store: Arc<dyn TokenStore>) -> Self {
        Self { transport, store }
    }

    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    /// Exchange credentials for an access token and store it.
    ///
    /// Rejections and malformed answers are reported in the `LoginResult`
    /// and leave the store untouched. Only a storage failure is an `Err`.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResult, StoreError> {
        if username.is_empty() || password.is_empty() {
            return Ok(LoginResult::Failure(LoginFailure::MissingCredentials));
        }

        let request = ApiRequest::post(
            LOGIN_PATH,
            json!({ "username": username, "password": password }),
        );

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(error) => {
                warn!(username, %error, "Login request failed");
                return Ok(LoginResult::Failure(LoginFailure::Rejected));
            }
        };

        if !response.is_success() {
            let error = ApiError::from_status(response.status, &response.body);
            warn!(username, %error, "Login rejected");
            return Ok(LoginResult::Failure(LoginFailure::Rejected));
        }

        match Self::access_token_from(&response.body) {
            Some(token) => {
                self.store.set(&token)?;
                info!(username, "Login successful");
                Ok(LoginResult::Success)
            }
            None => {
                warn!(username, "Login response carried no access token");
                Ok(LoginResult::Failure(LoginFailure::UnexpectedResponse))
            }
        }
    }

    fn access_token_from(body: &str) -> Option<AccessToken> {
        let value: Value = serde_json::from_str(body).ok()?;
        value
            .get("access")
            .and_then(Value::as_str)
            .and_then(AccessToken::new)
    }

    /// `GET` a protected resource.
    pub async fn call_protected<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<CallResult<T>, StoreError> {
        self.request_protected(Method::GET, path, None).await
    }

    /// Call a protected resource with the stored token attached.
    ///
    /// Without a token the call is still made, unauthenticated, and left
    /// for the service to reject. Any failure (transport error, non-2xx,
    /// undecodable body) clears the store and reports a forced logout.
    pub async fn request_protected<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<CallResult<T>, StoreError> {
        self.send_protected(method, path, body, |body| {
            serde_json::from_str(body)
                .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse body: {}", e)))
        })
        .await
    }

    /// Shared protected path: attach the token, send, decode a 2xx body
    /// with `decode`, and clear the session on any failure.
    async fn send_protected<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        decode: impl FnOnce(&str) -> Result<T, ApiError>,
    ) -> Result<CallResult<T>, StoreError> {
        let token = self.store.get()?;
        let request = ApiRequest {
            method,
            path: path.to_string(),
            bearer: None,
            body,
        }
        .with_bearer(token.as_ref().map(AccessToken::as_str));

        let outcome = match self.transport.send(request).await {
            Ok(response) if response.is_success() => decode(&response.body),
            Ok(response) => Err(ApiError::from_status(response.status, &response.body)),
            Err(error) => Err(error),
        };

        match outcome {
            Ok(payload) => Ok(CallResult::Success(payload)),
            Err(error) => {
                warn!(path, %error, "Protected call failed, clearing session");
                self.store.clear()?;
                Ok(CallResult::Failure {
                    forced_logout: true,
                })
            }
        }
    }

    /// Fetch the dashboard greeting. Any 2xx counts as success, whatever
    /// its body.
    pub async fn hello(&self) -> Result<CallResult<Greeting>, StoreError> {
        self.send_protected(Method::GET, HELLO_PATH, None, |body| {
            Ok(Greeting::from_body(body))
        })
        .await
    }

    /// Drop the session. Client-side only, no network call.
    pub fn logout(&self) -> Result<(), StoreError> {
        self.store.clear()?;
        info!("Logged out");
        Ok(())
    }
}
