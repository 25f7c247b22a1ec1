//! REST client module for the remote authentication and resource service.
//!
//! This module provides the `AuthorizedClient` for logging in and calling
//! protected endpoints, and the `Transport` seam it sends requests through.
//!
//! The service uses bearer token authentication; the token is obtained
//! from `POST /api/login/` and kept in a `TokenStore`.

pub mod client;
pub mod error;
pub mod transport;

pub use client::{
    AuthorizedClient, CallResult, Greeting, LoginFailure, LoginResult, DEFAULT_GREETING,
    HELLO_PATH, LOGIN_PATH,
};
pub use error::ApiError;
pub use transport::{ApiRequest, ApiResponse, ReqwestTransport, Transport};
