//! Error types for the REST client core.
//!
//! # Design
//! The first five variants are the call-level taxonomy every vendor client
//! surfaces to its callers: three programmer errors (`UndefinedEndpoint`,
//! `MissingElement`, `UnsupportedBulkEndpoint`) and two upstream outcomes
//! (`TooManyRequests`, `FailedRequest`). `TooManyRequests` gets a dedicated
//! variant so callers can recognise rate limiting and back off on their own;
//! the core never retries it.
//!
//! The remaining variants cover failures below or beside HTTP: the transport
//! not producing a response at all, a list endpoint answering with a body
//! that is not a page, and configuration or (de)serialization problems.

use thiserror::Error;

use crate::http::TransportError;

/// Errors returned by `RestClient` and the endpoint registry.
#[derive(Debug, Error)]
pub enum Error {
    /// The upstream answered with a non-2xx status other than 429.
    #[error("request failed with status {status}: {reason}")]
    FailedRequest { status: u16, reason: String },

    /// A required path placeholder was not supplied, or was falsy.
    #[error("missing required element: {0}")]
    MissingElement(String),

    /// The upstream answered 429.
    #[error("too many requests")]
    TooManyRequests,

    /// The endpoint name is not registered, or its entry is malformed.
    #[error("undefined endpoint: {0}")]
    UndefinedEndpoint(String),

    /// Bulk fetch was requested for a name outside the bulk registry.
    #[error("endpoint does not support bulk fetch: {0}")]
    UnsupportedBulkEndpoint(String),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A list endpoint returned something that cannot be read as a page.
    #[error("unexpected page from {0}")]
    UnexpectedPage(String),

    #[error("deserialization failed: {0}")]
    Deserialization(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether waiting and issuing the same call again may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::TooManyRequests | Error::Transport(TransportError::Timeout)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
