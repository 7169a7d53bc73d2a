//! Error types for the Pokédex client core.
//!
//! # Design
//! `Failure` is the closed taxonomy the UI branches on. Its `Display` text is
//! the short user-facing message, so a controller never formats errors
//! itself. `TransportError` is what a transport reports before
//! classification and never leaves the repository. `MappingError` is a
//! data-contract violation and deliberately sits outside `Failure`.

use thiserror::Error;

/// Fallback text for a server error that carries no message.
pub const SERVER_ERROR_MESSAGE: &str = "Server error";

/// Failures caused by the network round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkFailure {
    #[error("The request timed out")]
    RequestTimeout,

    /// Rendered like `Unknown`; the UI has no dedicated text for a 403.
    #[error("Something went wrong")]
    AccessDenied,

    #[error("You've hit your rate limit")]
    TooManyRequests,

    #[error("No internet connection")]
    NoConnectivity,

    #[error("The payload is too large")]
    PayloadTooLarge,

    /// A 5xx (or otherwise unsuccessful) response. The message, when present,
    /// comes verbatim from the server.
    #[error("{}", .0.as_deref().unwrap_or(SERVER_ERROR_MESSAGE))]
    ServerError(Option<String>),

    #[error("The response could not be read")]
    Serialization,

    #[error("Something went wrong")]
    Unknown,
}

/// Failures caused by the local device.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocalFailure {
    #[error("{}", .0.as_deref().unwrap_or("Not enough storage space"))]
    DiskFull(Option<String>),
}

/// Every classified failure the UI can be asked to render.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Failure {
    #[error(transparent)]
    Network(#[from] NetworkFailure),

    #[error(transparent)]
    Local(#[from] LocalFailure),
}

impl NetworkFailure {
    pub fn server_error(message: impl Into<String>) -> Self {
        NetworkFailure::ServerError(Some(message.into()))
    }
}

/// Outcome of a single repository operation.
pub type FetchResult<T> = Result<T, NetworkFailure>;

/// Low-level failure reported by a transport, before classification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("host could not be resolved")]
    HostUnresolved,

    #[error("connection refused")]
    ConnectionRefused,

    #[error("timed out")]
    Timeout,

    #[error("TLS handshake failed: {0}")]
    Tls(String),

    /// A transport that treats non-2xx statuses as errors reports them here.
    #[error("HTTP {status} {reason}")]
    Status {
        status: u16,
        reason: String,
        body: Option<String>,
    },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("{0}")]
    Other(String),
}

/// A wire record violated the data contract the mapping layer relies on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("invalid Pokémon resource URL: {0}")]
    InvalidResourceUrl(String),
}
