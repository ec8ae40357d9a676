//! Error types for nzb-health
//!
//! Only four kinds of failure ever leave a health check:
//! - [`Error::Config`]: no usable provider (never retried)
//! - [`Error::Fetch`]: the NZB document could not be downloaded
//! - [`Error::InvalidNzb`]: the document is malformed or empty
//! - [`Error::Cancelled`]: the caller's cancellation token fired
//!
//! Per-provider failures are [`ProbeError`]s. They are absorbed by the
//! verifier's fallback chain and only show up as a segment reported missing.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for nzb-health operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for nzb-health
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "providers")
        key: Option<String>,
    },

    /// The NZB document could not be retrieved
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Invalid NZB file
    #[error("invalid NZB: {0}")]
    InvalidNzb(String),

    /// The health check was cancelled before it completed
    #[error("health check cancelled")]
    Cancelled,
}

impl Error {
    /// Error returned when no enabled provider with a host is configured
    pub fn no_providers() -> Self {
        Error::Config {
            message: "no enabled usenet providers configured".to_string(),
            key: Some("providers".to_string()),
        }
    }

    /// Whether the caller may reasonably retry (typically with another candidate)
    ///
    /// Only fetch failures qualify. Configuration and format errors are permanent,
    /// and a cancelled check was stopped on purpose.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Fetch(_))
    }
}

/// Failure of a single availability probe against one provider or the pool
///
/// Never surfaced from [`crate::HealthCheckService`]; the verifier treats
/// every variant except a definitive pool absence as inconclusive.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// TCP connect or TLS handshake failed
    #[error("failed to connect to {host}: {reason}")]
    Connect {
        /// Provider host that could not be reached
        host: String,
        /// Underlying cause
        reason: String,
    },

    /// The provider rejected our credentials
    #[error("authentication rejected by {host}: {response}")]
    Auth {
        /// Provider host
        host: String,
        /// Status line returned by the server
        response: String,
    },

    /// The provider answered with something we did not expect
    #[error("unexpected response from {host}: {response}")]
    Protocol {
        /// Provider host
        host: String,
        /// Status line returned by the server
        response: String,
    },

    /// I/O error on an established connection
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The message-id cannot be sent in an NNTP command
    #[error("invalid message-id: {0:?}")]
    InvalidMessageId(String),

    /// The probe did not finish in time
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),

    /// Error reported by the shared connection pool
    #[error("pool error: {0}")]
    Pool(#[from] PoolError),
}

impl ProbeError {
    /// True only when the pool has confirmed the article is absent on every provider
    pub fn is_definitive_absence(&self) -> bool {
        matches!(self, ProbeError::Pool(PoolError::NotFoundInProviders))
    }
}

/// Errors reported by an externally managed provider pool
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PoolError {
    /// Every provider behind the pool answered "no such article"
    #[error("article not found in any provider")]
    NotFoundInProviders,

    /// No pool is currently configured
    #[error("no connection pool available: {0}")]
    Unavailable(String),

    /// Any other pool failure (stale connection, timeout, etc.)
    #[error("{0}")]
    Other(String),
}

/// Convert errors to HTTP status codes for the routes that expose health checks
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            Error::Config { .. } => 400,
            Error::InvalidNzb(_) => 422,
            Error::Fetch(_) => 502,
            // 499 Client Closed Request
            Error::Cancelled => 499,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Fetch(_) => "fetch_error",
            Error::InvalidNzb(_) => "parse_error",
            Error::Cancelled => "cancelled",
        }
    }
}
