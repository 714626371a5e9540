//! Error types for client construction.

use thiserror::Error;

/// Errors raised while setting up a [`BigQueryClient`](crate::BigQueryClient).
///
/// Request-time failures are reported as
/// [`WarehouseError`](bqmask_core::WarehouseError) instead.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid API base URL `{url}`: {reason}")]
    InvalidApiBase { url: String, reason: String },

    #[error("access token contains characters not allowed in an HTTP header")]
    InvalidToken,

    #[error("user agent contains characters not allowed in an HTTP header")]
    InvalidUserAgent,

    #[error("failed to create HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;
