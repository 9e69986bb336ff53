//! Service error taxonomy.
//!
//! Typed errors returned by the use-case layer; the HTTP adapter maps
//! each variant to a status code and a JSON `{"message": ...}` body.
//! Infrastructure failures from ports arrive as `anyhow::Error` and wrap
//! into `Internal`.

use thiserror::Error;

/// Errors a use case can surface to a caller.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Request body missing required fields or otherwise malformed.
    #[error("{0}")]
    BadRequest(String),
    /// Missing, expired, or invalidated bearer token.
    #[error("unauthorized")]
    Unauthorized,
    /// Authenticated, but not allowed to perform the operation.
    #[error("{0}")]
    Forbidden(String),
    /// Referenced entity does not exist.
    #[error("{0}")]
    NotFound(String),
    /// The pizza factory rejected or failed to fulfill an order.
    #[error("Failed to fulfill order at factory")]
    FactoryFailure(#[source] anyhow::Error),
    /// Unexpected internal failure.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Convenience alias for use-case results.
pub type ServiceResult<T> = Result<T, ServiceError>;
