//! Error taxonomy for IPSphere
//!
//! Every handler returns `Result<Response, IpsphereError>`; the dispatch
//! layer in `server::http` maps each variant to exactly one HTTP status.
//! Internal error structure never reaches the client body.

use hyper::StatusCode;
use thiserror::Error;

/// Errors produced by IPSphere services
#[derive(Debug, Error)]
pub enum IpsphereError {
    /// MongoDB connectivity or query failure
    #[error("database error: {0}")]
    Database(String),

    /// Malformed request body, query string, or domain rule violation
    #[error("validation error: {0}")]
    Validation(String),

    /// Referenced document does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// A required backing service is not configured or reachable
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// On-chain registry call failed
    #[error("chain error: {0}")]
    Chain(String),

    /// Anything else
    #[error("internal error: {0}")]
    Internal(String),
}

impl IpsphereError {
    /// HTTP status this error maps to
    pub fn status(&self) -> StatusCode {
        match self {
            IpsphereError::Validation(_) => StatusCode::BAD_REQUEST,
            IpsphereError::NotFound(_) => StatusCode::NOT_FOUND,
            IpsphereError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            IpsphereError::Chain(_) => StatusCode::BAD_GATEWAY,
            IpsphereError::Database(_) | IpsphereError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable machine-readable code for the response body
    pub fn code(&self) -> &'static str {
        match self {
            IpsphereError::Database(_) => "DB_ERROR",
            IpsphereError::Validation(_) => "VALIDATION",
            IpsphereError::NotFound(_) => "NOT_FOUND",
            IpsphereError::Unavailable(_) => "UNAVAILABLE",
            IpsphereError::Chain(_) => "CHAIN_ERROR",
            IpsphereError::Internal(_) => "INTERNAL",
        }
    }
}

impl From<std::io::Error> for IpsphereError {
    fn from(e: std::io::Error) -> Self {
        IpsphereError::Internal(format!("I/O error: {}", e))
    }
}

impl From<bson::ser::Error> for IpsphereError {
    fn from(e: bson::ser::Error) -> Self {
        IpsphereError::Internal(format!("BSON serialization error: {}", e))
    }
}

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, IpsphereError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_is_stable() {
        assert_eq!(
            IpsphereError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            IpsphereError::NotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            IpsphereError::Chain("x".into()).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            IpsphereError::Unavailable("x".into()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            IpsphereError::Database("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
