//! Error types for usergate.

use tonic::Status;

/// Main error types for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed caller input.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Missing, malformed, expired, or forged credential.
    #[error("invalid auth token")]
    InvalidToken,

    /// Password does not match the stored hash.
    #[error("invalid credentials")]
    CredentialMismatch,

    /// Password hashing primitive failure.
    #[error("password hashing failed: {0}")]
    Hashing(bcrypt::BcryptError),

    /// Token signing primitive failure.
    #[error("token signing failed: {0}")]
    Signing(jsonwebtoken::errors::Error),

    /// No record matched the lookup.
    #[error("user not found")]
    NotFound,

    /// Persistence layer failure.
    #[error("repository failure: {0}")]
    Repository(sqlx::Error),

    /// Invalid or incomplete process configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A listener could not be bound to its configured address.
    #[error("failed to bind {listener} listener: {source}")]
    Bind {
        /// Which listener failed to bind.
        listener: &'static str,
        /// The underlying bind error.
        source: std::io::Error,
    },

    /// The RPC serve loop failed after startup.
    #[error("rpc transport failure: {0}")]
    RpcTransport(#[from] tonic::transport::Error),

    /// The gateway serve loop failed after startup.
    #[error("gateway failure: {0}")]
    GatewayServe(std::io::Error),

    /// The reflection registry could not be built from the descriptor set.
    #[error("reflection registry: {0}")]
    Reflection(#[from] tonic_reflection::server::Error),

    /// Graceful shutdown did not complete within the shared deadline.
    #[error("shutdown deadline elapsed before both listeners drained")]
    ShutdownDeadline,

    /// Unrecoverable runtime failure.
    #[error("fatal: {0}")]
    Fatal(String),
}

/// Result type alias for service operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound,
            err => Error::Repository(err),
        }
    }
}

impl From<http::uri::InvalidUri> for Error {
    fn from(err: http::uri::InvalidUri) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<Error> for Status {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation(reason) => Status::invalid_argument(reason),
            Error::InvalidToken => Status::unauthenticated("invalid auth token"),
            Error::CredentialMismatch => Status::invalid_argument("invalid credentials"),
            Error::NotFound => Status::not_found("user not found"),
            // Upstream primitive failures stay out of the response; the
            // detail is logged here and callers see a generic internal error.
            Error::Hashing(err) => {
                tracing::error!(error = %err, "password hashing failure");
                Status::internal("internal error")
            }
            Error::Signing(err) => {
                tracing::error!(error = %err, "token signing failure");
                Status::internal("internal error")
            }
            Error::Repository(err) => {
                tracing::error!(error = %err, "repository failure");
                Status::internal("internal error")
            }
            err => {
                tracing::error!(error = %err, "unexpected failure in call path");
                Status::internal("internal error")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err: Error = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, Error::NotFound));
    }

    #[test]
    fn validation_maps_to_invalid_argument() {
        let status: Status = Error::Validation("empty name".to_string()).into();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
        assert_eq!(status.message(), "empty name");
    }

    #[test]
    fn token_failure_maps_to_unauthenticated() {
        let status: Status = Error::InvalidToken.into();
        assert_eq!(status.code(), tonic::Code::Unauthenticated);
    }

    #[test]
    fn repository_failure_does_not_leak_detail() {
        let err: Error = sqlx::Error::PoolTimedOut.into();
        let status: Status = err.into();
        assert_eq!(status.code(), tonic::Code::Internal);
        assert_eq!(status.message(), "internal error");
    }
}
