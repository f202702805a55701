// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

#[allow(clippy::result_large_err)]
#[derive(Debug, Error)]
pub enum TalosError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("API request failed: {0}")]
    Api(#[from] tonic::Status),

    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Circuit breaker is open: {0}")]
    CircuitOpen(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

pub type Result<T> = std::result::Result<T, TalosError>;

/// Error kinds observed by the control-plane core (spec §7).
///
/// Distinct from [`TalosError`]: this is the error type the resource store,
/// controller runtime, and every controller built on top of it return.
/// `TalosError` (gRPC-transport failures while talking to a node) converts
/// into this via [`From`], landing on `Unavailable` for anything transient
/// and `Internal` for anything else.
#[allow(clippy::result_large_err)]
#[derive(Debug, Error)]
pub enum CoreError {
    /// The requested resource does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// A write used a stale expected version.
    #[error("conflict updating {0}")]
    Conflict(String),

    /// The caller is not allowed to perform this action.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The caller's input was structurally invalid.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A precondition required for the operation does not hold.
    #[error("failed precondition: {0}")]
    FailedPrecondition(String),

    /// The store or a downstream dependency could not be reached.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Anything else; treated as fatal by the controller runtime.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// `true` when the controller runtime should requeue quietly rather than
    /// log-and-abort the invocation (spec §7, "surface to caller / retry later").
    #[must_use]
    pub fn skip_reconcile(&self) -> bool {
        matches!(self, CoreError::Unavailable(_) | CoreError::Conflict(_))
    }

    /// `true` when this is a caller-input error that should abort the
    /// invocation rather than be retried (spec §7, "fatal" bucket).
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, CoreError::InvalidArgument(_) | CoreError::Internal(_))
    }
}

impl From<TalosError> for CoreError {
    fn from(err: TalosError) -> Self {
        match err {
            TalosError::Transport(_) | TalosError::Connection(_) | TalosError::CircuitOpen(_) => {
                CoreError::Unavailable(err.to_string())
            }
            TalosError::Api(status) => match status.code() {
                tonic::Code::NotFound => CoreError::NotFound(status.message().to_string()),
                tonic::Code::AlreadyExists | tonic::Code::Aborted => {
                    CoreError::Conflict(status.message().to_string())
                }
                tonic::Code::PermissionDenied | tonic::Code::Unauthenticated => {
                    CoreError::PermissionDenied(status.message().to_string())
                }
                tonic::Code::InvalidArgument => {
                    CoreError::InvalidArgument(status.message().to_string())
                }
                tonic::Code::FailedPrecondition => {
                    CoreError::FailedPrecondition(status.message().to_string())
                }
                tonic::Code::Unavailable
                | tonic::Code::DeadlineExceeded
                | tonic::Code::ResourceExhausted => CoreError::Unavailable(status.message().to_string()),
                _ => CoreError::Internal(status.message().to_string()),
            },
            TalosError::Config(msg) | TalosError::Validation(msg) => CoreError::InvalidArgument(msg),
            TalosError::Unknown(msg) => CoreError::Internal(msg),
        }
    }
}

/// Result alias for the control-plane core.
pub type CoreResult<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod core_error_tests {
    use super::*;

    #[test]
    fn unavailable_and_conflict_skip_reconcile() {
        assert!(CoreError::Unavailable("x".into()).skip_reconcile());
        assert!(CoreError::Conflict("x".into()).skip_reconcile());
        assert!(!CoreError::NotFound("x".into()).skip_reconcile());
    }

    #[test]
    fn invalid_argument_and_internal_are_fatal() {
        assert!(CoreError::InvalidArgument("x".into()).is_fatal());
        assert!(CoreError::Internal("x".into()).is_fatal());
        assert!(!CoreError::Unavailable("x".into()).is_fatal());
    }

    #[test]
    fn talos_error_conversion_maps_transport_to_unavailable() {
        let err = TalosError::Connection("refused".into());
        let core: CoreError = err.into();
        assert!(matches!(core, CoreError::Unavailable(_)));
    }

    #[test]
    fn talos_error_conversion_maps_not_found_status() {
        let status = tonic::Status::not_found("missing");
        let err = TalosError::Api(status);
        let core: CoreError = err.into();
        assert!(matches!(core, CoreError::NotFound(_)));
    }
}
