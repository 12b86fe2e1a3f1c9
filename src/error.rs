use crate::failure::{kinds, Failure, FailureKind};

/// Error type for transaction handling.
///
/// Raised by database handles, registries and executor configuration. Errors
/// produced by a unit of work are never converted into this type; they reach
/// the caller as they were returned.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unknown database group: {0}")]
    UnknownDatabaseGroup(String),

    #[error("Transaction begin failed: {0}")]
    BeginFailed(String),

    #[error("Transaction commit failed: {0}")]
    CommitFailed(String),

    #[error("Transaction rollback failed: {0}")]
    RollbackFailed(String),

    #[error("A transaction is already active on this handle")]
    TransactionAlreadyActive,

    #[error("No active transaction")]
    NoActiveTransaction,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Result type for transaction operations
pub type TransactionResult<T> = Result<T, TransactionError>;

impl Failure for TransactionError {
    fn kind(&self) -> &'static FailureKind {
        match self {
            Self::Configuration(_) => &kinds::CONFIGURATION_ERROR,
            Self::UnknownDatabaseGroup(_) => &kinds::UNKNOWN_DATABASE_GROUP,
            Self::BeginFailed(_) | Self::TransactionAlreadyActive => &kinds::BEGIN_FAILURE,
            Self::CommitFailed(_) => &kinds::COMMIT_FAILURE,
            Self::RollbackFailed(_) => &kinds::ROLLBACK_FAILURE,
            Self::NoActiveTransaction => &kinds::TRANSACTION_ERROR,
            Self::DatabaseError(_) => &kinds::DATABASE_ERROR,
        }
    }
}
