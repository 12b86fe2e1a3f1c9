use async_trait::async_trait;

use crate::TransactionResult;

/// Trait for components that need to be notified of transaction lifecycle events.
///
/// Components implementing this trait can be registered with a
/// [`PostgresDatabase`](crate::PostgresDatabase) to receive callbacks once its
/// open transaction has been committed or rolled back. Repositories use this
/// to update caches or discard in-memory state belonging to the transaction.
#[async_trait]
pub trait TransactionAware: Send + Sync {
    /// Called after a successful transaction commit.
    async fn on_commit(&self) -> TransactionResult<()>;

    /// Called after a transaction rollback.
    async fn on_rollback(&self) -> TransactionResult<()>;
}
