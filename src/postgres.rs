use async_trait::async_trait;
use parking_lot::RwLock;
use sqlx::{PgPool, Postgres, Transaction};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::{
    DatabaseConfig, Registry, TransactionAware, TransactionError, TransactionResult,
    TransactionalDatabase,
};

/// Slot holding the open PostgreSQL transaction of a [`PostgresDatabase`].
pub type TransactionSlot = Arc<Mutex<Option<Transaction<'static, Postgres>>>>;

/// PostgreSQL implementation of [`TransactionalDatabase`].
///
/// `begin` opens a transaction from the pool and parks it in a shared slot.
/// Units of work reach it through [`PostgresDatabase::transaction`]:
///
/// ```ignore
/// let mut guard = db.transaction().lock().await;
/// let tx = guard.as_mut().ok_or(TransactionError::NoActiveTransaction)?;
/// sqlx::query("DELETE FROM sessions").execute(&mut **tx).await?;
/// ```
pub struct PostgresDatabase {
    pool: Arc<PgPool>,
    tx: TransactionSlot,
    observers: Arc<RwLock<Vec<Arc<dyn TransactionAware>>>>,
}

impl PostgresDatabase {
    /// Create a new handle over the given connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self {
            pool,
            tx: Arc::new(Mutex::new(None)),
            observers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// The slot holding the open transaction, `None` outside of one.
    pub fn transaction(&self) -> &TransactionSlot {
        &self.tx
    }

    /// Register a component that needs to be notified of transaction events.
    pub fn register_transaction_aware(&self, observer: Arc<dyn TransactionAware>) {
        self.observers.write().push(observer);
    }

    /// Takes ownership of the open transaction, leaving None in its place.
    async fn take_transaction(&self) -> TransactionResult<Transaction<'static, Postgres>> {
        self.tx
            .lock()
            .await
            .take()
            .ok_or(TransactionError::NoActiveTransaction)
    }

    fn observers(&self) -> Vec<Arc<dyn TransactionAware>> {
        self.observers.read().clone()
    }
}

#[async_trait]
impl TransactionalDatabase for PostgresDatabase {
    async fn begin(&self) -> TransactionResult<()> {
        let mut slot = self.tx.lock().await;
        if slot.is_some() {
            return Err(TransactionError::TransactionAlreadyActive);
        }

        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| TransactionError::BeginFailed(e.to_string()))?;
        *slot = Some(tx);
        Ok(())
    }

    async fn commit(&self) -> TransactionResult<()> {
        let tx = self.take_transaction().await?;
        tx.commit()
            .await
            .map_err(|e| TransactionError::CommitFailed(e.to_string()))?;

        // Notify observers after successful commit
        for observer in self.observers() {
            observer.on_commit().await?;
        }
        Ok(())
    }

    async fn rollback(&self) -> TransactionResult<()> {
        let tx = self.take_transaction().await?;
        tx.rollback()
            .await
            .map_err(|e| TransactionError::RollbackFailed(e.to_string()))?;

        for observer in self.observers() {
            observer.on_rollback().await?;
        }
        Ok(())
    }

    fn abandon(&self) {
        // Dropping a sqlx transaction queues its rollback on the connection.
        match self.tx.try_lock() {
            Ok(mut slot) => {
                if slot.take().is_some() {
                    warn!("abandoned open transaction, rolling back");
                }
            }
            Err(_) => warn!("transaction slot busy, open transaction not released"),
        }
    }
}

impl Registry<PostgresDatabase> {
    /// Build a registry with one lazily connecting pool per configured group.
    ///
    /// No connection is made until a transaction begins.
    pub fn connect_lazy(config: &DatabaseConfig) -> TransactionResult<Self> {
        let registry = Self::new();
        for (group, url) in config.groups() {
            let pool = PgPool::connect_lazy(url)?;
            registry.register(group.as_str(), Arc::new(PostgresDatabase::new(Arc::new(pool))));
            debug!(group = %group, "registered database group");
        }
        Ok(registry)
    }
}
