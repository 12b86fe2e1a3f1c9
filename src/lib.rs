//! Transactional Executor
//!
//! Runs a unit of work inside a database transaction: commit on success,
//! rollback on failure, and commit anyway for failure kinds configured as
//! acceptable. The work's failure is always handed back to the caller.
//!
//! The protocol is database agnostic through [`TransactionalDatabase`];
//! [`PostgresDatabase`] implements it on top of an sqlx connection pool.

pub mod config;
pub mod database;
pub mod error;
pub mod executor;
pub mod failure;
pub mod postgres;
pub mod transaction_aware;

pub use config::DatabaseConfig;
pub use database::{DatabaseRef, DatabaseRegistry, Registry, TransactionalDatabase};
pub use error::{TransactionError, TransactionResult};
pub use executor::{ExecutorBuilder, TransactionExecutor};
pub use failure::{kinds, Failure, FailureKind, RollbackExclusions};
pub use postgres::{PostgresDatabase, TransactionSlot};
pub use transaction_aware::TransactionAware;
