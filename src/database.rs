use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::{TransactionError, TransactionResult};

/// A database handle able to open and resolve one transaction at a time.
///
/// The executor calls `begin` once, then exactly one of `commit` or
/// `rollback`. Failures of these operations are surfaced to the caller as-is.
#[async_trait]
pub trait TransactionalDatabase: Send + Sync {
    /// Open a transaction.
    async fn begin(&self) -> TransactionResult<()>;

    /// Make the work of the open transaction permanent.
    async fn commit(&self) -> TransactionResult<()>;

    /// Discard the work of the open transaction.
    async fn rollback(&self) -> TransactionResult<()>;

    /// Release an open transaction without awaiting.
    ///
    /// Called when an execution stops between `begin` and its resolution,
    /// because the future was dropped or the unit of work panicked. The
    /// handle must leave no transaction open afterwards so it can begin
    /// again.
    fn abandon(&self) {}
}

/// Resolves a named database group into a handle.
pub trait DatabaseRegistry: Send + Sync {
    fn resolve(&self, group: &str) -> TransactionResult<Arc<dyn TransactionalDatabase>>;
}

/// Reference to the database an executor runs against: either a handle or
/// the name of a group to look up in a [`DatabaseRegistry`].
#[derive(Clone)]
pub enum DatabaseRef {
    Handle(Arc<dyn TransactionalDatabase>),
    Group(String),
}

impl DatabaseRef {
    /// Resolve into a handle, consulting `registry` for group names.
    pub fn resolve(
        self,
        registry: Option<&dyn DatabaseRegistry>,
    ) -> TransactionResult<Arc<dyn TransactionalDatabase>> {
        match self {
            Self::Handle(handle) => Ok(handle),
            Self::Group(group) => match registry {
                Some(registry) => registry.resolve(&group),
                None => Err(TransactionError::Configuration(format!(
                    "database group `{group}` given without a registry"
                ))),
            },
        }
    }
}

impl fmt::Debug for DatabaseRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handle(_) => f.write_str("Handle(..)"),
            Self::Group(group) => f.debug_tuple("Group").field(group).finish(),
        }
    }
}

impl<D> From<Arc<D>> for DatabaseRef
where
    D: TransactionalDatabase + 'static,
{
    fn from(handle: Arc<D>) -> Self {
        Self::Handle(handle)
    }
}

impl From<Arc<dyn TransactionalDatabase>> for DatabaseRef {
    fn from(handle: Arc<dyn TransactionalDatabase>) -> Self {
        Self::Handle(handle)
    }
}

impl From<&str> for DatabaseRef {
    fn from(group: &str) -> Self {
        Self::Group(group.to_string())
    }
}

impl From<String> for DatabaseRef {
    fn from(group: String) -> Self {
        Self::Group(group)
    }
}

/// In-process registry of named database handles.
///
/// Every resolution of a group returns the same shared handle. Callers must
/// not run concurrent transactions through one group.
pub struct Registry<D> {
    groups: RwLock<HashMap<String, Arc<D>>>,
}

impl<D> Registry<D> {
    pub fn new() -> Self {
        Self {
            groups: RwLock::new(HashMap::new()),
        }
    }

    /// Register `handle` under `group`, returning the handle it replaced.
    pub fn register(&self, group: impl Into<String>, handle: Arc<D>) -> Option<Arc<D>> {
        self.groups.write().insert(group.into(), handle)
    }

    /// Get the handle registered under `group`.
    pub fn get(&self, group: &str) -> Option<Arc<D>> {
        self.groups.read().get(group).cloned()
    }

    /// Names of all registered groups, sorted.
    pub fn groups(&self) -> Vec<String> {
        let mut names: Vec<String> = self.groups.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl<D> Default for Registry<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> DatabaseRegistry for Registry<D>
where
    D: TransactionalDatabase + 'static,
{
    fn resolve(&self, group: &str) -> TransactionResult<Arc<dyn TransactionalDatabase>> {
        match self.get(group) {
            Some(handle) => Ok(handle),
            None => Err(TransactionError::UnknownDatabaseGroup(group.to_string())),
        }
    }
}
