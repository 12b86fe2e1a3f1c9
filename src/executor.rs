use std::fmt;
use std::future::Future;
use std::panic::Location;
use std::sync::Arc;
use tracing::{debug, trace, warn};

use crate::{
    DatabaseRef, DatabaseRegistry, Failure, FailureKind, RollbackExclusions, TransactionError,
    TransactionResult, TransactionalDatabase,
};

/// Runs a unit of work inside a database transaction.
///
/// The transaction is committed when the work succeeds and rolled back when
/// it fails, unless the failure's kind is listed in the rollback exclusions,
/// in which case the work is committed anyway. Either way the failure is
/// returned to the caller exactly as the work produced it.
///
/// Database errors raised while beginning, committing or rolling back are
/// converted into the work's error type through `From<TransactionError>`.
pub struct TransactionExecutor<F> {
    database: Arc<dyn TransactionalDatabase>,
    work: F,
    exclusions: RollbackExclusions,
    label: String,
}

impl<F> TransactionExecutor<F> {
    /// Create an executor for `work` on a database handle.
    ///
    /// The caller's source location becomes the label used in log entries.
    #[track_caller]
    pub fn new(database: Arc<dyn TransactionalDatabase>, work: F) -> Self {
        Self {
            database,
            work,
            exclusions: RollbackExclusions::default(),
            label: caller_label(Location::caller()),
        }
    }

    /// Create an executor from a database handle or group name.
    ///
    /// Group names need a registry; use [`TransactionExecutor::builder`] to
    /// supply one.
    #[track_caller]
    pub fn create(database: impl Into<DatabaseRef>, work: F) -> TransactionResult<Self> {
        Self::builder(work).database(database).build()
    }

    /// Start configuring an executor for `work`; see [`ExecutorBuilder`].
    #[track_caller]
    pub fn builder(work: F) -> ExecutorBuilder<F> {
        ExecutorBuilder {
            database: None,
            registry: None,
            work,
            exclusions: RollbackExclusions::default(),
            label: caller_label(Location::caller()),
        }
    }

    /// Replace the set of failure kinds that are committed instead of rolled
    /// back. Kinds are matched in the given order, including their subkinds.
    pub fn exclude_from_rollback<I>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = &'static FailureKind>,
    {
        self.exclusions = RollbackExclusions::new(kinds);
        self
    }

    pub fn database(&self) -> &Arc<dyn TransactionalDatabase> {
        &self.database
    }

    pub fn exclusions(&self) -> &RollbackExclusions {
        &self.exclusions
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl<F, Fut, T, E> TransactionExecutor<F>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Failure + From<TransactionError>,
{
    /// Run the unit of work transactionally.
    ///
    /// If `begin` fails the work is not run. Otherwise exactly one of
    /// `commit` or `rollback` is issued before returning. When the returned
    /// future is dropped or the work panics before either is issued, the
    /// open transaction is released through
    /// [`TransactionalDatabase::abandon`].
    pub async fn execute(self) -> Result<T, E> {
        let Self {
            database,
            work,
            exclusions,
            label,
        } = self;

        database.begin().await?;
        let open = OpenTransaction {
            database: database.as_ref(),
            label: &label,
            resolved: false,
        };
        trace!(unit_of_work = %label, "transaction started");

        match work().await {
            Ok(value) => {
                let committed = database.commit().await;
                open.resolve();
                committed?;
                trace!(unit_of_work = %label, "transaction committed");
                Ok(value)
            }
            Err(failure) => {
                let kind = failure.kind();
                match exclusions.matching(kind) {
                    Some(excluded) => {
                        let committed = database.commit().await;
                        open.resolve();
                        committed?;
                        debug!(
                            unit_of_work = %label,
                            failure_kind = %kind,
                            excluded_by = %excluded,
                            "transaction committed despite failure"
                        );
                    }
                    None => {
                        let rolled_back = database.rollback().await;
                        open.resolve();
                        rolled_back?;
                        debug!(
                            unit_of_work = %label,
                            failure_kind = %kind,
                            error = %failure,
                            "transaction rolled back"
                        );
                    }
                }
                Err(failure)
            }
        }
    }
}

/// Abandons the open transaction if dropped before it was resolved.
struct OpenTransaction<'a> {
    database: &'a dyn TransactionalDatabase,
    label: &'a str,
    resolved: bool,
}

impl OpenTransaction<'_> {
    fn resolve(mut self) {
        self.resolved = true;
    }
}

impl Drop for OpenTransaction<'_> {
    fn drop(&mut self) {
        if !self.resolved {
            warn!(
                unit_of_work = %self.label,
                "execution stopped before the transaction was resolved"
            );
            self.database.abandon();
        }
    }
}

impl<F> fmt::Debug for TransactionExecutor<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionExecutor")
            .field("exclusions", &self.exclusions)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Builder for [`TransactionExecutor`].
pub struct ExecutorBuilder<F> {
    database: Option<DatabaseRef>,
    registry: Option<Arc<dyn DatabaseRegistry>>,
    work: F,
    exclusions: RollbackExclusions,
    label: String,
}

impl<F> ExecutorBuilder<F> {
    /// Database handle, or name of a group resolved through the registry.
    pub fn database(mut self, database: impl Into<DatabaseRef>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Registry used to resolve group names.
    pub fn registry(mut self, registry: Arc<dyn DatabaseRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Name identifying the unit of work in log entries.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// See [`TransactionExecutor::exclude_from_rollback`].
    pub fn exclude_from_rollback<I>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = &'static FailureKind>,
    {
        self.exclusions = RollbackExclusions::new(kinds);
        self
    }

    /// Resolve the database and produce the executor.
    pub fn build(self) -> TransactionResult<TransactionExecutor<F>> {
        let database = self.database.ok_or_else(|| {
            TransactionError::Configuration("no database reference supplied".to_string())
        })?;
        let database = database.resolve(self.registry.as_deref())?;

        Ok(TransactionExecutor {
            database,
            work: self.work,
            exclusions: self.exclusions,
            label: self.label,
        })
    }
}

fn caller_label(location: &Location<'_>) -> String {
    format!("{}:{}", location.file(), location.line())
}
