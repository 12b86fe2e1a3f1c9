use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

use transactional_executor::{TransactionError, TransactionResult, TransactionalDatabase};

/// Operations issued against a [`RecordingDatabase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Begin,
    Commit,
    Rollback,
    Abandon,
}

/// In-memory database handle recording every call made to it.
///
/// Each operation can be configured to fail; a failing call is still recorded.
/// Like a real handle it holds at most one open transaction.
#[derive(Default)]
pub struct RecordingDatabase {
    calls: Mutex<Vec<Call>>,
    open: Mutex<bool>,
    fail_begin: bool,
    fail_commit: bool,
    fail_rollback: bool,
}

impl RecordingDatabase {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_begin() -> Arc<Self> {
        Arc::new(Self {
            fail_begin: true,
            ..Self::default()
        })
    }

    pub fn failing_commit() -> Arc<Self> {
        Arc::new(Self {
            fail_commit: true,
            ..Self::default()
        })
    }

    pub fn failing_rollback() -> Arc<Self> {
        Arc::new(Self {
            fail_rollback: true,
            ..Self::default()
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn count(&self, call: Call) -> usize {
        self.calls.lock().iter().filter(|c| **c == call).count()
    }

    pub fn is_open(&self) -> bool {
        *self.open.lock()
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }

    fn close(&self) -> TransactionResult<()> {
        let mut open = self.open.lock();
        if !*open {
            return Err(TransactionError::NoActiveTransaction);
        }
        *open = false;
        Ok(())
    }
}

#[async_trait]
impl TransactionalDatabase for RecordingDatabase {
    async fn begin(&self) -> TransactionResult<()> {
        self.record(Call::Begin);
        if self.fail_begin {
            return Err(TransactionError::BeginFailed("connection refused".to_string()));
        }
        let mut open = self.open.lock();
        if *open {
            return Err(TransactionError::TransactionAlreadyActive);
        }
        *open = true;
        Ok(())
    }

    async fn commit(&self) -> TransactionResult<()> {
        self.record(Call::Commit);
        self.close()?;
        if self.fail_commit {
            return Err(TransactionError::CommitFailed("serialization failure".to_string()));
        }
        Ok(())
    }

    async fn rollback(&self) -> TransactionResult<()> {
        self.record(Call::Rollback);
        self.close()?;
        if self.fail_rollback {
            return Err(TransactionError::RollbackFailed("connection lost".to_string()));
        }
        Ok(())
    }

    fn abandon(&self) {
        self.record(Call::Abandon);
        *self.open.lock() = false;
    }
}
