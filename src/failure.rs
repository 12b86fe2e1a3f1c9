use std::fmt;
use std::iter;

/// Categorical tag of a failure.
///
/// Kinds form a tree through their optional parent, so a kind can be asked
/// whether it is a specialization of another kind. Declare kinds as statics:
///
/// ```
/// use transactional_executor::{kinds, FailureKind};
///
/// static VALIDATION: FailureKind = FailureKind::child("ValidationError", &kinds::ERROR);
/// static MISSING_FIELD: FailureKind = FailureKind::child("MissingFieldError", &VALIDATION);
///
/// assert!(MISSING_FIELD.is_kind_of(&VALIDATION));
/// assert!(!VALIDATION.is_kind_of(&MISSING_FIELD));
/// ```
#[derive(Debug)]
pub struct FailureKind {
    name: &'static str,
    parent: Option<&'static FailureKind>,
}

impl FailureKind {
    /// A kind with no ancestors.
    pub const fn root(name: &'static str) -> Self {
        Self { name, parent: None }
    }

    /// A kind specializing `parent`.
    pub const fn child(name: &'static str, parent: &'static FailureKind) -> Self {
        Self {
            name,
            parent: Some(parent),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn parent(&self) -> Option<&'static FailureKind> {
        self.parent
    }

    /// Iterates over this kind followed by each of its ancestors, nearest first.
    pub fn ancestors(&self) -> impl Iterator<Item = &FailureKind> {
        iter::successors(Some(self), |kind| kind.parent)
    }

    /// Returns true if this kind is `other` or descends from it.
    pub fn is_kind_of(&self, other: &FailureKind) -> bool {
        self.ancestors().any(|kind| kind == other)
    }
}

impl PartialEq for FailureKind {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for FailureKind {}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// An error that can report its failure kind.
///
/// Units of work run by a [`TransactionExecutor`](crate::TransactionExecutor)
/// fail with a type implementing this trait so the rollback-exclusion policy
/// can classify them.
pub trait Failure: std::error::Error {
    fn kind(&self) -> &'static FailureKind;
}

/// Kinds used by the errors of this crate.
pub mod kinds {
    use super::FailureKind;

    /// Root of every kind declared here.
    pub static ERROR: FailureKind = FailureKind::root("Error");

    pub static CONFIGURATION_ERROR: FailureKind = FailureKind::child("ConfigurationError", &ERROR);
    pub static UNKNOWN_DATABASE_GROUP: FailureKind =
        FailureKind::child("UnknownDatabaseGroup", &CONFIGURATION_ERROR);

    pub static TRANSACTION_ERROR: FailureKind = FailureKind::child("TransactionError", &ERROR);
    pub static BEGIN_FAILURE: FailureKind = FailureKind::child("BeginFailure", &TRANSACTION_ERROR);
    pub static COMMIT_FAILURE: FailureKind = FailureKind::child("CommitFailure", &TRANSACTION_ERROR);
    pub static ROLLBACK_FAILURE: FailureKind =
        FailureKind::child("RollbackFailure", &TRANSACTION_ERROR);
    pub static DATABASE_ERROR: FailureKind = FailureKind::child("DatabaseError", &TRANSACTION_ERROR);
}

/// Ordered set of failure kinds whose effects are committed instead of
/// rolled back.
#[derive(Debug, Clone, Default)]
pub struct RollbackExclusions {
    kinds: Vec<&'static FailureKind>,
}

impl RollbackExclusions {
    pub fn new<I>(kinds: I) -> Self
    where
        I: IntoIterator<Item = &'static FailureKind>,
    {
        Self {
            kinds: kinds.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn kinds(&self) -> &[&'static FailureKind] {
        &self.kinds
    }

    /// Returns the first configured kind that `kind` equals or specializes.
    pub fn matching(&self, kind: &FailureKind) -> Option<&'static FailureKind> {
        self.kinds
            .iter()
            .copied()
            .find(|excluded| kind.is_kind_of(excluded))
    }

    /// Returns true if a failure of `kind` must be committed rather than
    /// rolled back.
    pub fn excludes(&self, kind: &FailureKind) -> bool {
        self.matching(kind).is_some()
    }
}
