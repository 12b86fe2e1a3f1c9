use uuid::Uuid;

use transactional_executor::{kinds, Failure, FailureKind, TransactionError};

pub static ARITHMETIC_ERROR: FailureKind = FailureKind::child("ArithmeticError", &kinds::ERROR);
pub static DIVISION_BY_ZERO: FailureKind =
    FailureKind::child("DivisionByZeroError", &ARITHMETIC_ERROR);
pub static VALIDATION_ERROR: FailureKind = FailureKind::child("ValidationError", &kinds::ERROR);

/// Application error returned by units of work in tests
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("validation failed ({id}): {message}")]
    Validation { id: Uuid, message: String },

    #[error(transparent)]
    Transaction(#[from] TransactionError),
}

impl AppError {
    pub fn validation(message: &str) -> Self {
        Self::Validation {
            id: Uuid::new_v4(),
            message: message.to_string(),
        }
    }
}

impl Failure for AppError {
    fn kind(&self) -> &'static FailureKind {
        match self {
            Self::DivisionByZero => &DIVISION_BY_ZERO,
            Self::Validation { .. } => &VALIDATION_ERROR,
            Self::Transaction(e) => e.kind(),
        }
    }
}

pub fn divide(dividend: i64, divisor: i64) -> Result<i64, AppError> {
    dividend.checked_div(divisor).ok_or(AppError::DivisionByZero)
}
