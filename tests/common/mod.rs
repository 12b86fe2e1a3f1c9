#![allow(dead_code)]

pub mod database;
pub mod failures;
pub mod logs;

pub use database::{Call, RecordingDatabase};
pub use failures::{divide, AppError, ARITHMETIC_ERROR, DIVISION_BY_ZERO, VALIDATION_ERROR};
pub use logs::CapturedLogs;
pub use repositories::{Account, AccountRepository};
