//! The module contains the errors the engine can throw.
//!
//! - [`Validation`] malformed, missing or out-of-range input.
//! - [`NotFound`] a referenced room, member or ledger row does not exist.
//! - [`InsufficientFunds`] an expense exceeds the current room balance.
//! - [`Conflict`] lock contention on a room balance row; safe to retry.
//! - [`Timeout`] the unit of work exceeded the configured transaction timeout;
//!   safe to retry.
//! - [`Database`] any other persistence failure.
//!
//!  [`Validation`]: EngineError::Validation
//!  [`NotFound`]: EngineError::NotFound
//!  [`InsufficientFunds`]: EngineError::InsufficientFunds
//!  [`Conflict`]: EngineError::Conflict
//!  [`Timeout`]: EngineError::Timeout
//!  [`Database`]: EngineError::Database
use std::time::Duration;

use sea_orm::{ConnAcquireErr, DbErr, RuntimeErr, SqlErr};
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Database(DbErr),
}

impl EngineError {
    /// Returns `true` for the error kinds a caller may retry (with its own
    /// backoff). The engine never retries internally.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_) | Self::Timeout(_))
    }

    /// Maps a foreign key violation to [`EngineError::NotFound`] for `label`,
    /// leaving every other error untouched.
    pub(crate) fn missing_reference(self, label: &str) -> Self {
        match self {
            Self::Database(err)
                if matches!(
                    err.sql_err(),
                    Some(SqlErr::ForeignKeyConstraintViolation(_))
                ) =>
            {
                Self::NotFound(label.to_string())
            }
            other => other,
        }
    }
}

/// SQLite `BUSY`/`LOCKED` (and their extended codes), PostgreSQL
/// `lock_not_available`, `serialization_failure` and `deadlock_detected`.
const CONTENTION_CODES: &[&str] = &["5", "6", "261", "262", "517", "55P03", "40001", "40P01"];

fn is_lock_contention(err: &DbErr) -> bool {
    let runtime = match err {
        DbErr::Conn(runtime) | DbErr::Exec(runtime) | DbErr::Query(runtime) => runtime,
        _ => return false,
    };
    let RuntimeErr::SqlxError(sea_orm::sqlx::Error::Database(db_err)) = runtime else {
        return false;
    };
    db_err
        .code()
        .is_some_and(|code| CONTENTION_CODES.contains(&code.as_ref()))
}

impl From<DbErr> for EngineError {
    fn from(err: DbErr) -> Self {
        if is_lock_contention(&err) {
            return Self::Conflict(format!("room balance is locked: {err}"));
        }
        if let DbErr::ConnectionAcquire(ConnAcquireErr::Timeout) = err {
            return Self::Conflict("connection pool exhausted".to_string());
        }
        Self::Database(err)
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::Timeout(a), Self::Timeout(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
