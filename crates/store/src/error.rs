//! Store Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. The originating `sqlx::Error` is kept
//! as the child frame, so the full tree is available when reporting.

use derive_more::{Display, Error};

/// A store error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("database error")]
    Database,
    #[display("database migration error")]
    Migration,
    /// The write was rejected by the schema: fix the input, don't retry.
    #[display("constraint violation: {_0}")]
    Constraint(#[error(not(source))] Violation),
    /// The database handle has been closed (or was never opened).
    #[display("database is closed")]
    Closed,
    /// A stored value could not be mapped to or from the domain model.
    #[display("invalid data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
    #[display("invalid database configuration")]
    Config,
}

/// Which kind of constraint the storage engine enforced.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// Primary key or unique index collision.
    #[display("unique")]
    Unique,
    /// Referenced row does not exist.
    #[display("foreign key")]
    ForeignKey,
    #[display("not null")]
    NotNull,
    #[display("check")]
    Check,
    #[display("other")]
    Other,
}

// SQLITE_CONSTRAINT primary result code; extended codes keep it in the low byte.
const SQLITE_CONSTRAINT: i64 = 19;

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Returns `true` for any constraint violation.
    pub fn is_constraint(&self) -> bool {
        matches!(self, Self::Constraint(_))
    }

    /// Classify an error coming back from the storage engine.
    pub(crate) fn from_sqlx(err: &sqlx::Error) -> Self {
        use sqlx::error::ErrorKind as SqlxKind;
        match err {
            sqlx::Error::PoolClosed => Self::Closed,
            sqlx::Error::Database(db) => match db.kind() {
                SqlxKind::UniqueViolation => Self::Constraint(Violation::Unique),
                SqlxKind::ForeignKeyViolation => Self::Constraint(Violation::ForeignKey),
                SqlxKind::NotNullViolation => Self::Constraint(Violation::NotNull),
                SqlxKind::CheckViolation => Self::Constraint(Violation::Check),
                _ => match db.code().and_then(|code| code.parse::<i64>().ok()) {
                    Some(code) if code & 0xff == SQLITE_CONSTRAINT => Self::Constraint(Violation::Other),
                    _ => Self::Database,
                },
            },
            _ => Self::Database,
        }
    }
}

/// Raise `sqlx` results into store errors, classifying the failure instead of
/// collapsing everything into [`ErrorKind::Database`].
pub(crate) trait SqlxResultExt<T> {
    fn or_raise_db(self) -> Result<T>;
}
impl<T> SqlxResultExt<T> for std::result::Result<T, sqlx::Error> {
    #[track_caller]
    fn or_raise_db(self) -> Result<T> {
        match self {
            Ok(value) => Ok(value),
            Err(err) => {
                let kind = ErrorKind::from_sqlx(&err);
                if let ErrorKind::Constraint(violation) = &kind {
                    tracing::warn!(%violation, "write rejected by storage engine");
                }
                Err(exn::Exn::from(err).raise(kind))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_closed_is_lifecycle_error() {
        assert!(matches!(ErrorKind::from_sqlx(&sqlx::Error::PoolClosed), ErrorKind::Closed));
    }

    #[test]
    fn test_row_not_found_is_generic() {
        assert!(matches!(ErrorKind::from_sqlx(&sqlx::Error::RowNotFound), ErrorKind::Database));
    }

    #[test]
    fn test_nothing_is_retryable() {
        assert!(!ErrorKind::Constraint(Violation::Unique).is_retryable());
        assert!(!ErrorKind::Closed.is_retryable());
    }
}
