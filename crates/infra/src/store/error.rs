//! Store errors and their classification.
//!
//! Every store backend reports failures as [`StoreError`]. Database errors
//! keep their SQLSTATE code so [`classify`] can sort them into the three
//! classes the retry wrapper acts on.
//!
//! | SQLSTATE | Meaning | Class |
//! |----------|---------|-------|
//! | `40001` | serialization failure | `Transient` |
//! | `40P01` | deadlock detected | `Transient` |
//! | `23505` | unique violation | `Conflict` |
//! | anything else | | `Other` |

use thiserror::Error;

pub const SERIALIZATION_FAILURE: &str = "40001";
pub const DEADLOCK_DETECTED: &str = "40P01";
pub const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The database rejected a statement. `code` is the SQLSTATE when known.
    #[error("database error ({}): {message}", code.as_deref().unwrap_or("no code"))]
    Database {
        code: Option<String>,
        message: String,
    },

    #[error("record not found")]
    NotFound,

    /// A record could not be (de)serialized to/from its stored JSON.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The store could not be reached (pool closed, timeout, IO).
    #[error("connection error: {0}")]
    Connection(String),

    /// The transaction was already committed or rolled back.
    #[error("transaction already finished")]
    TransactionClosed,

    /// A transient conflict persisted through every attempt.
    #[error("transaction failed after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },
}

impl StoreError {
    pub fn database(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Database {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    pub fn serialization_failure(message: impl Into<String>) -> Self {
        Self::database(SERIALIZATION_FAILURE, message)
    }

    pub fn unique_violation(message: impl Into<String>) -> Self {
        Self::database(UNIQUE_VIOLATION, message)
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Database { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// How the retry wrapper should react to a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Worth retrying in a fresh transaction.
    Transient,
    /// A uniqueness violation. Never retried.
    Conflict,
    /// Propagated unchanged.
    Other,
}

/// Classify a store error by its SQLSTATE code.
pub fn classify(error: &StoreError) -> ErrorClass {
    match error.code() {
        Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED) => ErrorClass::Transient,
        Some(UNIQUE_VIOLATION) => ErrorClass::Conflict,
        _ => ErrorClass::Other,
    }
}

/// Map a sqlx error, keeping the SQLSTATE code for classification.
pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => StoreError::Database {
            code: db_err.code().map(|c| c.into_owned()),
            message: format!("{operation}: {}", db_err.message()),
        },
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
            StoreError::Connection(format!("{operation}: {err}"))
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StoreError::Serialization(format!("{operation}: {err}"))
        }
        _ => StoreError::Database {
            code: None,
            message: format!("{operation}: {err}"),
        },
    }
}
