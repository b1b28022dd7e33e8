use rusqlite::ffi;
use thiserror::Error;

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique column or composite key already holds this value.
    #[error("uniqueness violation: {0}")]
    UniquenessViolation(String),

    #[error("validation failed: {0}")]
    Validation(String),

    /// A foreign key points at a row that does not exist.
    #[error("referential integrity violation: {0}")]
    ReferentialIntegrity(String),

    #[error("database lock poisoned: {0}")]
    LockPoisoned(String),

    #[error(transparent)]
    Sqlite(rusqlite::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(ref failure, ref msg) = err {
            let detail = msg.clone().unwrap_or_else(|| failure.to_string());
            match failure.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    return Self::UniquenessViolation(detail);
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => return Self::ReferentialIntegrity(detail),
                ffi::SQLITE_CONSTRAINT_CHECK => return Self::Validation(detail),
                _ => {}
            }
        }
        Self::Sqlite(err)
    }
}
