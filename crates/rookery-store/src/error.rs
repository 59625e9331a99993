use rusqlite::ffi;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique or primary-key constraint rejected the write.
    #[error("row already exists")]
    Conflict,
    #[error("database lock poisoned")]
    Poisoned,
    #[error("corrupt row: {0}")]
    Corrupt(String),
    #[error("sqlite error: {0}")]
    Sqlite(rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        match &e {
            rusqlite::Error::SqliteFailure(err, _)
                if err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                    || err.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
            {
                StoreError::Conflict
            }
            _ => StoreError::Sqlite(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
