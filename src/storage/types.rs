use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors from the metadata cache stores
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Another process holds the cache database lock
    #[error("The metadata cache is locked by another process. Close it and try again.")]
    InstanceLocked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Cached value could not be serialized
    #[error("Failed to encode cached value: {0}")]
    Encode(#[from] serde_json::Error),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Maps lock-related sqlx errors to `InstanceLocked`.
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        if is_lock_error(&err.to_string()) {
            return DatabaseError::InstanceLocked;
        }
        DatabaseError::Other(err)
    }
}

/// SQLITE_BUSY (5), SQLITE_LOCKED (6) and SQLITE_CANTOPEN (14) messages.
pub(crate) fn is_lock_error(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("database is locked")
        || message.contains("database table is locked")
        || message.contains("sqlite_busy")
        || message.contains("sqlite_locked")
        || message.contains("unable to open database file")
}
