/// Errors that can occur within the storage layer.
///
/// # Examples
///
/// ```rust
/// use vitalmon_storage::error::StorageError;
///
/// let err = StorageError::InvalidRow {
///     column: "severity",
///     detail: "unknown severity: urgent".to_string(),
/// };
/// assert!(err.to_string().contains("severity"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// An error from the database driver, including failed migrations.
    #[error("Storage: database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// JSON serialization or deserialization failed (e.g. preferences_json).
    #[error("Storage: JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The data directory could not be created.
    #[error("Storage: I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored value could not be mapped back to its domain type.
    #[error("Storage: invalid value in column '{column}': {detail}")]
    InvalidRow {
        column: &'static str,
        detail: String,
    },

    /// An insert lost to an existing row with the same alert fingerprint.
    #[error("Storage: an alert with this fingerprint already exists")]
    DuplicateFingerprint,
}

/// Convenience `Result` alias for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
