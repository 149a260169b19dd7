/// Errors that can occur while reading or writing permission grants.
#[derive(Debug, thiserror::Error)]
pub enum PermissionError {
    /// Storage backend error (lock poisoned, persistence failed, etc.).
    #[error("storage error: {0}")]
    Storage(String),
}

/// Result type for permission operations.
pub type PermissionResult<T> = Result<T, PermissionError>;
