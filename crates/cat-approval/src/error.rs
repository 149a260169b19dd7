/// Errors that can occur in the pending-action ledger.
#[derive(Debug, thiserror::Error)]
pub enum ApprovalError {
    /// Storage backend error (lock poisoned, persistence failed, etc.).
    #[error("storage error: {0}")]
    Storage(String),
}

/// Result type for approval operations.
pub type ApprovalResult<T> = Result<T, ApprovalError>;
