use cat_core::LogEntryId;

/// Errors that can occur while recording or querying the action log.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// No entry exists with the given id.
    #[error("log entry not found: {0}")]
    NotFound(LogEntryId),

    /// An entry was updated after reaching a terminal status.
    #[error("log entry {entry} is already {status}, refusing second terminal write")]
    AlreadyTerminal {
        /// The entry whose update was refused.
        entry: LogEntryId,
        /// The terminal status it already holds.
        status: String,
    },

    /// Storage backend error (lock poisoned, persistence failed, etc.).
    #[error("storage error: {0}")]
    Storage(String),
}

/// Result type for audit operations.
pub type AuditResult<T> = Result<T, AuditError>;
