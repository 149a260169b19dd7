use cat_approval::ApprovalError;
use cat_audit::AuditError;

/// Errors surfaced by the executor's read-only query methods.
///
/// The action paths (`execute_action`, `confirm_pending_action`,
/// `reject_pending_action`) never return this - they fold every failure
/// into an [`ExecutionOutcome`](crate::ExecutionOutcome).
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    /// The pending-action ledger failed.
    #[error(transparent)]
    Approval(#[from] ApprovalError),

    /// The action log failed.
    #[error(transparent)]
    Audit(#[from] AuditError),
}

/// Result type for executor queries.
pub type ExecutorResult<T> = Result<T, ExecutorError>;
