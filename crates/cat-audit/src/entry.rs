//! Action log entry types.

use cat_core::{
    ActionCategory, ActionId, ActorId, ConversationId, LogEntryId, MessageId, Timestamp, UserId,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Lifecycle status of a log entry.
///
/// `Executing` is the only non-terminal status; an entry transitions out of
/// it exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogStatus {
    /// The handler is (or was about to start) running.
    Executing,
    /// The handler returned successfully.
    Completed,
    /// The handler failed, threw, was missing, or received bad parameters.
    Failed,
}

impl LogStatus {
    /// Whether this status is terminal.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Executing)
    }
}

impl fmt::Display for LogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Executing => write!(f, "executing"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// One execution attempt, as recorded for the compliance trail.
///
/// Created in [`LogStatus::Executing`] before the handler is even looked
/// up, so the trail reflects attempted actions whether or not the handler
/// ran. A confirmed pending action produces a fresh entry; the two are
/// related only through parameters and timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLogEntry {
    /// Unique entry id.
    pub id: LogEntryId,
    /// The user the action ran on behalf of.
    pub user_id: UserId,
    /// The agent instance that performed the action.
    pub actor_id: ActorId,
    /// The action that was attempted.
    pub action_id: ActionId,
    /// The action's category, denormalized for per-category queries.
    pub category: ActionCategory,
    /// The raw parameters the attempt ran with.
    pub parameters: Value,
    /// Current lifecycle status.
    pub status: LogStatus,
    /// Handler result payload, set on completion.
    pub result: Option<Value>,
    /// Failure detail, set on failure.
    pub error_message: Option<String>,
    /// Sats moved or requested, extracted for payment-category actions.
    pub sats_amount: Option<u64>,
    /// Conversation the triggering message belonged to, when known.
    pub conversation_id: Option<ConversationId>,
    /// The triggering chat message, when known.
    pub message_id: Option<MessageId>,
    /// When execution was about to begin.
    pub started_at: Timestamp,
    /// When the terminal status was written.
    pub completed_at: Option<Timestamp>,
}

impl ActionLogEntry {
    /// Create a fresh entry in `executing` state.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn begin(
        user_id: UserId,
        actor_id: ActorId,
        action_id: ActionId,
        category: ActionCategory,
        parameters: Value,
        sats_amount: Option<u64>,
        conversation_id: Option<ConversationId>,
        message_id: Option<MessageId>,
    ) -> Self {
        Self {
            id: LogEntryId::new(),
            user_id,
            actor_id,
            action_id,
            category,
            parameters,
            status: LogStatus::Executing,
            result: None,
            error_message: None,
            sats_amount,
            conversation_id,
            message_id,
            started_at: Timestamp::now(),
            completed_at: None,
        }
    }
}
