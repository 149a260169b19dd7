//! Executor request and result types.

use cat_core::{ActionId, ConversationId, MessageId, PendingActionId};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;

/// A validated action request, as handed over by the action-block parser.
///
/// `parameters` is guaranteed by the parser to be a plain JSON object;
/// schema validation against the action happens inside the executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRequest {
    /// The action to run.
    pub action_id: ActionId,
    /// Raw parameters for the action.
    pub parameters: Value,
    /// Conversation the triggering message belonged to, when known.
    pub conversation_id: Option<ConversationId>,
    /// The triggering chat message, when known.
    pub message_id: Option<MessageId>,
}

impl ActionRequest {
    /// Create a request with no conversation context.
    #[must_use]
    pub fn new(action_id: impl Into<String>, parameters: Value) -> Self {
        Self {
            action_id: ActionId::new(action_id),
            parameters,
            conversation_id: None,
            message_id: None,
        }
    }

    /// Attach the originating conversation.
    #[must_use]
    pub fn with_conversation(mut self, conversation_id: ConversationId) -> Self {
        self.conversation_id = Some(conversation_id);
        self
    }

    /// Attach the originating message.
    #[must_use]
    pub fn with_message(mut self, message_id: MessageId) -> Self {
        self.message_id = Some(message_id);
        self
    }
}

/// Where an action attempt ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Permission check said no. Nothing ran, nothing was logged.
    Denied,
    /// Parked in the pending-action ledger awaiting human confirmation.
    PendingConfirmation,
    /// The handler ran and succeeded.
    Completed,
    /// The attempt failed: unknown action, bad parameters, missing or
    /// failing handler, or infrastructure trouble.
    Failed,
    /// A pending action was rejected by the user (reject path only).
    Rejected,
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Denied => write!(f, "denied"),
            Self::PendingConfirmation => write!(f, "pending_confirmation"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// The discriminated result every executor action path returns.
///
/// `success` means "the pipeline accepted the request", not "the side
/// effect happened" - a parked confirmation is `success: true` with
/// status [`ExecutionStatus::PendingConfirmation`]. Callers must branch
/// on `status` to know whether the mutation ran.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    /// Whether the pipeline accepted the request.
    pub success: bool,
    /// Where the attempt ended up.
    pub status: ExecutionStatus,
    /// Handler result payload, or the confirmation description.
    pub data: Option<Value>,
    /// Display-ready failure or denial reason.
    pub error: Option<String>,
    /// Handle for the confirm/reject path, set on `pending_confirmation`.
    pub pending_action_id: Option<PendingActionId>,
}

impl ExecutionOutcome {
    /// Permission denied.
    #[must_use]
    pub fn denied(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            status: ExecutionStatus::Denied,
            data: None,
            error: Some(reason.into()),
            pending_action_id: None,
        }
    }

    /// The attempt failed.
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            status: ExecutionStatus::Failed,
            data: None,
            error: Some(error.into()),
            pending_action_id: None,
        }
    }

    /// The handler completed with a result payload.
    #[must_use]
    pub fn completed(data: Value) -> Self {
        Self {
            success: true,
            status: ExecutionStatus::Completed,
            data: Some(data),
            error: None,
            pending_action_id: None,
        }
    }

    /// Parked for confirmation; `description` is what the user will see.
    #[must_use]
    pub fn pending_confirmation(id: PendingActionId, description: impl Into<String>) -> Self {
        Self {
            success: true,
            status: ExecutionStatus::PendingConfirmation,
            data: Some(json!({ "description": description.into() })),
            error: None,
            pending_action_id: Some(id),
        }
    }

    /// A pending action was rejected at the user's request.
    #[must_use]
    pub fn rejected() -> Self {
        Self {
            success: true,
            status: ExecutionStatus::Rejected,
            data: None,
            error: None,
            pending_action_id: None,
        }
    }

    /// Whether the side effect actually ran.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == ExecutionStatus::Completed
    }

    /// Whether the attempt is parked awaiting confirmation.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == ExecutionStatus::PendingConfirmation
    }
}
