//! Pending action types.

use cat_core::{
    ActionCategory, ActionId, ConversationId, MessageId, PendingActionId, Timestamp, UserId,
};
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// How long a pending action stays confirmable.
const DEFAULT_TTL_MINUTES: i64 = 15;

/// Lifecycle status of a pending action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingStatus {
    /// Awaiting a human decision.
    Pending,
    /// Confirmed; execution proceeded.
    Confirmed,
    /// Rejected by the user. Terminal.
    Rejected,
    /// Confirmation arrived after expiry. Terminal.
    Expired,
}

impl PendingStatus {
    /// Whether this status admits no further transition.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for PendingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Confirmed => write!(f, "confirmed"),
            Self::Rejected => write!(f, "rejected"),
            Self::Expired => write!(f, "expired"),
        }
    }
}

/// An action parked for human confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingAction {
    /// Unique ledger id, handed to the caller as the confirmation handle.
    pub id: PendingActionId,
    /// The user whose confirmation is awaited.
    pub user_id: UserId,
    /// The action that will run on confirmation.
    pub action_id: ActionId,
    /// The action's category, denormalized alongside the id.
    pub category: ActionCategory,
    /// The raw parameters captured at request time; execution replays these.
    pub parameters: Value,
    /// Human-readable summary shown in the confirmation prompt.
    pub description: String,
    /// Conversation the triggering message belonged to, when known.
    pub conversation_id: Option<ConversationId>,
    /// The triggering chat message, when known.
    pub message_id: Option<MessageId>,
    /// Current lifecycle status.
    pub status: PendingStatus,
    /// When the entry was created.
    pub created_at: Timestamp,
    /// Confirmations after this instant expire instead.
    pub expires_at: Timestamp,
    /// When the entry was confirmed.
    pub confirmed_at: Option<Timestamp>,
    /// When the entry was rejected.
    pub rejected_at: Option<Timestamp>,
    /// Why the user rejected, when they said.
    pub rejection_reason: Option<String>,
}

impl PendingAction {
    /// The default confirmation window.
    #[must_use]
    pub fn default_ttl() -> TimeDelta {
        TimeDelta::minutes(DEFAULT_TTL_MINUTES)
    }

    /// Create a fresh `pending` entry expiring `ttl` from now.
    #[must_use]
    pub fn new(
        user_id: UserId,
        action_id: ActionId,
        category: ActionCategory,
        parameters: Value,
        description: impl Into<String>,
        ttl: TimeDelta,
    ) -> Self {
        let created_at = Timestamp::now();
        Self {
            id: PendingActionId::new(),
            user_id,
            action_id,
            category,
            parameters,
            description: description.into(),
            conversation_id: None,
            message_id: None,
            status: PendingStatus::Pending,
            created_at,
            expires_at: created_at.after(ttl),
            confirmed_at: None,
            rejected_at: None,
            rejection_reason: None,
        }
    }

    /// Whether the confirmation window has closed as of `now`.
    #[must_use]
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at < now
    }
}
