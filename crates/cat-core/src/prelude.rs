//! Prelude module - commonly used types for convenient import.
//!
//! Use `use cat_core::prelude::*;` to import all essential types.

// Ids
pub use crate::{
    ActionId, ActorId, ConversationId, LogEntryId, MessageId, PendingActionId, UserId,
};

// Time & classification
pub use crate::{ActionCategory, RiskLevel, Timestamp};
