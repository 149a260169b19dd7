//! Cat Core - Foundation types for the Cat agentic-action pipeline.
//!
//! This crate provides the vocabulary shared by every pipeline crate:
//!
//! - Id newtypes for records owned by the surrounding application
//!   ([`UserId`], [`ActorId`], [`ConversationId`], [`MessageId`]) and for
//!   records this pipeline mints itself ([`PendingActionId`], [`LogEntryId`])
//! - [`ActionId`] - the name of an executable agent action
//! - [`Timestamp`] - UTC wall-clock time with a local-midnight helper for
//!   daily quota windows
//! - [`RiskLevel`] - static risk classification driving confirmation defaults
//! - [`ActionCategory`] - the permission surface an action belongs to,
//!   carrying the built-in default-permission table

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod types;

pub use types::{
    ActionCategory, ActionId, ActorId, ConversationId, LogEntryId, MessageId, PendingActionId,
    RiskLevel, Timestamp, UserId,
};
