//! Cat Approval - the pending-action ledger.
//!
//! Actions whose effective permission requires confirmation do not execute
//! immediately; the executor parks them here as a [`PendingAction`] and
//! hands the caller a handle. A separate confirm/reject path resolves each
//! entry later - exactly once.
//!
//! # State machine
//!
//! ```text
//! pending ──confirm──▶ confirmed   (execution proceeds)
//!    │───reject───▶ rejected       (terminal, user said no)
//!    └───confirm after expiry──▶ expired   (terminal, lazily detected)
//! ```
//!
//! There is no resurrection from a terminal state, and no background
//! sweeper: expiry is detected when a confirmation attempt arrives, and
//! [`PendingActionStore::live_for_user`] filters stale rows out of display
//! queries on its own.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

/// Error types and results for the approval module.
pub mod error;
pub mod pending;
pub mod store;

pub use error::{ApprovalError, ApprovalResult};
pub use pending::{PendingAction, PendingStatus};
pub use store::{ClaimOutcome, MemoryPendingStore, PendingActionStore};
