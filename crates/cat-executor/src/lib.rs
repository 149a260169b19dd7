//! Cat Executor - turns validated action requests into side effects.
//!
//! The executor is the single seam between the chat/LLM layer and the
//! user's data. It orchestrates the permission evaluator, the
//! pending-action ledger, the per-action handlers and the audit log:
//!
//! ```text
//! execute_action
//!   ├─ catalog lookup        (unknown/disabled -> failed)
//!   ├─ check_permission      (not allowed -> denied)
//!   ├─ requires confirmation -> pending ledger, return handle
//!   └─ perform_action
//!        ├─ audit row (executing)
//!        ├─ parse typed parameters
//!        ├─ handler lookup + invoke
//!        └─ audit row -> completed | failed
//! ```
//!
//! `confirm_pending_action` resolves parked entries through the same
//! `perform_action` tail; `reject_pending_action` turns them terminal
//! without side effects. Nothing above this crate ever sees a raw error
//! from an action path - every method returns a discriminated
//! [`ExecutionOutcome`].

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

/// Error types and results for executor queries.
pub mod error;
pub mod executor;
pub mod handler;
pub mod handlers;
pub mod outcome;
pub mod store;

pub use error::{ExecutorError, ExecutorResult};
pub use executor::ActionExecutor;
pub use handler::{ActionHandler, HandlerError, HandlerRegistry, HandlerResult};
pub use outcome::{ActionRequest, ExecutionOutcome, ExecutionStatus};
pub use store::{
    AppStore, MemoryAppStore, MessageRecord, OrganizationRecord, PaymentRecord, ProductRecord,
    StoreError, StoreResult,
};
