//! Cat Permissions - per-user grants and the permission evaluator.
//!
//! Grants exist at two granularities: a specific action, or a whole
//! category via the `*` wildcard subject. Evaluation walks three tiers,
//! first match wins:
//!
//! 1. the specific-action grant (also the only tier carrying a daily quota)
//! 2. the category-wide grant
//! 3. the built-in default table (`context` allowed, everything else denied)
//!
//! This lets a user grant broad category access quickly, then tighten
//! individual actions, without pre-populating a row for every action.
//!
//! [`PermissionService::check_permission`] is a total function: unknown
//! actions, disabled actions and store failures all come back as denials
//! with a display-ready reason, never as an error or panic.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

/// Error types and results for the permission module.
pub mod error;
pub mod grant;
pub mod service;

pub use error::{PermissionError, PermissionResult};
pub use grant::{GrantOptions, GrantStore, GrantSubject, MemoryGrantStore, PermissionGrant};
pub use service::{CategorySummary, PermissionDecision, PermissionService, PermissionSummary};
