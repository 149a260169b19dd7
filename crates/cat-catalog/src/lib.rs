//! Cat Catalog - the static action catalog.
//!
//! Declares every action the assistant may execute on a user's behalf:
//!
//! - [`ActionDefinition`] - id, category, risk level, confirmation default,
//!   enabled flag. Pure data, immutable after load.
//! - [`ActionCatalog`] - the lookup table built at process start from the
//!   built-in set, optionally overlaid with a TOML config that disables
//!   actions or overrides confirmation defaults.
//! - [`ActionParams`] - per-action typed parameter schemas, parsed from the
//!   opaque JSON the action-block parser hands over.
//! - [`describe`] - the pure description generator used for confirmation
//!   prompts.
//!
//! # Example
//!
//! ```
//! use cat_catalog::{ActionCatalog, ActionParams};
//! use cat_core::ActionId;
//!
//! let catalog = ActionCatalog::builtin();
//! let action = ActionId::new("send_payment");
//! let def = catalog.get(&action).expect("built-in action");
//! assert!(def.requires_confirmation);
//!
//! let params = ActionParams::parse(
//!     &action,
//!     &serde_json::json!({"recipient_id": "u_2", "amount_sats": 500}),
//! )
//! .expect("well-formed parameters");
//! assert_eq!(params.sats_amount(), Some(500));
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod catalog;
pub mod describe;
/// Error types and results for catalog operations.
pub mod error;
pub mod params;

pub use catalog::{ActionCatalog, ActionDefinition, ActionOverride, CatalogOverlay};
pub use describe::describe;
pub use error::{CatalogError, CatalogResult};
pub use params::{
    ActionParams, ArchiveProductParams, CreateInvoiceParams, CreateOrganizationParams,
    CreateProductParams, InviteOrganizationMemberParams, PostTimelineUpdateParams,
    SaveContextNoteParams, SendMessageParams, SendPaymentParams, UpdateNotificationSettingsParams,
    UpdateProductParams,
};
