//! Per-action typed parameter schemas.
//!
//! The action-block parser hands the executor an opaque JSON object; this
//! module is where that payload meets a schema. [`ActionParams::parse`] is
//! keyed by action id, so handlers downstream can assume well-typed input
//! and a malformed payload fails before any side effect.

use cat_core::{ActionId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CatalogError, CatalogResult};

/// Parameters for `save_context_note`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveContextNoteParams {
    /// The note to remember.
    pub note: String,
}

/// Parameters for `create_product`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProductParams {
    /// Listing title.
    pub title: String,
    /// Optional long-form description.
    pub description: Option<String>,
    /// Asking price, in sats.
    pub price_sats: Option<u64>,
}

/// Parameters for `update_product`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProductParams {
    /// The listing being updated.
    pub product_id: String,
    /// New title, if changing.
    pub title: Option<String>,
    /// New description, if changing.
    pub description: Option<String>,
    /// New price, if changing.
    pub price_sats: Option<u64>,
}

/// Parameters for `archive_product`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveProductParams {
    /// The listing being archived.
    pub product_id: String,
}

/// Parameters for `send_message`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageParams {
    /// The user receiving the message.
    pub recipient_id: UserId,
    /// Message body.
    pub content: String,
}

/// Parameters for `post_timeline_update`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostTimelineUpdateParams {
    /// Post body.
    pub content: String,
}

/// Parameters for `send_payment`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendPaymentParams {
    /// The user receiving the sats.
    pub recipient_id: UserId,
    /// Amount to transfer, in sats.
    pub amount_sats: u64,
    /// Optional memo attached to the transfer.
    pub memo: Option<String>,
}

/// Parameters for `create_invoice`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInvoiceParams {
    /// Requested amount, in sats.
    pub amount_sats: u64,
    /// Optional memo shown to the payer.
    pub memo: Option<String>,
}

/// Parameters for `create_organization`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrganizationParams {
    /// Organization name. Must be unique.
    pub name: String,
    /// Optional description.
    pub about: Option<String>,
}

/// Parameters for `invite_organization_member`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InviteOrganizationMemberParams {
    /// The organization extending the invite.
    pub organization_id: String,
    /// The user being invited.
    pub invitee_id: UserId,
    /// Optional role label, defaults to `member`.
    pub role: Option<String>,
}

/// Parameters for `update_notification_settings`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateNotificationSettingsParams {
    /// Email notifications on/off.
    pub email_enabled: Option<bool>,
    /// Push notifications on/off.
    pub push_enabled: Option<bool>,
    /// Direct-message notifications on/off.
    pub dm_enabled: Option<bool>,
}

/// Validated, per-action parameters - the tagged union handlers receive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ActionParams {
    /// `save_context_note`
    SaveContextNote(SaveContextNoteParams),
    /// `clear_context_notes` (takes no parameters)
    ClearContextNotes,
    /// `create_product`
    CreateProduct(CreateProductParams),
    /// `update_product`
    UpdateProduct(UpdateProductParams),
    /// `archive_product`
    ArchiveProduct(ArchiveProductParams),
    /// `send_message`
    SendMessage(SendMessageParams),
    /// `post_timeline_update`
    PostTimelineUpdate(PostTimelineUpdateParams),
    /// `send_payment`
    SendPayment(SendPaymentParams),
    /// `create_invoice`
    CreateInvoice(CreateInvoiceParams),
    /// `create_organization`
    CreateOrganization(CreateOrganizationParams),
    /// `invite_organization_member`
    InviteOrganizationMember(InviteOrganizationMemberParams),
    /// `update_notification_settings`
    UpdateNotificationSettings(UpdateNotificationSettingsParams),
}

impl ActionParams {
    /// Parse an opaque JSON payload against the schema of `action`.
    ///
    /// # Errors
    ///
    /// [`CatalogError::UnknownAction`] when no schema exists for the id,
    /// [`CatalogError::InvalidParameters`] when the payload is not an object
    /// or does not satisfy the schema.
    pub fn parse(action: &ActionId, value: &Value) -> CatalogResult<Self> {
        if !value.is_object() {
            return Err(CatalogError::InvalidParameters {
                action: action.as_str().to_string(),
                reason: "parameters must be a JSON object".to_string(),
            });
        }

        let invalid = |e: serde_json::Error| CatalogError::InvalidParameters {
            action: action.as_str().to_string(),
            reason: e.to_string(),
        };

        match action.as_str() {
            "save_context_note" => Ok(Self::SaveContextNote(
                serde_json::from_value(value.clone()).map_err(invalid)?,
            )),
            "clear_context_notes" => Ok(Self::ClearContextNotes),
            "create_product" => Ok(Self::CreateProduct(
                serde_json::from_value(value.clone()).map_err(invalid)?,
            )),
            "update_product" => Ok(Self::UpdateProduct(
                serde_json::from_value(value.clone()).map_err(invalid)?,
            )),
            "archive_product" => Ok(Self::ArchiveProduct(
                serde_json::from_value(value.clone()).map_err(invalid)?,
            )),
            "send_message" => Ok(Self::SendMessage(
                serde_json::from_value(value.clone()).map_err(invalid)?,
            )),
            "post_timeline_update" => Ok(Self::PostTimelineUpdate(
                serde_json::from_value(value.clone()).map_err(invalid)?,
            )),
            "send_payment" => Ok(Self::SendPayment(
                serde_json::from_value(value.clone()).map_err(invalid)?,
            )),
            "create_invoice" => Ok(Self::CreateInvoice(
                serde_json::from_value(value.clone()).map_err(invalid)?,
            )),
            "create_organization" => Ok(Self::CreateOrganization(
                serde_json::from_value(value.clone()).map_err(invalid)?,
            )),
            "invite_organization_member" => Ok(Self::InviteOrganizationMember(
                serde_json::from_value(value.clone()).map_err(invalid)?,
            )),
            "update_notification_settings" => Ok(Self::UpdateNotificationSettings(
                serde_json::from_value(value.clone()).map_err(invalid)?,
            )),
            other => Err(CatalogError::UnknownAction(other.to_string())),
        }
    }

    /// The sats amount this action would move or request, if any.
    ///
    /// Used to populate the audit row's `sats_amount` and to enforce
    /// per-action payment caps.
    #[must_use]
    pub fn sats_amount(&self) -> Option<u64> {
        match self {
            Self::SendPayment(p) => Some(p.amount_sats),
            Self::CreateInvoice(p) => Some(p.amount_sats),
            _ => None,
        }
    }
}
