//! Human-readable action descriptions for confirmation prompts.
//!
//! A pure function over `(definition, raw parameters)`. Templates exist for
//! the user-facing actions; anything else degrades to a generic
//! `Execute {name}` so adding a catalog entry never breaks the
//! confirmation flow.

use serde_json::Value;

use crate::catalog::ActionDefinition;

/// Render a one-line summary of what confirming this action would do.
#[must_use]
pub fn describe(def: &ActionDefinition, params: &Value) -> String {
    let fallback = || format!("Execute {}", def.name);

    match def.id.as_str() {
        "send_payment" => match (u64_field(params, "amount_sats"), str_field(params, "recipient_id")) {
            (Some(amount), Some(recipient)) => format!("Send {amount} sats to {recipient}"),
            _ => fallback(),
        },
        "create_invoice" => u64_field(params, "amount_sats")
            .map_or_else(fallback, |amount| {
                format!("Request an invoice for {amount} sats")
            }),
        "send_message" => str_field(params, "recipient_id")
            .map_or_else(fallback, |recipient| {
                format!("Send a message to {recipient}")
            }),
        "post_timeline_update" => "Post an update to your timeline".to_string(),
        "create_product" => str_field(params, "title")
            .map_or_else(fallback, |title| format!("Create listing \"{title}\"")),
        "update_product" => str_field(params, "product_id")
            .map_or_else(fallback, |id| format!("Update listing {id}")),
        "archive_product" => str_field(params, "product_id")
            .map_or_else(fallback, |id| format!("Archive listing {id}")),
        "create_organization" => str_field(params, "name")
            .map_or_else(fallback, |name| format!("Create organization \"{name}\"")),
        "invite_organization_member" => match (
            str_field(params, "invitee_id"),
            str_field(params, "organization_id"),
        ) {
            (Some(invitee), Some(org)) => format!("Invite {invitee} to organization {org}"),
            _ => fallback(),
        },
        _ => fallback(),
    }
}

fn str_field<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params.get(key).and_then(Value::as_str)
}

fn u64_field(params: &Value, key: &str) -> Option<u64> {
    params.get(key).and_then(Value::as_u64)
}
