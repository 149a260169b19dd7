//! Payments-category handlers.

use async_trait::async_trait;
use cat_catalog::ActionParams;
use cat_core::{ActorId, UserId};
use serde_json::json;

use crate::handler::{ActionHandler, HandlerError, HandlerResult};
use crate::store::AppStore;

/// `send_payment` - move sats from the user's wallet.
pub struct SendPaymentHandler;

#[async_trait]
impl ActionHandler for SendPaymentHandler {
    async fn handle(
        &self,
        store: &dyn AppStore,
        user: &UserId,
        _actor: &ActorId,
        params: ActionParams,
    ) -> HandlerResult {
        let ActionParams::SendPayment(p) = params else {
            return Err(HandlerError::ParameterMismatch);
        };
        let payment_id = store
            .transfer_sats(user, &p.recipient_id, p.amount_sats, p.memo.as_deref())
            .await?;
        Ok(json!({
            "payment_id": payment_id,
            "recipient_id": p.recipient_id,
            "amount_sats": p.amount_sats,
        }))
    }
}

/// `create_invoice` - request sats via an invoice.
pub struct CreateInvoiceHandler;

#[async_trait]
impl ActionHandler for CreateInvoiceHandler {
    async fn handle(
        &self,
        store: &dyn AppStore,
        user: &UserId,
        _actor: &ActorId,
        params: ActionParams,
    ) -> HandlerResult {
        let ActionParams::CreateInvoice(p) = params else {
            return Err(HandlerError::ParameterMismatch);
        };
        let invoice_id = store
            .insert_invoice(user, p.amount_sats, p.memo.as_deref())
            .await?;
        Ok(json!({ "invoice_id": invoice_id, "amount_sats": p.amount_sats }))
    }
}
