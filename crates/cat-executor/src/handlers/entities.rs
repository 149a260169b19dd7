//! Entities-category handlers: listings.

use async_trait::async_trait;
use cat_catalog::ActionParams;
use cat_core::{ActorId, UserId};
use serde_json::json;

use crate::handler::{ActionHandler, HandlerError, HandlerResult};
use crate::store::AppStore;

/// `create_product` - create a listing owned by the user.
pub struct CreateProductHandler;

#[async_trait]
impl ActionHandler for CreateProductHandler {
    async fn handle(
        &self,
        store: &dyn AppStore,
        user: &UserId,
        _actor: &ActorId,
        params: ActionParams,
    ) -> HandlerResult {
        let ActionParams::CreateProduct(p) = params else {
            return Err(HandlerError::ParameterMismatch);
        };
        let product_id = store
            .insert_product(user, &p.title, p.description.as_deref(), p.price_sats)
            .await?;
        Ok(json!({ "product_id": product_id, "title": p.title }))
    }
}

/// `update_product` - patch a listing the user owns.
pub struct UpdateProductHandler;

#[async_trait]
impl ActionHandler for UpdateProductHandler {
    async fn handle(
        &self,
        store: &dyn AppStore,
        user: &UserId,
        _actor: &ActorId,
        params: ActionParams,
    ) -> HandlerResult {
        let ActionParams::UpdateProduct(p) = params else {
            return Err(HandlerError::ParameterMismatch);
        };
        store
            .update_product(
                user,
                &p.product_id,
                p.title.as_deref(),
                p.description.as_deref(),
                p.price_sats,
            )
            .await?;
        Ok(json!({ "product_id": p.product_id }))
    }
}

/// `archive_product` - take a listing off the market.
pub struct ArchiveProductHandler;

#[async_trait]
impl ActionHandler for ArchiveProductHandler {
    async fn handle(
        &self,
        store: &dyn AppStore,
        user: &UserId,
        _actor: &ActorId,
        params: ActionParams,
    ) -> HandlerResult {
        let ActionParams::ArchiveProduct(p) = params else {
            return Err(HandlerError::ParameterMismatch);
        };
        store.archive_product(user, &p.product_id).await?;
        Ok(json!({ "product_id": p.product_id, "archived": true }))
    }
}
