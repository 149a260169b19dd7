//! Settings-category handlers.

use async_trait::async_trait;
use cat_catalog::ActionParams;
use cat_core::{ActorId, UserId};
use serde_json::json;

use crate::handler::{ActionHandler, HandlerError, HandlerResult};
use crate::store::AppStore;

/// `update_notification_settings` - patch the user's notification toggles.
pub struct UpdateNotificationSettingsHandler;

#[async_trait]
impl ActionHandler for UpdateNotificationSettingsHandler {
    async fn handle(
        &self,
        store: &dyn AppStore,
        user: &UserId,
        _actor: &ActorId,
        params: ActionParams,
    ) -> HandlerResult {
        let ActionParams::UpdateNotificationSettings(p) = params else {
            return Err(HandlerError::ParameterMismatch);
        };
        store
            .update_notification_settings(user, p.email_enabled, p.push_enabled, p.dm_enabled)
            .await?;
        Ok(json!({ "updated": true }))
    }
}
