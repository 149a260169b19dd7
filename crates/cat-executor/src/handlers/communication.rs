//! Communication-category handlers: messages and timeline posts.

use async_trait::async_trait;
use cat_catalog::ActionParams;
use cat_core::{ActorId, UserId};
use serde_json::json;

use crate::handler::{ActionHandler, HandlerError, HandlerResult};
use crate::store::AppStore;

/// `send_message` - deliver a direct message from the user.
pub struct SendMessageHandler;

#[async_trait]
impl ActionHandler for SendMessageHandler {
    async fn handle(
        &self,
        store: &dyn AppStore,
        user: &UserId,
        _actor: &ActorId,
        params: ActionParams,
    ) -> HandlerResult {
        let ActionParams::SendMessage(p) = params else {
            return Err(HandlerError::ParameterMismatch);
        };
        let message_id = store
            .insert_message(user, &p.recipient_id, &p.content)
            .await?;
        Ok(json!({ "message_id": message_id, "recipient_id": p.recipient_id }))
    }
}

/// `post_timeline_update` - publish a post on the user's timeline.
pub struct PostTimelineUpdateHandler;

#[async_trait]
impl ActionHandler for PostTimelineUpdateHandler {
    async fn handle(
        &self,
        store: &dyn AppStore,
        user: &UserId,
        _actor: &ActorId,
        params: ActionParams,
    ) -> HandlerResult {
        let ActionParams::PostTimelineUpdate(p) = params else {
            return Err(HandlerError::ParameterMismatch);
        };
        let post_id = store.insert_timeline_post(user, &p.content).await?;
        Ok(json!({ "post_id": post_id }))
    }
}
