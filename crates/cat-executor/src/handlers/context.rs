//! Context-category handlers.

use async_trait::async_trait;
use cat_catalog::ActionParams;
use cat_core::{ActorId, UserId};
use serde_json::json;

use crate::handler::{ActionHandler, HandlerError, HandlerResult};
use crate::store::AppStore;

/// `save_context_note` - remember something the user said.
pub struct SaveContextNoteHandler;

#[async_trait]
impl ActionHandler for SaveContextNoteHandler {
    async fn handle(
        &self,
        store: &dyn AppStore,
        user: &UserId,
        _actor: &ActorId,
        params: ActionParams,
    ) -> HandlerResult {
        let ActionParams::SaveContextNote(p) = params else {
            return Err(HandlerError::ParameterMismatch);
        };
        let note_id = store.insert_context_note(user, &p.note).await?;
        Ok(json!({ "note_id": note_id }))
    }
}

/// `clear_context_notes` - forget everything remembered so far.
pub struct ClearContextNotesHandler;

#[async_trait]
impl ActionHandler for ClearContextNotesHandler {
    async fn handle(
        &self,
        store: &dyn AppStore,
        user: &UserId,
        _actor: &ActorId,
        params: ActionParams,
    ) -> HandlerResult {
        let ActionParams::ClearContextNotes = params else {
            return Err(HandlerError::ParameterMismatch);
        };
        let cleared = store.clear_context_notes(user).await?;
        Ok(json!({ "cleared": cleared }))
    }
}
