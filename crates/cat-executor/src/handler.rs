//! The handler trait and the explicit handler registry.
//!
//! One handler exists per catalog action; the registry is a plain map
//! built at startup, so a missing handler is a checked condition the
//! executor reports as a failed attempt - never a crash.

use async_trait::async_trait;
use cat_catalog::ActionParams;
use cat_core::{ActionId, ActorId, UserId};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::store::{AppStore, StoreError};

/// Errors a handler can return.
///
/// Expected business failures (unknown record, short balance, duplicate
/// name) arrive as [`HandlerError::Store`]; a parameters variant that does
/// not belong to the handler's action is [`HandlerError::ParameterMismatch`].
/// Either way the executor records a failed attempt - handler errors never
/// escape `execute_action`.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// The registry dispatched parameters of a different action here.
    #[error("handler received parameters for a different action")]
    ParameterMismatch,

    /// The data store refused the mutation.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for handler invocations.
pub type HandlerResult = Result<Value, HandlerError>;

/// The side-effect function behind one catalog action.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Perform the action against the data store.
    async fn handle(
        &self,
        store: &dyn AppStore,
        user: &UserId,
        actor: &ActorId,
        params: ActionParams,
    ) -> HandlerResult;
}

/// The startup-built map from action id to handler.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<ActionId, Arc<dyn ActionHandler>>,
}

impl HandlerRegistry {
    /// An empty registry. Tests register their own handlers.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The registry covering every built-in catalog action.
    #[must_use]
    pub fn builtin() -> Self {
        use crate::handlers::{
            ArchiveProductHandler, ClearContextNotesHandler, CreateInvoiceHandler,
            CreateOrganizationHandler, CreateProductHandler, InviteOrganizationMemberHandler,
            PostTimelineUpdateHandler, SaveContextNoteHandler, SendMessageHandler,
            SendPaymentHandler, UpdateNotificationSettingsHandler, UpdateProductHandler,
        };

        let mut registry = Self::empty();
        registry.register("save_context_note", Arc::new(SaveContextNoteHandler));
        registry.register("clear_context_notes", Arc::new(ClearContextNotesHandler));
        registry.register("create_product", Arc::new(CreateProductHandler));
        registry.register("update_product", Arc::new(UpdateProductHandler));
        registry.register("archive_product", Arc::new(ArchiveProductHandler));
        registry.register("send_message", Arc::new(SendMessageHandler));
        registry.register("post_timeline_update", Arc::new(PostTimelineUpdateHandler));
        registry.register("send_payment", Arc::new(SendPaymentHandler));
        registry.register("create_invoice", Arc::new(CreateInvoiceHandler));
        registry.register("create_organization", Arc::new(CreateOrganizationHandler));
        registry.register(
            "invite_organization_member",
            Arc::new(InviteOrganizationMemberHandler),
        );
        registry.register(
            "update_notification_settings",
            Arc::new(UpdateNotificationSettingsHandler),
        );
        registry
    }

    /// Register (or replace) the handler for an action id.
    pub fn register(&mut self, action: impl Into<String>, handler: Arc<dyn ActionHandler>) {
        self.handlers.insert(ActionId::new(action), handler);
    }

    /// Look up the handler for an action id.
    #[must_use]
    pub fn get(&self, action: &ActionId) -> Option<Arc<dyn ActionHandler>> {
        self.handlers.get(action).cloned()
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.len())
            .finish()
    }
}
