//! The action executor state machine.
//!
//! One attempt moves `validating -> {denied | pending_confirmation |
//! executing} -> {completed | failed}`. Within a single call the ordering
//! is fixed and never parallelized: permission check, then audit row,
//! then handler lookup, then handler, then audit completion - so the
//! trail reflects attempted actions even when the handler never ran.

use chrono::TimeDelta;
use std::sync::Arc;

use cat_approval::{ClaimOutcome, PendingAction, PendingActionStore};
use cat_audit::{ActionLogEntry, ActionLogStore, HistoryQuery};
use cat_catalog::{ActionCatalog, ActionDefinition, ActionParams, describe};
use cat_core::{
    ActionCategory, ActorId, ConversationId, LogEntryId, MessageId, PendingActionId, Timestamp,
    UserId,
};
use cat_permissions::PermissionService;
use serde_json::Value;

use crate::error::ExecutorResult;
use crate::handler::HandlerRegistry;
use crate::outcome::{ActionRequest, ExecutionOutcome};
use crate::store::AppStore;

/// Orchestrates evaluator, ledger, handlers and audit log.
///
/// Holds its collaborators behind [`Arc`] handles injected at construction,
/// so a scope can build one per request against shared stores - there is no
/// hidden global state.
pub struct ActionExecutor {
    catalog: Arc<ActionCatalog>,
    permissions: Arc<PermissionService>,
    pending: Arc<dyn PendingActionStore>,
    log: Arc<dyn ActionLogStore>,
    handlers: Arc<HandlerRegistry>,
    app: Arc<dyn AppStore>,
    pending_ttl: TimeDelta,
}

impl ActionExecutor {
    /// Create an executor over the given collaborators.
    #[must_use]
    pub fn new(
        catalog: Arc<ActionCatalog>,
        permissions: Arc<PermissionService>,
        pending: Arc<dyn PendingActionStore>,
        log: Arc<dyn ActionLogStore>,
        handlers: Arc<HandlerRegistry>,
        app: Arc<dyn AppStore>,
    ) -> Self {
        Self {
            catalog,
            permissions,
            pending,
            log,
            handlers,
            app,
            pending_ttl: PendingAction::default_ttl(),
        }
    }

    /// Override how long pending actions stay confirmable.
    #[must_use]
    pub fn with_pending_ttl(mut self, ttl: TimeDelta) -> Self {
        self.pending_ttl = ttl;
        self
    }

    /// Run one action attempt for `user`, performed by `actor`.
    ///
    /// Never returns an error: every failure mode folds into the outcome.
    /// A `pending_confirmation` outcome means the request was accepted and
    /// parked - the side effect has not happened.
    pub async fn execute_action(
        &self,
        user: &UserId,
        actor: &ActorId,
        request: ActionRequest,
    ) -> ExecutionOutcome {
        let Some(def) = self.catalog.get(&request.action_id).cloned() else {
            return ExecutionOutcome::failed(format!("Unknown action: {}", request.action_id));
        };
        if !def.enabled {
            return ExecutionOutcome::failed("Action is disabled");
        }

        let decision = self.permissions.check_permission(user, &def.id).await;
        if !decision.allowed {
            let reason = decision
                .reason
                .unwrap_or_else(|| "Permission not granted".to_string());
            tracing::debug!(user = %user, action = %def.id, %reason, "action denied");
            return ExecutionOutcome::denied(reason);
        }

        // Per-action payment cap from the matched grant.
        if let Some(cap) = decision.max_sats_per_action
            && let Some(amount) = sats_amount_of(&def, &request.parameters)
            && amount > cap
        {
            return ExecutionOutcome::denied(format!(
                "Amount {amount} sats exceeds the per-action cap of {cap} sats"
            ));
        }

        if decision.requires_confirmation {
            return self.park_for_confirmation(user, &def, request).await;
        }

        self.perform_action(
            user,
            actor,
            &def,
            request.parameters,
            request.conversation_id,
            request.message_id,
        )
        .await
    }

    /// Confirm a parked action and execute it.
    ///
    /// The ledger claim is atomic on `status = pending`: of two concurrent
    /// confirmations, exactly one proceeds and the other fails the lookup.
    pub async fn confirm_pending_action(
        &self,
        user: &UserId,
        actor: &ActorId,
        id: &PendingActionId,
    ) -> ExecutionOutcome {
        let claim = match self
            .pending
            .claim_for_confirmation(user, id, Timestamp::now())
            .await
        {
            Ok(claim) => claim,
            Err(e) => {
                tracing::warn!(user = %user, pending = %id, error = %e, "pending claim failed");
                return ExecutionOutcome::failed("Could not look up the pending action");
            },
        };

        let row = match claim {
            ClaimOutcome::NotPending => {
                return ExecutionOutcome::failed(
                    "Pending action not found or already processed",
                );
            },
            ClaimOutcome::Expired(_) => {
                tracing::debug!(user = %user, pending = %id, "confirmation arrived after expiry");
                return ExecutionOutcome::failed("Action has expired");
            },
            ClaimOutcome::Confirmed(row) => row,
        };

        // Re-resolve the definition: it may have been disabled since the
        // entry was created.
        let Some(def) = self.catalog.get(&row.action_id).cloned() else {
            return ExecutionOutcome::failed("Action is no longer available");
        };
        if !def.enabled {
            return ExecutionOutcome::failed("Action is no longer available");
        }

        self.perform_action(
            user,
            actor,
            &def,
            row.parameters,
            row.conversation_id,
            row.message_id,
        )
        .await
    }

    /// Reject a parked action. No side effect runs, the entry turns
    /// terminal.
    pub async fn reject_pending_action(
        &self,
        user: &UserId,
        id: &PendingActionId,
        reason: Option<String>,
    ) -> ExecutionOutcome {
        match self
            .pending
            .reject(user, id, reason, Timestamp::now())
            .await
        {
            Ok(Some(_)) => ExecutionOutcome::rejected(),
            Ok(None) => {
                ExecutionOutcome::failed("Pending action not found or already processed")
            },
            Err(e) => {
                tracing::warn!(user = %user, pending = %id, error = %e, "pending reject failed");
                ExecutionOutcome::failed("Could not look up the pending action")
            },
        }
    }

    /// The user's confirmable pending actions, newest first. Rows already
    /// past expiry self-filter out of the listing.
    pub async fn pending_actions(&self, user: &UserId) -> ExecutorResult<Vec<PendingAction>> {
        Ok(self.pending.live_for_user(user, Timestamp::now()).await?)
    }

    /// The user's execution history, newest first.
    pub async fn action_history(
        &self,
        user: &UserId,
        query: &HistoryQuery,
    ) -> ExecutorResult<Vec<ActionLogEntry>> {
        Ok(self.log.history(user, query).await?)
    }

    /// Park a request in the pending-action ledger.
    async fn park_for_confirmation(
        &self,
        user: &UserId,
        def: &ActionDefinition,
        request: ActionRequest,
    ) -> ExecutionOutcome {
        let description = describe(def, &request.parameters);
        let mut entry = PendingAction::new(
            user.clone(),
            def.id.clone(),
            def.category,
            request.parameters,
            description.clone(),
            self.pending_ttl,
        );
        entry.conversation_id = request.conversation_id;
        entry.message_id = request.message_id;

        match self.pending.insert(&entry).await {
            Ok(()) => {
                tracing::debug!(user = %user, action = %def.id, pending = %entry.id, "parked for confirmation");
                ExecutionOutcome::pending_confirmation(entry.id, description)
            },
            Err(e) => {
                tracing::warn!(user = %user, action = %def.id, error = %e, "pending insert failed");
                ExecutionOutcome::failed("Could not queue the action for confirmation")
            },
        }
    }

    /// Shared tail of the immediate and confirmation paths: audit row,
    /// handler lookup, handler, audit completion.
    async fn perform_action(
        &self,
        user: &UserId,
        actor: &ActorId,
        def: &ActionDefinition,
        parameters: Value,
        conversation_id: Option<ConversationId>,
        message_id: Option<MessageId>,
    ) -> ExecutionOutcome {
        let entry = ActionLogEntry::begin(
            user.clone(),
            actor.clone(),
            def.id.clone(),
            def.category,
            parameters.clone(),
            sats_amount_of(def, &parameters),
            conversation_id,
            message_id,
        );

        // Audit is best-effort relative to the mutation - except for
        // payments, where money moving without a trail is the worse
        // failure and the attempt aborts instead.
        let log_id = match self.log.insert(&entry).await {
            Ok(()) => Some(entry.id.clone()),
            Err(e) if def.category == ActionCategory::Payments => {
                tracing::error!(user = %user, action = %def.id, error = %e, "audit insert failed, aborting payment");
                return ExecutionOutcome::failed("Could not record the action; payment aborted");
            },
            Err(e) => {
                tracing::warn!(user = %user, action = %def.id, error = %e, "audit insert failed, proceeding without trail");
                None
            },
        };

        let params = match ActionParams::parse(&def.id, &parameters) {
            Ok(params) => params,
            Err(e) => {
                let error = e.to_string();
                self.finish_failed(log_id.as_ref(), &error).await;
                return ExecutionOutcome::failed(error);
            },
        };

        let Some(handler) = self.handlers.get(&def.id) else {
            self.finish_failed(log_id.as_ref(), "No handler implemented")
                .await;
            return ExecutionOutcome::failed("No handler implemented");
        };

        match handler.handle(self.app.as_ref(), user, actor, params).await {
            Ok(data) => {
                if let Some(id) = log_id.as_ref()
                    && let Err(e) = self
                        .log
                        .mark_completed(id, Some(data.clone()), Timestamp::now())
                        .await
                {
                    tracing::warn!(entry = %id, error = %e, "audit completion write failed");
                }
                tracing::info!(user = %user, action = %def.id, "action completed");
                ExecutionOutcome::completed(data)
            },
            Err(e) => {
                let error = e.to_string();
                self.finish_failed(log_id.as_ref(), &error).await;
                tracing::info!(user = %user, action = %def.id, %error, "action failed");
                ExecutionOutcome::failed(error)
            },
        }
    }

    async fn finish_failed(&self, log_id: Option<&LogEntryId>, error: &str) {
        if let Some(id) = log_id
            && let Err(e) = self.log.mark_failed(id, error, Timestamp::now()).await
        {
            tracing::warn!(entry = %id, error = %e, "audit failure write failed");
        }
    }
}

impl std::fmt::Debug for ActionExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionExecutor")
            .field("catalog", &self.catalog.len())
            .field("handlers", &self.handlers.len())
            .finish_non_exhaustive()
    }
}

/// Sats an attempt would move, extracted for payment-category actions only.
fn sats_amount_of(def: &ActionDefinition, parameters: &Value) -> Option<u64> {
    if def.category == ActionCategory::Payments {
        parameters.get("amount_sats").and_then(Value::as_u64)
    } else {
        None
    }
}
