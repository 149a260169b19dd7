//! Pending-action storage port and in-memory adapter.
//!
//! The confirm path's race guard lives here: `claim_for_confirmation` is a
//! single conditional transition on `status = pending`, so of two
//! concurrent confirmation attempts only one can observe the pending row.
//! Implementations backed by a database must express it as a conditional
//! update with an affected-row check, never as separate read and write
//! calls.

use async_trait::async_trait;
use cat_core::{PendingActionId, Timestamp, UserId};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::ApprovalResult;
use crate::pending::{PendingAction, PendingStatus};

/// Result of an atomic confirmation claim.
#[derive(Debug)]
pub enum ClaimOutcome {
    /// The row was pending and in its window; it is now `confirmed`.
    Confirmed(PendingAction),
    /// The row was pending but past expiry; it is now `expired`.
    Expired(PendingAction),
    /// No pending row matched - unknown id, another user's entry, or a
    /// lost race with an earlier resolution. Deliberately
    /// indistinguishable.
    NotPending,
}

/// Storage port for the pending-action ledger.
#[async_trait]
pub trait PendingActionStore: Send + Sync {
    /// Insert a fresh `pending` entry.
    async fn insert(&self, action: &PendingAction) -> ApprovalResult<()>;

    /// Fetch an entry in any status, scoped to its owner.
    async fn get(
        &self,
        user: &UserId,
        id: &PendingActionId,
    ) -> ApprovalResult<Option<PendingAction>>;

    /// Atomically resolve a confirmation attempt.
    ///
    /// Transitions `pending -> confirmed` (setting `confirmed_at = now`),
    /// or `pending -> expired` when `now` is past the window. Rows in any
    /// other status yield [`ClaimOutcome::NotPending`].
    async fn claim_for_confirmation(
        &self,
        user: &UserId,
        id: &PendingActionId,
        now: Timestamp,
    ) -> ApprovalResult<ClaimOutcome>;

    /// Atomically transition `pending -> rejected`, recording the reason
    /// and timestamp. Returns the updated row, or `None` when no pending
    /// row matched.
    async fn reject(
        &self,
        user: &UserId,
        id: &PendingActionId,
        reason: Option<String>,
        now: Timestamp,
    ) -> ApprovalResult<Option<PendingAction>>;

    /// A user's confirmable entries: `pending` and inside their window,
    /// newest first. Already-expired rows self-filter out of the listing
    /// without needing a background sweep.
    async fn live_for_user(
        &self,
        user: &UserId,
        now: Timestamp,
    ) -> ApprovalResult<Vec<PendingAction>>;
}

/// In-memory pending-action ledger. Thread-safe via an internal [`RwLock`];
/// both resolution methods mutate under a single write lock.
#[derive(Default)]
pub struct MemoryPendingStore {
    actions: RwLock<HashMap<PendingActionId, PendingAction>>,
}

impl MemoryPendingStore {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries in any status.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read_actions().len()
    }

    /// Whether the ledger is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_actions(&self) -> std::sync::RwLockReadGuard<'_, HashMap<PendingActionId, PendingAction>> {
        self.actions.read().unwrap_or_else(|e| {
            tracing::warn!("MemoryPendingStore read lock poisoned, recovering");
            e.into_inner()
        })
    }

    fn write_actions(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, HashMap<PendingActionId, PendingAction>> {
        self.actions.write().unwrap_or_else(|e| {
            tracing::warn!("MemoryPendingStore write lock poisoned, recovering");
            e.into_inner()
        })
    }
}

#[async_trait]
impl PendingActionStore for MemoryPendingStore {
    async fn insert(&self, action: &PendingAction) -> ApprovalResult<()> {
        self.write_actions()
            .insert(action.id.clone(), action.clone());
        Ok(())
    }

    async fn get(
        &self,
        user: &UserId,
        id: &PendingActionId,
    ) -> ApprovalResult<Option<PendingAction>> {
        Ok(self
            .read_actions()
            .get(id)
            .filter(|a| &a.user_id == user)
            .cloned())
    }

    async fn claim_for_confirmation(
        &self,
        user: &UserId,
        id: &PendingActionId,
        now: Timestamp,
    ) -> ApprovalResult<ClaimOutcome> {
        let mut actions = self.write_actions();
        let Some(action) = actions
            .get_mut(id)
            .filter(|a| &a.user_id == user && a.status == PendingStatus::Pending)
        else {
            return Ok(ClaimOutcome::NotPending);
        };

        if action.is_expired(now) {
            action.status = PendingStatus::Expired;
            return Ok(ClaimOutcome::Expired(action.clone()));
        }

        action.status = PendingStatus::Confirmed;
        action.confirmed_at = Some(now);
        Ok(ClaimOutcome::Confirmed(action.clone()))
    }

    async fn reject(
        &self,
        user: &UserId,
        id: &PendingActionId,
        reason: Option<String>,
        now: Timestamp,
    ) -> ApprovalResult<Option<PendingAction>> {
        let mut actions = self.write_actions();
        let Some(action) = actions
            .get_mut(id)
            .filter(|a| &a.user_id == user && a.status == PendingStatus::Pending)
        else {
            return Ok(None);
        };

        action.status = PendingStatus::Rejected;
        action.rejected_at = Some(now);
        action.rejection_reason = reason;
        Ok(Some(action.clone()))
    }

    async fn live_for_user(
        &self,
        user: &UserId,
        now: Timestamp,
    ) -> ApprovalResult<Vec<PendingAction>> {
        let mut live: Vec<PendingAction> = self
            .read_actions()
            .values()
            .filter(|a| {
                &a.user_id == user && a.status == PendingStatus::Pending && !a.is_expired(now)
            })
            .cloned()
            .collect();
        live.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(live)
    }
}

impl std::fmt::Debug for MemoryPendingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryPendingStore")
            .field("actions", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cat_core::ActionCategory;
    use cat_core::ActionId;
    use chrono::TimeDelta;
    use serde_json::json;

    fn pending_for(user: &str) -> PendingAction {
        PendingAction::new(
            UserId::new(user),
            ActionId::new("send_payment"),
            ActionCategory::Payments,
            json!({"recipient_id": "u_2", "amount_sats": 100}),
            "Send 100 sats to u_2",
            PendingAction::default_ttl(),
        )
    }

    #[tokio::test]
    async fn test_claim_confirms_once() {
        let store = MemoryPendingStore::new();
        let action = pending_for("u_1");
        store.insert(&action).await.unwrap();

        let user = UserId::new("u_1");
        let now = Timestamp::now();
        let first = store
            .claim_for_confirmation(&user, &action.id, now)
            .await
            .unwrap();
        assert!(matches!(first, ClaimOutcome::Confirmed(_)));

        // Losing side of the race sees nothing pending.
        let second = store
            .claim_for_confirmation(&user, &action.id, now)
            .await
            .unwrap();
        assert!(matches!(second, ClaimOutcome::NotPending));
    }

    #[tokio::test]
    async fn test_claim_past_expiry_transitions_to_expired() {
        let store = MemoryPendingStore::new();
        let action = pending_for("u_1");
        store.insert(&action).await.unwrap();

        let user = UserId::new("u_1");
        let late = action.expires_at.after(TimeDelta::seconds(1));
        let outcome = store
            .claim_for_confirmation(&user, &action.id, late)
            .await
            .unwrap();
        assert!(matches!(outcome, ClaimOutcome::Expired(_)));

        let row = store.get(&user, &action.id).await.unwrap().unwrap();
        assert_eq!(row.status, PendingStatus::Expired);

        // Terminal: a retry does not resurrect it.
        let retry = store
            .claim_for_confirmation(&user, &action.id, Timestamp::now())
            .await
            .unwrap();
        assert!(matches!(retry, ClaimOutcome::NotPending));
    }

    #[tokio::test]
    async fn test_claim_scoped_to_owner() {
        let store = MemoryPendingStore::new();
        let action = pending_for("u_1");
        store.insert(&action).await.unwrap();

        let outcome = store
            .claim_for_confirmation(&UserId::new("u_2"), &action.id, Timestamp::now())
            .await
            .unwrap();
        assert!(
            matches!(outcome, ClaimOutcome::NotPending),
            "other users' entries look like missing ids"
        );
    }

    #[tokio::test]
    async fn test_reject_is_terminal() {
        let store = MemoryPendingStore::new();
        let action = pending_for("u_1");
        store.insert(&action).await.unwrap();

        let user = UserId::new("u_1");
        let rejected = store
            .reject(&user, &action.id, Some("changed my mind".to_string()), Timestamp::now())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(rejected.status, PendingStatus::Rejected);
        assert!(rejected.rejected_at.is_some());
        assert_eq!(rejected.rejection_reason.as_deref(), Some("changed my mind"));

        let confirm_after = store
            .claim_for_confirmation(&user, &action.id, Timestamp::now())
            .await
            .unwrap();
        assert!(matches!(confirm_after, ClaimOutcome::NotPending));

        let reject_again = store
            .reject(&user, &action.id, None, Timestamp::now())
            .await
            .unwrap();
        assert!(reject_again.is_none());
    }

    #[tokio::test]
    async fn test_live_listing_filters_and_orders() {
        let store = MemoryPendingStore::new();
        let user = UserId::new("u_1");

        let old = pending_for("u_1");
        store.insert(&old).await.unwrap();
        let mut newer = pending_for("u_1");
        newer.created_at = old.created_at.after(TimeDelta::seconds(10));
        store.insert(&newer).await.unwrap();

        // A stale entry never resolved: filtered out by the expiry check.
        let mut stale = pending_for("u_1");
        stale.expires_at = Timestamp::now().after(TimeDelta::seconds(-5));
        store.insert(&stale).await.unwrap();

        // Someone else's entry.
        store.insert(&pending_for("u_2")).await.unwrap();

        let live = store.live_for_user(&user, Timestamp::now()).await.unwrap();
        assert_eq!(live.len(), 2);
        assert_eq!(live[0].id, newer.id, "newest first");
        assert_eq!(live[1].id, old.id);
    }
}
