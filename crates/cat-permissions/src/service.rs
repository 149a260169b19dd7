//! The permission evaluator.
//!
//! [`PermissionService`] is the only writer for grant rows (via the
//! explicit grant/revoke calls - evaluation never writes) and the single
//! authority on whether an action may run.

use cat_audit::ActionLogStore;
use cat_catalog::{ActionCatalog, ActionDefinition};
use cat_core::{ActionCategory, ActionId, RiskLevel, Timestamp, UserId};
use serde::Serialize;
use std::sync::Arc;

use crate::error::PermissionResult;
use crate::grant::{GrantOptions, GrantStore, GrantSubject, PermissionGrant};

/// The outcome of a permission check.
///
/// `allowed=false` always carries a display-ready `reason`. When a daily
/// quota was consulted, `daily_usage`/`daily_limit` report it either way.
#[derive(Debug, Clone, Serialize)]
pub struct PermissionDecision {
    /// Whether the action may proceed.
    pub allowed: bool,
    /// Plain-language explanation, set on every denial.
    pub reason: Option<String>,
    /// Whether execution must park for human confirmation first.
    pub requires_confirmation: bool,
    /// Executions counted against today's quota, when one applies.
    pub daily_usage: Option<u64>,
    /// Today's quota, when one applies.
    pub daily_limit: Option<u32>,
    /// Per-execution sats cap carried from the matched grant.
    pub max_sats_per_action: Option<u64>,
}

impl PermissionDecision {
    /// A denial. `requires_confirmation` stays `true` so a caller that
    /// wrongly ignores `allowed` still cannot fast-path the action.
    #[must_use]
    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
            requires_confirmation: true,
            daily_usage: None,
            daily_limit: None,
            max_sats_per_action: None,
        }
    }

    /// An approval.
    #[must_use]
    pub fn allow(requires_confirmation: bool) -> Self {
        Self {
            allowed: true,
            reason: None,
            requires_confirmation,
            daily_usage: None,
            daily_limit: None,
            max_sats_per_action: None,
        }
    }

    fn with_quota(mut self, usage: u64, limit: u32) -> Self {
        self.daily_usage = Some(usage);
        self.daily_limit = Some(limit);
        self
    }

    fn with_sats_cap(mut self, cap: Option<u64>) -> Self {
        self.max_sats_per_action = cap;
        self
    }
}

/// Per-category slice of a user's permission surface.
#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    /// The category summarized.
    pub category: ActionCategory,
    /// Actions defined in this category.
    pub action_count: usize,
    /// Actions currently granted: all of them under a category-wide grant,
    /// otherwise the individually granted ones.
    pub enabled_count: usize,
    /// Whether any enabled high-risk action would actually be allowed,
    /// computed through the full evaluation fallback - not by inspecting
    /// grant rows.
    pub high_risk_enabled: bool,
}

/// A user's permission surface across every category.
#[derive(Debug, Clone, Serialize)]
pub struct PermissionSummary {
    /// One entry per category, in display order.
    pub categories: Vec<CategorySummary>,
}

/// The permission evaluator and grant writer.
pub struct PermissionService {
    catalog: Arc<ActionCatalog>,
    grants: Arc<dyn GrantStore>,
    log: Arc<dyn ActionLogStore>,
}

impl PermissionService {
    /// Create an evaluator over the given catalog and stores.
    #[must_use]
    pub fn new(
        catalog: Arc<ActionCatalog>,
        grants: Arc<dyn GrantStore>,
        log: Arc<dyn ActionLogStore>,
    ) -> Self {
        Self {
            catalog,
            grants,
            log,
        }
    }

    /// Decide whether `user` may run `action` right now.
    ///
    /// Total over any input: unknown ids, disabled actions and store
    /// failures all deny with a reason; nothing escapes as an error.
    pub async fn check_permission(&self, user: &UserId, action: &ActionId) -> PermissionDecision {
        // Tier 0: the action must exist and be enabled. Fail closed.
        let Some(def) = self.catalog.get(action) else {
            return PermissionDecision::deny(format!("Unknown action: {action}"));
        };
        if !def.enabled {
            return PermissionDecision::deny("Action is disabled");
        }

        // Tier 1: specific-action grant.
        let specific = GrantSubject::Action(action.clone());
        match self.grants.get(user, &specific, def.category).await {
            Ok(Some(grant)) => return self.decide_from_grant(user, def, &grant, true).await,
            Ok(None) => {},
            Err(e) => {
                tracing::warn!(user = %user, action = %action, error = %e, "grant lookup failed, denying");
                return PermissionDecision::deny("Permission check failed");
            },
        }

        // Tier 2: category-wide grant.
        match self.grants.get(user, &GrantSubject::Category, def.category).await {
            Ok(Some(grant)) => return self.decide_from_grant(user, def, &grant, false).await,
            Ok(None) => {},
            Err(e) => {
                tracing::warn!(user = %user, action = %action, error = %e, "grant lookup failed, denying");
                return PermissionDecision::deny("Permission check failed");
            },
        }

        // Tier 3: built-in default table.
        if def.category.allowed_by_default() {
            PermissionDecision::allow(def.requires_confirmation)
        } else {
            PermissionDecision::deny("Permission not granted")
        }
    }

    /// Apply a matched grant row.
    ///
    /// The daily quota applies only at the specific-action tier; category
    /// grants do not carry one.
    async fn decide_from_grant(
        &self,
        user: &UserId,
        def: &ActionDefinition,
        grant: &PermissionGrant,
        specific: bool,
    ) -> PermissionDecision {
        if !grant.granted {
            return PermissionDecision::deny("Permission revoked");
        }

        let requires_confirmation = grant
            .requires_confirmation
            .unwrap_or(def.requires_confirmation);
        let decision =
            PermissionDecision::allow(requires_confirmation).with_sats_cap(grant.max_sats_per_action);

        if !specific {
            return decision;
        }
        let Some(limit) = grant.daily_limit else {
            return decision;
        };

        let since = Timestamp::start_of_local_day();
        match self.log.count_since(user, &def.id, since).await {
            Ok(usage) if usage >= u64::from(limit) => PermissionDecision::deny(format!(
                "Daily limit reached ({usage}/{limit})"
            ))
            .with_quota(usage, limit),
            Ok(usage) => decision.with_quota(usage, limit),
            Err(e) => {
                tracing::warn!(user = %user, action = %def.id, error = %e, "daily usage count failed, denying");
                PermissionDecision::deny("Permission check failed")
            },
        }
    }

    /// Grant a specific action, upserting its row.
    pub async fn grant_action(
        &self,
        user: &UserId,
        action: &ActionId,
        category: ActionCategory,
        options: GrantOptions,
    ) -> PermissionResult<()> {
        self.upsert_grant(user, GrantSubject::Action(action.clone()), category, true, options)
            .await
    }

    /// Soft-revoke a specific action: the row stays, `granted` flips to
    /// `false`, limit metadata is preserved.
    pub async fn revoke_action(
        &self,
        user: &UserId,
        action: &ActionId,
        category: ActionCategory,
    ) -> PermissionResult<()> {
        self.flip_to_denied(user, GrantSubject::Action(action.clone()), category)
            .await
    }

    /// Grant a whole category via the wildcard subject.
    pub async fn grant_category(
        &self,
        user: &UserId,
        category: ActionCategory,
        options: GrantOptions,
    ) -> PermissionResult<()> {
        self.upsert_grant(user, GrantSubject::Category, category, true, options)
            .await
    }

    /// Revoke a whole category, and every specific-action row under it, so
    /// no stale specific grant survives the lockdown.
    pub async fn revoke_category(
        &self,
        user: &UserId,
        category: ActionCategory,
    ) -> PermissionResult<()> {
        self.flip_to_denied(user, GrantSubject::Category, category)
            .await?;

        for row in self.grants.list_for_user(user).await? {
            if row.category == category
                && matches!(row.subject, GrantSubject::Action(_))
                && row.granted
            {
                self.grants
                    .upsert(PermissionGrant {
                        granted: false,
                        updated_at: Timestamp::now(),
                        ..row
                    })
                    .await?;
            }
        }
        Ok(())
    }

    /// Aggregate a user's permission surface for display.
    pub async fn permission_summary(&self, user: &UserId) -> PermissionResult<PermissionSummary> {
        let rows = self.grants.list_for_user(user).await?;
        let mut categories = Vec::with_capacity(ActionCategory::ALL.len());

        for category in ActionCategory::ALL {
            let action_count = self.catalog.in_category(category).count();

            let category_granted = rows.iter().any(|g| {
                g.category == category && g.subject == GrantSubject::Category && g.granted
            });
            let enabled_count = if category_granted {
                action_count
            } else {
                rows.iter()
                    .filter(|g| {
                        g.category == category
                            && matches!(g.subject, GrantSubject::Action(_))
                            && g.granted
                    })
                    .count()
            };

            let mut high_risk_enabled = false;
            for def in self
                .catalog
                .in_category(category)
                .filter(|d| d.enabled && d.risk == RiskLevel::High)
            {
                if self.check_permission(user, &def.id).await.allowed {
                    high_risk_enabled = true;
                    break;
                }
            }

            categories.push(CategorySummary {
                category,
                action_count,
                enabled_count,
                high_risk_enabled,
            });
        }

        Ok(PermissionSummary { categories })
    }

    async fn upsert_grant(
        &self,
        user: &UserId,
        subject: GrantSubject,
        category: ActionCategory,
        granted: bool,
        options: GrantOptions,
    ) -> PermissionResult<()> {
        tracing::debug!(user = %user, subject = %subject, category = %category, granted, "upserting grant");
        self.grants
            .upsert(PermissionGrant {
                user_id: user.clone(),
                subject,
                category,
                granted,
                requires_confirmation: options.requires_confirmation,
                daily_limit: options.daily_limit,
                max_sats_per_action: options.max_sats_per_action,
                updated_at: Timestamp::now(),
            })
            .await
    }

    async fn flip_to_denied(
        &self,
        user: &UserId,
        subject: GrantSubject,
        category: ActionCategory,
    ) -> PermissionResult<()> {
        let row = self.grants.get(user, &subject, category).await?;
        let denied = match row {
            Some(existing) => PermissionGrant {
                granted: false,
                updated_at: Timestamp::now(),
                ..existing
            },
            None => PermissionGrant {
                user_id: user.clone(),
                subject,
                category,
                granted: false,
                requires_confirmation: None,
                daily_limit: None,
                max_sats_per_action: None,
                updated_at: Timestamp::now(),
            },
        };
        self.grants.upsert(denied).await
    }
}

impl std::fmt::Debug for PermissionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionService")
            .field("catalog", &self.catalog.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grant::MemoryGrantStore;
    use async_trait::async_trait;
    use cat_audit::{ActionLogEntry, AuditError, AuditResult, HistoryQuery, MemoryActionLog};
    use cat_core::{ActorId, LogEntryId};
    use serde_json::json;

    fn service() -> (PermissionService, Arc<MemoryActionLog>) {
        let log = Arc::new(MemoryActionLog::new());
        let service = PermissionService::new(
            Arc::new(ActionCatalog::builtin()),
            Arc::new(MemoryGrantStore::new()),
            Arc::clone(&log) as Arc<dyn ActionLogStore>,
        );
        (service, log)
    }

    fn user() -> UserId {
        UserId::new("u_1")
    }

    async fn record_attempt(log: &MemoryActionLog, user: &UserId, action: &str) {
        let entry = ActionLogEntry::begin(
            user.clone(),
            ActorId::new("cat"),
            ActionId::new(action),
            ActionCategory::Communication,
            json!({}),
            None,
            None,
            None,
        );
        log.insert(&entry).await.unwrap();
        log.mark_completed(&entry.id, None, Timestamp::now())
            .await
            .unwrap();
    }

    // -----------------------------------------------------------------------
    // Fallback tiers
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_unknown_action_denies() {
        let (service, _) = service();
        let decision = service
            .check_permission(&user(), &ActionId::new("teleport_user"))
            .await;
        assert!(!decision.allowed);
        assert!(decision.requires_confirmation);
        assert!(decision.reason.unwrap().contains("Unknown action"));
    }

    #[tokio::test]
    async fn test_disabled_action_denies_despite_grant() {
        let log = Arc::new(MemoryActionLog::new());
        let catalog = ActionCatalog::builtin_with_overlay(
            "[actions.send_message]\nenabled = false\n",
        )
        .unwrap();
        let service = PermissionService::new(
            Arc::new(catalog),
            Arc::new(MemoryGrantStore::new()),
            log,
        );
        service
            .grant_category(&user(), ActionCategory::Communication, GrantOptions::default())
            .await
            .unwrap();

        let decision = service
            .check_permission(&user(), &ActionId::new("send_message"))
            .await;
        assert!(!decision.allowed);
        assert_eq!(decision.reason.as_deref(), Some("Action is disabled"));
    }

    #[tokio::test]
    async fn test_default_deny_for_payments() {
        let (service, _) = service();
        let decision = service
            .check_permission(&user(), &ActionId::new("send_payment"))
            .await;
        assert!(!decision.allowed);
        assert_eq!(decision.reason.as_deref(), Some("Permission not granted"));
    }

    #[tokio::test]
    async fn test_default_allow_for_context() {
        let (service, _) = service();
        let decision = service
            .check_permission(&user(), &ActionId::new("save_context_note"))
            .await;
        assert!(decision.allowed);
        assert!(!decision.requires_confirmation);
    }

    #[tokio::test]
    async fn test_category_grant_allows_member_action() {
        let (service, _) = service();
        service
            .grant_category(&user(), ActionCategory::Communication, GrantOptions::default())
            .await
            .unwrap();

        let decision = service
            .check_permission(&user(), &ActionId::new("send_message"))
            .await;
        assert!(decision.allowed);
        // Confirmation default comes from the action definition.
        assert!(decision.requires_confirmation);
    }

    #[tokio::test]
    async fn test_specific_beats_category() {
        let (service, _) = service();
        service
            .grant_category(&user(), ActionCategory::Communication, GrantOptions::default())
            .await
            .unwrap();
        service
            .revoke_action(&user(), &ActionId::new("send_message"), ActionCategory::Communication)
            .await
            .unwrap();

        let denied = service
            .check_permission(&user(), &ActionId::new("send_message"))
            .await;
        assert!(!denied.allowed, "specific revoke wins over category grant");

        // Sibling actions in the category stay granted.
        let sibling = service
            .check_permission(&user(), &ActionId::new("post_timeline_update"))
            .await;
        assert!(sibling.allowed);
    }

    #[tokio::test]
    async fn test_grant_confirmation_override() {
        let (service, _) = service();
        service
            .grant_action(
                &user(),
                &ActionId::new("send_message"),
                ActionCategory::Communication,
                GrantOptions {
                    requires_confirmation: Some(false),
                    ..GrantOptions::default()
                },
            )
            .await
            .unwrap();

        let decision = service
            .check_permission(&user(), &ActionId::new("send_message"))
            .await;
        assert!(decision.allowed);
        assert!(!decision.requires_confirmation, "grant override beats definition default");
    }

    // -----------------------------------------------------------------------
    // Daily limits
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_daily_limit_enforced() {
        let (service, log) = service();
        let u = user();
        service
            .grant_action(
                &u,
                &ActionId::new("send_message"),
                ActionCategory::Communication,
                GrantOptions {
                    daily_limit: Some(3),
                    ..GrantOptions::default()
                },
            )
            .await
            .unwrap();

        for _ in 0..2 {
            record_attempt(&log, &u, "send_message").await;
        }
        let under = service
            .check_permission(&u, &ActionId::new("send_message"))
            .await;
        assert!(under.allowed);
        assert_eq!(under.daily_usage, Some(2));
        assert_eq!(under.daily_limit, Some(3));

        record_attempt(&log, &u, "send_message").await;
        let at_limit = service
            .check_permission(&u, &ActionId::new("send_message"))
            .await;
        assert!(!at_limit.allowed);
        assert_eq!(at_limit.daily_usage, Some(3));
        assert_eq!(at_limit.daily_limit, Some(3));
        assert!(at_limit.reason.unwrap().contains("3/3"));
    }

    #[tokio::test]
    async fn test_category_grant_carries_no_daily_limit() {
        let (service, log) = service();
        let u = user();
        // daily_limit on a category grant is stored but never evaluated.
        service
            .grant_category(
                &u,
                ActionCategory::Communication,
                GrantOptions {
                    daily_limit: Some(1),
                    ..GrantOptions::default()
                },
            )
            .await
            .unwrap();

        record_attempt(&log, &u, "send_message").await;
        record_attempt(&log, &u, "send_message").await;

        let decision = service
            .check_permission(&u, &ActionId::new("send_message"))
            .await;
        assert!(decision.allowed);
        assert!(decision.daily_usage.is_none());
    }

    // -----------------------------------------------------------------------
    // Revocation
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_revoke_category_cascades_to_specific_grants() {
        let (service, _) = service();
        let u = user();
        service
            .grant_category(&u, ActionCategory::Payments, GrantOptions::default())
            .await
            .unwrap();
        service
            .grant_action(
                &u,
                &ActionId::new("send_payment"),
                ActionCategory::Payments,
                GrantOptions::default(),
            )
            .await
            .unwrap();

        service.revoke_category(&u, ActionCategory::Payments).await.unwrap();

        // The specific grant must not survive the category lockdown.
        let decision = service
            .check_permission(&u, &ActionId::new("send_payment"))
            .await;
        assert!(!decision.allowed);
        assert_eq!(decision.reason.as_deref(), Some("Permission revoked"));
    }

    #[tokio::test]
    async fn test_soft_revoke_preserves_metadata() {
        let grants = Arc::new(MemoryGrantStore::new());
        let service = PermissionService::new(
            Arc::new(ActionCatalog::builtin()),
            Arc::clone(&grants) as Arc<dyn GrantStore>,
            Arc::new(MemoryActionLog::new()),
        );
        let u = user();
        let action = ActionId::new("send_payment");
        service
            .grant_action(
                &u,
                &action,
                ActionCategory::Payments,
                GrantOptions {
                    daily_limit: Some(5),
                    max_sats_per_action: Some(1000),
                    ..GrantOptions::default()
                },
            )
            .await
            .unwrap();
        service
            .revoke_action(&u, &action, ActionCategory::Payments)
            .await
            .unwrap();

        let decision = service.check_permission(&u, &action).await;
        assert!(!decision.allowed);

        let row = grants
            .get(
                &u,
                &GrantSubject::Action(action.clone()),
                ActionCategory::Payments,
            )
            .await
            .unwrap()
            .unwrap();
        assert!(!row.granted);
        assert_eq!(row.daily_limit, Some(5), "soft revoke keeps limit metadata");
        assert_eq!(row.max_sats_per_action, Some(1000));
    }

    // -----------------------------------------------------------------------
    // Fail closed
    // -----------------------------------------------------------------------

    struct FailingGrantStore;

    #[async_trait]
    impl GrantStore for FailingGrantStore {
        async fn upsert(&self, _grant: PermissionGrant) -> PermissionResult<()> {
            Err(crate::error::PermissionError::Storage("db down".to_string()))
        }

        async fn get(
            &self,
            _user: &UserId,
            _subject: &GrantSubject,
            _category: ActionCategory,
        ) -> PermissionResult<Option<PermissionGrant>> {
            Err(crate::error::PermissionError::Storage("db down".to_string()))
        }

        async fn list_for_user(&self, _user: &UserId) -> PermissionResult<Vec<PermissionGrant>> {
            Err(crate::error::PermissionError::Storage("db down".to_string()))
        }
    }

    struct FailingLog;

    #[async_trait]
    impl ActionLogStore for FailingLog {
        async fn insert(&self, _entry: &ActionLogEntry) -> AuditResult<()> {
            Err(AuditError::Storage("db down".to_string()))
        }

        async fn mark_completed(
            &self,
            _id: &LogEntryId,
            _result: Option<serde_json::Value>,
            _at: Timestamp,
        ) -> AuditResult<()> {
            Err(AuditError::Storage("db down".to_string()))
        }

        async fn mark_failed(
            &self,
            _id: &LogEntryId,
            _error: &str,
            _at: Timestamp,
        ) -> AuditResult<()> {
            Err(AuditError::Storage("db down".to_string()))
        }

        async fn get(&self, _id: &LogEntryId) -> AuditResult<Option<ActionLogEntry>> {
            Err(AuditError::Storage("db down".to_string()))
        }

        async fn count_since(
            &self,
            _user: &UserId,
            _action: &ActionId,
            _since: Timestamp,
        ) -> AuditResult<u64> {
            Err(AuditError::Storage("db down".to_string()))
        }

        async fn history(
            &self,
            _user: &UserId,
            _query: &HistoryQuery,
        ) -> AuditResult<Vec<ActionLogEntry>> {
            Err(AuditError::Storage("db down".to_string()))
        }
    }

    #[tokio::test]
    async fn test_grant_store_failure_denies() {
        let service = PermissionService::new(
            Arc::new(ActionCatalog::builtin()),
            Arc::new(FailingGrantStore),
            Arc::new(MemoryActionLog::new()),
        );
        let decision = service
            .check_permission(&user(), &ActionId::new("send_message"))
            .await;
        assert!(!decision.allowed);
        assert_eq!(decision.reason.as_deref(), Some("Permission check failed"));
    }

    #[tokio::test]
    async fn test_usage_count_failure_denies() {
        let grants = Arc::new(MemoryGrantStore::new());
        let service = PermissionService::new(
            Arc::new(ActionCatalog::builtin()),
            Arc::clone(&grants) as Arc<dyn GrantStore>,
            Arc::new(FailingLog),
        );
        service
            .grant_action(
                &user(),
                &ActionId::new("send_message"),
                ActionCategory::Communication,
                GrantOptions {
                    daily_limit: Some(3),
                    ..GrantOptions::default()
                },
            )
            .await
            .unwrap();

        let decision = service
            .check_permission(&user(), &ActionId::new("send_message"))
            .await;
        assert!(!decision.allowed, "quota check failure fails closed");
    }

    // -----------------------------------------------------------------------
    // Summary
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_summary_counts_and_high_risk_flag() {
        let (service, _) = service();
        let u = user();
        service
            .grant_action(
                &u,
                &ActionId::new("send_message"),
                ActionCategory::Communication,
                GrantOptions::default(),
            )
            .await
            .unwrap();
        service
            .grant_category(&u, ActionCategory::Payments, GrantOptions::default())
            .await
            .unwrap();

        let summary = service.permission_summary(&u).await.unwrap();
        let by_category = |c: ActionCategory| {
            summary
                .categories
                .iter()
                .find(|s| s.category == c)
                .cloned()
                .unwrap()
        };

        let communication = by_category(ActionCategory::Communication);
        assert_eq!(communication.enabled_count, 1, "individually granted only");
        assert!(!communication.high_risk_enabled);

        let payments = by_category(ActionCategory::Payments);
        assert_eq!(payments.enabled_count, payments.action_count, "category grant enables all");
        assert!(payments.high_risk_enabled, "send_payment is high risk and allowed");

        // Context has no high-risk actions but is allowed by default.
        let context = by_category(ActionCategory::Context);
        assert_eq!(context.enabled_count, 0);
        assert!(!context.high_risk_enabled);
    }
}
