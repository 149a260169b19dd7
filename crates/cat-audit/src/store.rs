//! Action log storage port and in-memory adapter.

use async_trait::async_trait;
use cat_core::{ActionId, LogEntryId, Timestamp, UserId};
use serde_json::Value;
use std::sync::RwLock;

use crate::entry::{ActionLogEntry, LogStatus};
use crate::error::{AuditError, AuditResult};

/// Default page size for history queries.
const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Filters for paging through a user's action history, newest first.
#[derive(Debug, Clone)]
pub struct HistoryQuery {
    /// Maximum entries returned.
    pub limit: usize,
    /// Restrict to one action id.
    pub action_id: Option<ActionId>,
    /// Restrict to one status.
    pub status: Option<LogStatus>,
}

impl HistoryQuery {
    /// Restrict the query to one action id.
    #[must_use]
    pub fn with_action(mut self, action_id: ActionId) -> Self {
        self.action_id = Some(action_id);
        self
    }

    /// Restrict the query to one status.
    #[must_use]
    pub fn with_status(mut self, status: LogStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Cap the number of entries returned.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_HISTORY_LIMIT,
            action_id: None,
            status: None,
        }
    }
}

/// Storage port for the append-only action log.
///
/// Implementations must guarantee that a terminal status is written at most
/// once per entry, and must never delete entries.
#[async_trait]
pub trait ActionLogStore: Send + Sync {
    /// Append a fresh entry (status `executing`).
    async fn insert(&self, entry: &ActionLogEntry) -> AuditResult<()>;

    /// Transition an entry `executing -> completed`, recording the handler
    /// result payload.
    ///
    /// # Errors
    ///
    /// [`AuditError::NotFound`] for unknown ids,
    /// [`AuditError::AlreadyTerminal`] if the entry already left `executing`.
    async fn mark_completed(
        &self,
        id: &LogEntryId,
        result: Option<Value>,
        at: Timestamp,
    ) -> AuditResult<()>;

    /// Transition an entry `executing -> failed`, recording the error.
    ///
    /// # Errors
    ///
    /// Same conditions as [`mark_completed`](Self::mark_completed).
    async fn mark_failed(&self, id: &LogEntryId, error: &str, at: Timestamp) -> AuditResult<()>;

    /// Fetch one entry by id.
    async fn get(&self, id: &LogEntryId) -> AuditResult<Option<ActionLogEntry>>;

    /// Count entries for `user` + `action` started at or after `since`,
    /// regardless of status. Feeds the daily-quota check.
    async fn count_since(
        &self,
        user: &UserId,
        action: &ActionId,
        since: Timestamp,
    ) -> AuditResult<u64>;

    /// A user's history, newest first, filtered by `query`.
    async fn history(
        &self,
        user: &UserId,
        query: &HistoryQuery,
    ) -> AuditResult<Vec<ActionLogEntry>>;
}

/// In-memory action log. Thread-safe via an internal [`RwLock`].
#[derive(Default)]
pub struct MemoryActionLog {
    entries: RwLock<Vec<ActionLogEntry>>,
}

impl MemoryActionLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total entries recorded, across all users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read_entries().len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_entries(&self) -> std::sync::RwLockReadGuard<'_, Vec<ActionLogEntry>> {
        self.entries.read().unwrap_or_else(|e| {
            tracing::warn!("MemoryActionLog read lock poisoned, recovering");
            e.into_inner()
        })
    }

    fn write_entries(&self) -> std::sync::RwLockWriteGuard<'_, Vec<ActionLogEntry>> {
        self.entries.write().unwrap_or_else(|e| {
            tracing::warn!("MemoryActionLog write lock poisoned, recovering");
            e.into_inner()
        })
    }

    fn terminal_write(
        &self,
        id: &LogEntryId,
        at: Timestamp,
        apply: impl FnOnce(&mut ActionLogEntry),
    ) -> AuditResult<()> {
        let mut entries = self.write_entries();
        let entry = entries
            .iter_mut()
            .find(|e| &e.id == id)
            .ok_or_else(|| AuditError::NotFound(id.clone()))?;
        if entry.status.is_terminal() {
            return Err(AuditError::AlreadyTerminal {
                entry: id.clone(),
                status: entry.status.to_string(),
            });
        }
        apply(entry);
        entry.completed_at = Some(at);
        Ok(())
    }
}

#[async_trait]
impl ActionLogStore for MemoryActionLog {
    async fn insert(&self, entry: &ActionLogEntry) -> AuditResult<()> {
        self.write_entries().push(entry.clone());
        Ok(())
    }

    async fn mark_completed(
        &self,
        id: &LogEntryId,
        result: Option<Value>,
        at: Timestamp,
    ) -> AuditResult<()> {
        self.terminal_write(id, at, |entry| {
            entry.status = LogStatus::Completed;
            entry.result = result;
        })
    }

    async fn mark_failed(&self, id: &LogEntryId, error: &str, at: Timestamp) -> AuditResult<()> {
        self.terminal_write(id, at, |entry| {
            entry.status = LogStatus::Failed;
            entry.error_message = Some(error.to_string());
        })
    }

    async fn get(&self, id: &LogEntryId) -> AuditResult<Option<ActionLogEntry>> {
        Ok(self.read_entries().iter().find(|e| &e.id == id).cloned())
    }

    async fn count_since(
        &self,
        user: &UserId,
        action: &ActionId,
        since: Timestamp,
    ) -> AuditResult<u64> {
        let count = self
            .read_entries()
            .iter()
            .filter(|e| &e.user_id == user && &e.action_id == action && e.started_at >= since)
            .count();
        Ok(count as u64)
    }

    async fn history(
        &self,
        user: &UserId,
        query: &HistoryQuery,
    ) -> AuditResult<Vec<ActionLogEntry>> {
        let mut matches: Vec<ActionLogEntry> = self
            .read_entries()
            .iter()
            .filter(|e| &e.user_id == user)
            .filter(|e| query.action_id.as_ref().is_none_or(|a| &e.action_id == a))
            .filter(|e| query.status.is_none_or(|s| e.status == s))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        matches.truncate(query.limit);
        Ok(matches)
    }
}

impl std::fmt::Debug for MemoryActionLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryActionLog")
            .field("entries", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cat_core::{ActionCategory, ActorId};
    use chrono::TimeDelta;
    use serde_json::json;

    fn entry_for(user: &str, action: &str) -> ActionLogEntry {
        ActionLogEntry::begin(
            UserId::new(user),
            ActorId::new("cat"),
            ActionId::new(action),
            ActionCategory::Communication,
            json!({"recipient_id": "u_9", "content": "hi"}),
            None,
            None,
            None,
        )
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let log = MemoryActionLog::new();
        let entry = entry_for("u_1", "send_message");
        log.insert(&entry).await.unwrap();

        let fetched = log.get(&entry.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, LogStatus::Executing);
        assert_eq!(fetched.user_id, UserId::new("u_1"));
    }

    #[tokio::test]
    async fn test_terminal_status_written_once() {
        let log = MemoryActionLog::new();
        let entry = entry_for("u_1", "send_message");
        log.insert(&entry).await.unwrap();

        log.mark_completed(&entry.id, Some(json!({"message_id": "m_1"})), Timestamp::now())
            .await
            .unwrap();

        // Second terminal write is refused, whichever direction it goes.
        let err = log
            .mark_failed(&entry.id, "too late", Timestamp::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AuditError::AlreadyTerminal { .. }));

        let fetched = log.get(&entry.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, LogStatus::Completed);
        assert!(fetched.completed_at.is_some());
        assert!(fetched.error_message.is_none());
    }

    #[tokio::test]
    async fn test_mark_unknown_entry() {
        let log = MemoryActionLog::new();
        let err = log
            .mark_failed(&LogEntryId::new(), "nope", Timestamp::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AuditError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_count_since_scopes_user_action_and_time() {
        let log = MemoryActionLog::new();
        for _ in 0..3 {
            log.insert(&entry_for("u_1", "send_message")).await.unwrap();
        }
        log.insert(&entry_for("u_1", "send_payment")).await.unwrap();
        log.insert(&entry_for("u_2", "send_message")).await.unwrap();

        let since = Timestamp::now().after(TimeDelta::hours(-1));
        let count = log
            .count_since(&UserId::new("u_1"), &ActionId::new("send_message"), since)
            .await
            .unwrap();
        assert_eq!(count, 3);

        // Nothing started after a future cutoff.
        let future = Timestamp::now().after(TimeDelta::hours(1));
        let count = log
            .count_since(&UserId::new("u_1"), &ActionId::new("send_message"), future)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_history_newest_first_with_filters() {
        let log = MemoryActionLog::new();
        let first = entry_for("u_1", "send_message");
        log.insert(&first).await.unwrap();
        let mut second = entry_for("u_1", "send_message");
        second.started_at = first.started_at.after(TimeDelta::seconds(5));
        log.insert(&second).await.unwrap();
        log.mark_failed(&second.id, "recipient missing", Timestamp::now())
            .await
            .unwrap();

        let all = log
            .history(&UserId::new("u_1"), &HistoryQuery::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second.id, "newest entry first");

        let failed_only = log
            .history(
                &UserId::new("u_1"),
                &HistoryQuery::default().with_status(LogStatus::Failed),
            )
            .await
            .unwrap();
        assert_eq!(failed_only.len(), 1);
        assert_eq!(failed_only[0].id, second.id);

        let limited = log
            .history(&UserId::new("u_1"), &HistoryQuery::default().with_limit(1))
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);
    }
}
