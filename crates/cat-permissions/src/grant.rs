//! Permission grant rows and their storage port.

use async_trait::async_trait;
use cat_core::{ActionCategory, ActionId, Timestamp, UserId};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use crate::error::PermissionResult;

/// What a grant row targets: one action, or a whole category.
///
/// Stored as the action id string, with `*` meaning the category. Specific
/// subjects take precedence over the wildcard at evaluation time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GrantSubject {
    /// A single action id.
    Action(ActionId),
    /// Every action in the row's category.
    Category,
}

impl GrantSubject {
    /// The stored wildcard marker.
    pub const WILDCARD: &'static str = "*";

    /// The subject as stored in the grant row.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Action(id) => id.as_str(),
            Self::Category => Self::WILDCARD,
        }
    }
}

impl fmt::Display for GrantSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for GrantSubject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for GrantSubject {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw.is_empty() {
            return Err(D::Error::custom("grant subject must not be empty"));
        }
        if raw == Self::WILDCARD {
            Ok(Self::Category)
        } else {
            Ok(Self::Action(ActionId::new(raw)))
        }
    }
}

/// A stored permission decision for one user at one granularity.
///
/// At most one row exists per `(user_id, subject, category)`; writes go
/// through upsert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionGrant {
    /// The user this grant belongs to.
    pub user_id: UserId,
    /// Specific action or category wildcard.
    pub subject: GrantSubject,
    /// The category the row lives under.
    pub category: ActionCategory,
    /// `true` grants, `false` denies (soft revoke keeps the row).
    pub granted: bool,
    /// Overrides the action definition's confirmation default when set.
    pub requires_confirmation: Option<bool>,
    /// Executions allowed per local day. Specific-action rows only.
    pub daily_limit: Option<u32>,
    /// Cap on sats per execution. Payment actions only.
    pub max_sats_per_action: Option<u64>,
    /// Last upsert time.
    pub updated_at: Timestamp,
}

/// Optional knobs attached when granting.
#[derive(Debug, Clone, Default)]
pub struct GrantOptions {
    /// Override the action definition's confirmation default.
    pub requires_confirmation: Option<bool>,
    /// Executions allowed per local day.
    pub daily_limit: Option<u32>,
    /// Cap on sats per execution (payments).
    pub max_sats_per_action: Option<u64>,
}

/// Storage port for permission grants.
///
/// Implementations must provide upsert-by-composite-key semantics on
/// `(user_id, subject, category)`.
#[async_trait]
pub trait GrantStore: Send + Sync {
    /// Insert or replace the row for the grant's composite key.
    async fn upsert(&self, grant: PermissionGrant) -> PermissionResult<()>;

    /// Fetch one row by composite key.
    async fn get(
        &self,
        user: &UserId,
        subject: &GrantSubject,
        category: ActionCategory,
    ) -> PermissionResult<Option<PermissionGrant>>;

    /// Every grant row for a user, in no particular order.
    async fn list_for_user(&self, user: &UserId) -> PermissionResult<Vec<PermissionGrant>>;
}

type GrantKey = (UserId, GrantSubject, ActionCategory);

/// In-memory grant store. Thread-safe via an internal [`RwLock`].
#[derive(Default)]
pub struct MemoryGrantStore {
    grants: RwLock<HashMap<GrantKey, PermissionGrant>>,
}

impl MemoryGrantStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows across all users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read_grants().len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_grants(&self) -> std::sync::RwLockReadGuard<'_, HashMap<GrantKey, PermissionGrant>> {
        self.grants.read().unwrap_or_else(|e| {
            tracing::warn!("MemoryGrantStore read lock poisoned, recovering");
            e.into_inner()
        })
    }

    fn write_grants(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<GrantKey, PermissionGrant>> {
        self.grants.write().unwrap_or_else(|e| {
            tracing::warn!("MemoryGrantStore write lock poisoned, recovering");
            e.into_inner()
        })
    }
}

#[async_trait]
impl GrantStore for MemoryGrantStore {
    async fn upsert(&self, grant: PermissionGrant) -> PermissionResult<()> {
        let key = (
            grant.user_id.clone(),
            grant.subject.clone(),
            grant.category,
        );
        self.write_grants().insert(key, grant);
        Ok(())
    }

    async fn get(
        &self,
        user: &UserId,
        subject: &GrantSubject,
        category: ActionCategory,
    ) -> PermissionResult<Option<PermissionGrant>> {
        let key = (user.clone(), subject.clone(), category);
        Ok(self.read_grants().get(&key).cloned())
    }

    async fn list_for_user(&self, user: &UserId) -> PermissionResult<Vec<PermissionGrant>> {
        Ok(self
            .read_grants()
            .values()
            .filter(|g| &g.user_id == user)
            .cloned()
            .collect())
    }
}

impl std::fmt::Debug for MemoryGrantStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryGrantStore")
            .field("grants", &self.len())
            .finish()
    }
}
