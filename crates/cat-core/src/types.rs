//! Common identifier, time and classification types.
//!
//! Ids that originate in the surrounding application (users, actors,
//! conversations, messages) are opaque string newtypes - the pipeline never
//! inspects them. Ids minted by the pipeline itself (pending actions, log
//! entries) are UUID newtypes.

use chrono::{DateTime, Local, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of an application user on whose behalf actions run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Wrap an application user id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user:{}", self.0)
    }
}

/// Identifier of the agent instance performing actions.
///
/// Distinct from [`UserId`]: the actor is the assistant acting, the user is
/// the human it acts for. Both appear in every audit row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub String);

impl ActorId {
    /// Wrap an application actor id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl From<&str> for ActorId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor:{}", self.0)
    }
}

/// Identifier of a chat conversation, attached to results for traceability.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub String);

impl ConversationId {
    /// Wrap an application conversation id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conv:{}", self.0)
    }
}

/// Identifier of the chat message that triggered an action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl MessageId {
    /// Wrap an application message id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg:{}", self.0)
    }
}

/// The name of an executable agent action, e.g. `send_payment`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(pub String);

impl ActionId {
    /// Wrap an action name.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw action name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ActionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for a pending action awaiting confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PendingActionId(pub Uuid);

impl PendingActionId {
    /// Create a new random pending-action id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PendingActionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PendingActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pending:{}", self.0)
    }
}

/// Unique identifier for an action-log entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogEntryId(pub Uuid);

impl LogEntryId {
    /// Create a new random log-entry id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LogEntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LogEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "log:{}", self.0)
    }
}

/// A point in time, stored as UTC.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(pub DateTime<Utc>);

impl Timestamp {
    /// The current time.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Whether this timestamp lies in the future.
    #[must_use]
    pub fn is_future(&self) -> bool {
        self.0 > Utc::now()
    }

    /// Whether this timestamp has passed relative to `now`.
    #[must_use]
    pub fn is_past(&self, now: Timestamp) -> bool {
        self.0 < now.0
    }

    /// This timestamp shifted forward by `delta`.
    #[must_use]
    pub fn after(&self, delta: TimeDelta) -> Self {
        Self(self.0 + delta)
    }

    /// Midnight of the current day in the server's local timezone,
    /// expressed as a UTC instant.
    ///
    /// Daily quotas reset here. Falls back to UTC midnight on the rare
    /// local dates where midnight does not exist (DST gap).
    #[must_use]
    pub fn start_of_local_day() -> Self {
        let midnight = Local::now().date_naive().and_time(NaiveTime::MIN);
        let instant = midnight.and_local_timezone(Local).earliest().map_or_else(
            || Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc(),
            |dt| dt.with_timezone(&Utc),
        );
        Self(instant)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

/// Static risk classification of an action definition.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Reversible, low-impact operations.
    Low,
    /// Visible side effects, recoverable with effort.
    Medium,
    /// Irreversible or financially significant operations.
    High,
}

impl RiskLevel {
    /// Whether actions at this level require confirmation by default.
    #[must_use]
    pub fn requires_confirmation(self) -> bool {
        matches!(self, Self::High)
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// The permission surface an action belongs to.
///
/// Grants can target a whole category at once; the evaluator falls back to
/// the category grant, then to [`allowed_by_default`](Self::allowed_by_default),
/// when no specific-action grant exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionCategory {
    /// Remembering and recalling conversational context.
    Context,
    /// Listings, products and other owned records.
    Entities,
    /// Messages and timeline posts.
    Communication,
    /// Moving or requesting sats.
    Payments,
    /// Organizations and memberships.
    Organization,
    /// Account and notification settings.
    Settings,
}

impl ActionCategory {
    /// Every category, in display order.
    pub const ALL: [Self; 6] = [
        Self::Context,
        Self::Entities,
        Self::Communication,
        Self::Payments,
        Self::Organization,
        Self::Settings,
    ];

    /// The category name as stored in grant and log rows.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Context => "context",
            Self::Entities => "entities",
            Self::Communication => "communication",
            Self::Payments => "payments",
            Self::Organization => "organization",
            Self::Settings => "settings",
        }
    }

    /// The built-in default when no grant exists at either granularity.
    ///
    /// Only context actions are allowed without an explicit grant;
    /// everything with outward side effects is denied until granted.
    #[must_use]
    pub fn allowed_by_default(self) -> bool {
        matches!(self, Self::Context)
    }
}

impl fmt::Display for ActionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
