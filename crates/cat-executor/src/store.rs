//! The application data-store port handlers mutate.
//!
//! The pipeline never talks to the real database directly; handlers go
//! through [`AppStore`], and the surrounding application supplies the
//! production implementation. [`MemoryAppStore`] is the in-process adapter
//! used by tests and local development - it enforces just enough business
//! rules (balances, ownership, uniqueness) to exercise handler failure
//! paths.

use async_trait::async_trait;
use cat_core::UserId;
use std::collections::HashMap;
use std::sync::RwLock;

/// Errors a data-store mutation can produce.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The referenced record does not exist or is not visible to the caller.
    #[error("record not found: {0}")]
    NotFound(String),

    /// A uniqueness rule was violated.
    #[error("duplicate record: {0}")]
    Duplicate(String),

    /// The sender's wallet cannot cover the transfer.
    #[error("insufficient balance: have {available} sats, need {required}")]
    InsufficientBalance {
        /// Sats available to the sender.
        available: u64,
        /// Sats the transfer requires.
        required: u64,
    },

    /// The storage backend itself failed.
    #[error("storage error: {0}")]
    Backend(String),
}

/// Result type for data-store mutations.
pub type StoreResult<T> = Result<T, StoreError>;

/// The generic mutation surface handlers run against.
///
/// One method per side effect the catalog can produce. Implementations
/// return created record ids as opaque strings.
#[async_trait]
pub trait AppStore: Send + Sync {
    /// Remember a context note for the user.
    async fn insert_context_note(&self, user: &UserId, note: &str) -> StoreResult<String>;

    /// Forget all of the user's context notes. Returns how many were removed.
    async fn clear_context_notes(&self, user: &UserId) -> StoreResult<u64>;

    /// Create a listing owned by `owner`.
    async fn insert_product(
        &self,
        owner: &UserId,
        title: &str,
        description: Option<&str>,
        price_sats: Option<u64>,
    ) -> StoreResult<String>;

    /// Patch a listing. Fails when it does not exist or `owner` does not own it.
    async fn update_product(
        &self,
        owner: &UserId,
        product_id: &str,
        title: Option<&str>,
        description: Option<&str>,
        price_sats: Option<u64>,
    ) -> StoreResult<()>;

    /// Archive a listing. Same ownership rules as updates.
    async fn archive_product(&self, owner: &UserId, product_id: &str) -> StoreResult<()>;

    /// Deliver a direct message.
    async fn insert_message(
        &self,
        sender: &UserId,
        recipient: &UserId,
        content: &str,
    ) -> StoreResult<String>;

    /// Publish a timeline post.
    async fn insert_timeline_post(&self, author: &UserId, content: &str) -> StoreResult<String>;

    /// Move sats between wallets. Fails when the sender's balance is short.
    async fn transfer_sats(
        &self,
        sender: &UserId,
        recipient: &UserId,
        amount_sats: u64,
        memo: Option<&str>,
    ) -> StoreResult<String>;

    /// Create an invoice requesting sats.
    async fn insert_invoice(
        &self,
        creator: &UserId,
        amount_sats: u64,
        memo: Option<&str>,
    ) -> StoreResult<String>;

    /// Create an organization. Names are unique.
    async fn insert_organization(
        &self,
        founder: &UserId,
        name: &str,
        about: Option<&str>,
    ) -> StoreResult<String>;

    /// Add a member to an organization.
    async fn insert_organization_member(
        &self,
        organization_id: &str,
        inviter: &UserId,
        invitee: &UserId,
        role: &str,
    ) -> StoreResult<()>;

    /// Patch the user's notification settings.
    async fn update_notification_settings(
        &self,
        user: &UserId,
        email_enabled: Option<bool>,
        push_enabled: Option<bool>,
        dm_enabled: Option<bool>,
    ) -> StoreResult<()>;
}

/// A listing row.
#[derive(Debug, Clone)]
pub struct ProductRecord {
    /// Record id.
    pub id: String,
    /// Owning user.
    pub owner: UserId,
    /// Listing title.
    pub title: String,
    /// Listing description.
    pub description: Option<String>,
    /// Asking price.
    pub price_sats: Option<u64>,
    /// Archived listings stay on record but are no longer live.
    pub archived: bool,
}

/// A delivered message row.
#[derive(Debug, Clone)]
pub struct MessageRecord {
    /// Record id.
    pub id: String,
    /// Sending user.
    pub sender: UserId,
    /// Receiving user.
    pub recipient: UserId,
    /// Message body.
    pub content: String,
}

/// A completed sats transfer row.
#[derive(Debug, Clone)]
pub struct PaymentRecord {
    /// Record id.
    pub id: String,
    /// Paying user.
    pub sender: UserId,
    /// Paid user.
    pub recipient: UserId,
    /// Sats moved.
    pub amount_sats: u64,
    /// Optional memo.
    pub memo: Option<String>,
}

/// An organization row.
#[derive(Debug, Clone)]
pub struct OrganizationRecord {
    /// Record id.
    pub id: String,
    /// Founding user.
    pub founder: UserId,
    /// Unique name.
    pub name: String,
    /// Optional description.
    pub about: Option<String>,
}

#[derive(Debug, Default)]
struct Inner {
    notes: Vec<(UserId, String)>,
    products: HashMap<String, ProductRecord>,
    messages: Vec<MessageRecord>,
    posts: Vec<(String, UserId, String)>,
    balances: HashMap<UserId, u64>,
    payments: Vec<PaymentRecord>,
    invoices: Vec<(String, UserId, u64)>,
    organizations: HashMap<String, OrganizationRecord>,
    members: Vec<(String, UserId, String)>,
    notification_settings: HashMap<UserId, (bool, bool, bool)>,
    next_id: u64,
}

impl Inner {
    fn mint_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}_{}", self.next_id)
    }
}

/// In-memory application store. Thread-safe via an internal [`RwLock`].
#[derive(Debug, Default)]
pub struct MemoryAppStore {
    inner: RwLock<Inner>,
}

impl MemoryAppStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a wallet balance, for tests.
    #[must_use]
    pub fn with_balance(self, user: &UserId, sats: u64) -> Self {
        self.write().balances.insert(user.clone(), sats);
        self
    }

    /// A user's current wallet balance.
    #[must_use]
    pub fn balance(&self, user: &UserId) -> u64 {
        self.read().balances.get(user).copied().unwrap_or(0)
    }

    /// Messages delivered so far, oldest first.
    #[must_use]
    pub fn messages(&self) -> Vec<MessageRecord> {
        self.read().messages.clone()
    }

    /// Completed transfers, oldest first.
    #[must_use]
    pub fn payments(&self) -> Vec<PaymentRecord> {
        self.read().payments.clone()
    }

    /// Listings owned by `owner`.
    #[must_use]
    pub fn products_of(&self, owner: &UserId) -> Vec<ProductRecord> {
        self.read()
            .products
            .values()
            .filter(|p| &p.owner == owner)
            .cloned()
            .collect()
    }

    /// Organizations on record.
    #[must_use]
    pub fn organizations(&self) -> Vec<OrganizationRecord> {
        self.read().organizations.values().cloned().collect()
    }

    /// Context notes stored for `user`.
    #[must_use]
    pub fn context_notes(&self, user: &UserId) -> Vec<String> {
        self.read()
            .notes
            .iter()
            .filter(|(owner, _)| owner == user)
            .map(|(_, note)| note.clone())
            .collect()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| {
            tracing::warn!("MemoryAppStore read lock poisoned, recovering");
            e.into_inner()
        })
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| {
            tracing::warn!("MemoryAppStore write lock poisoned, recovering");
            e.into_inner()
        })
    }
}

#[async_trait]
impl AppStore for MemoryAppStore {
    async fn insert_context_note(&self, user: &UserId, note: &str) -> StoreResult<String> {
        let mut inner = self.write();
        let id = inner.mint_id("note");
        inner.notes.push((user.clone(), note.to_string()));
        Ok(id)
    }

    async fn clear_context_notes(&self, user: &UserId) -> StoreResult<u64> {
        let mut inner = self.write();
        let before = inner.notes.len();
        inner.notes.retain(|(owner, _)| owner != user);
        Ok((before - inner.notes.len()) as u64)
    }

    async fn insert_product(
        &self,
        owner: &UserId,
        title: &str,
        description: Option<&str>,
        price_sats: Option<u64>,
    ) -> StoreResult<String> {
        let mut inner = self.write();
        let id = inner.mint_id("prod");
        inner.products.insert(
            id.clone(),
            ProductRecord {
                id: id.clone(),
                owner: owner.clone(),
                title: title.to_string(),
                description: description.map(str::to_string),
                price_sats,
                archived: false,
            },
        );
        Ok(id)
    }

    async fn update_product(
        &self,
        owner: &UserId,
        product_id: &str,
        title: Option<&str>,
        description: Option<&str>,
        price_sats: Option<u64>,
    ) -> StoreResult<()> {
        let mut inner = self.write();
        let product = inner
            .products
            .get_mut(product_id)
            .filter(|p| &p.owner == owner)
            .ok_or_else(|| StoreError::NotFound(product_id.to_string()))?;
        if let Some(title) = title {
            product.title = title.to_string();
        }
        if let Some(description) = description {
            product.description = Some(description.to_string());
        }
        if let Some(price) = price_sats {
            product.price_sats = Some(price);
        }
        Ok(())
    }

    async fn archive_product(&self, owner: &UserId, product_id: &str) -> StoreResult<()> {
        let mut inner = self.write();
        let product = inner
            .products
            .get_mut(product_id)
            .filter(|p| &p.owner == owner)
            .ok_or_else(|| StoreError::NotFound(product_id.to_string()))?;
        product.archived = true;
        Ok(())
    }

    async fn insert_message(
        &self,
        sender: &UserId,
        recipient: &UserId,
        content: &str,
    ) -> StoreResult<String> {
        let mut inner = self.write();
        let id = inner.mint_id("msg");
        inner.messages.push(MessageRecord {
            id: id.clone(),
            sender: sender.clone(),
            recipient: recipient.clone(),
            content: content.to_string(),
        });
        Ok(id)
    }

    async fn insert_timeline_post(&self, author: &UserId, content: &str) -> StoreResult<String> {
        let mut inner = self.write();
        let id = inner.mint_id("post");
        inner
            .posts
            .push((id.clone(), author.clone(), content.to_string()));
        Ok(id)
    }

    async fn transfer_sats(
        &self,
        sender: &UserId,
        recipient: &UserId,
        amount_sats: u64,
        memo: Option<&str>,
    ) -> StoreResult<String> {
        let mut inner = self.write();
        let available = inner.balances.get(sender).copied().unwrap_or(0);
        if available < amount_sats {
            return Err(StoreError::InsufficientBalance {
                available,
                required: amount_sats,
            });
        }
        inner.balances.insert(sender.clone(), available - amount_sats);
        let recipient_balance = inner.balances.get(recipient).copied().unwrap_or(0);
        inner
            .balances
            .insert(recipient.clone(), recipient_balance + amount_sats);

        let id = inner.mint_id("pay");
        inner.payments.push(PaymentRecord {
            id: id.clone(),
            sender: sender.clone(),
            recipient: recipient.clone(),
            amount_sats,
            memo: memo.map(str::to_string),
        });
        Ok(id)
    }

    async fn insert_invoice(
        &self,
        creator: &UserId,
        amount_sats: u64,
        _memo: Option<&str>,
    ) -> StoreResult<String> {
        let mut inner = self.write();
        let id = inner.mint_id("inv");
        inner.invoices.push((id.clone(), creator.clone(), amount_sats));
        Ok(id)
    }

    async fn insert_organization(
        &self,
        founder: &UserId,
        name: &str,
        about: Option<&str>,
    ) -> StoreResult<String> {
        let mut inner = self.write();
        if inner.organizations.values().any(|o| o.name == name) {
            return Err(StoreError::Duplicate(name.to_string()));
        }
        let id = inner.mint_id("org");
        inner.organizations.insert(
            id.clone(),
            OrganizationRecord {
                id: id.clone(),
                founder: founder.clone(),
                name: name.to_string(),
                about: about.map(str::to_string),
            },
        );
        // The founder is a member from day one.
        inner
            .members
            .push((id.clone(), founder.clone(), "founder".to_string()));
        Ok(id)
    }

    async fn insert_organization_member(
        &self,
        organization_id: &str,
        _inviter: &UserId,
        invitee: &UserId,
        role: &str,
    ) -> StoreResult<()> {
        let mut inner = self.write();
        if !inner.organizations.contains_key(organization_id) {
            return Err(StoreError::NotFound(organization_id.to_string()));
        }
        let already_member = inner
            .members
            .iter()
            .any(|(org, member, _)| org == organization_id && member == invitee);
        if already_member {
            return Err(StoreError::Duplicate(format!(
                "{invitee} in {organization_id}"
            )));
        }
        inner
            .members
            .push((organization_id.to_string(), invitee.clone(), role.to_string()));
        Ok(())
    }

    async fn update_notification_settings(
        &self,
        user: &UserId,
        email_enabled: Option<bool>,
        push_enabled: Option<bool>,
        dm_enabled: Option<bool>,
    ) -> StoreResult<()> {
        let mut inner = self.write();
        let entry = inner
            .notification_settings
            .entry(user.clone())
            .or_insert((true, true, true));
        if let Some(email) = email_enabled {
            entry.0 = email;
        }
        if let Some(push) = push_enabled {
            entry.1 = push;
        }
        if let Some(dm) = dm_enabled {
            entry.2 = dm;
        }
        Ok(())
    }
}
