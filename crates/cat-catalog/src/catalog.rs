//! Action definitions and the catalog lookup table.
//!
//! The catalog is loaded once at process start and treated as immutable
//! afterwards. Deployments can overlay the built-in set with a TOML config
//! to disable actions or tighten confirmation defaults without recompiling.

use cat_core::{ActionCategory, ActionId, RiskLevel};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{CatalogError, CatalogResult};

/// A single executable action: pure data, no logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionDefinition {
    /// The action's stable id, e.g. `send_payment`.
    pub id: ActionId,
    /// Human-readable name, used in generic descriptions.
    pub name: String,
    /// The permission surface this action belongs to.
    pub category: ActionCategory,
    /// Static risk classification.
    pub risk: RiskLevel,
    /// Whether executions require human confirmation by default.
    ///
    /// A grant's own confirmation flag overrides this per user.
    pub requires_confirmation: bool,
    /// Disabled actions deny at evaluation time regardless of grants.
    pub enabled: bool,
}

impl ActionDefinition {
    /// Create an enabled definition whose confirmation default follows the
    /// risk level.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: ActionCategory,
        risk: RiskLevel,
    ) -> Self {
        Self {
            id: ActionId::new(id),
            name: name.into(),
            category,
            risk,
            requires_confirmation: risk.requires_confirmation(),
            enabled: true,
        }
    }

    /// Override the confirmation default.
    #[must_use]
    pub fn with_confirmation(mut self, requires_confirmation: bool) -> Self {
        self.requires_confirmation = requires_confirmation;
        self
    }

    /// Mark the definition disabled.
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// The set of all known actions, keyed by id.
#[derive(Debug, Clone)]
pub struct ActionCatalog {
    actions: HashMap<ActionId, ActionDefinition>,
}

impl ActionCatalog {
    /// An empty catalog. Useful for tests that register their own actions.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            actions: HashMap::new(),
        }
    }

    /// The built-in action set of the Cat assistant.
    #[must_use]
    pub fn builtin() -> Self {
        use ActionCategory::{
            Communication, Context, Entities, Organization, Payments, Settings,
        };
        use RiskLevel::{High, Low, Medium};

        let defs = [
            ActionDefinition::new("save_context_note", "Save context note", Context, Low),
            ActionDefinition::new("clear_context_notes", "Clear context notes", Context, Low),
            ActionDefinition::new("create_product", "Create listing", Entities, Medium)
                .with_confirmation(true),
            ActionDefinition::new("update_product", "Update listing", Entities, Medium)
                .with_confirmation(true),
            ActionDefinition::new("archive_product", "Archive listing", Entities, Medium)
                .with_confirmation(true),
            ActionDefinition::new("send_message", "Send message", Communication, Medium)
                .with_confirmation(true),
            ActionDefinition::new(
                "post_timeline_update",
                "Post timeline update",
                Communication,
                Medium,
            )
            .with_confirmation(true),
            ActionDefinition::new("send_payment", "Send payment", Payments, High),
            ActionDefinition::new("create_invoice", "Create invoice", Payments, Medium)
                .with_confirmation(true),
            ActionDefinition::new(
                "create_organization",
                "Create organization",
                Organization,
                High,
            ),
            ActionDefinition::new(
                "invite_organization_member",
                "Invite organization member",
                Organization,
                Medium,
            )
            .with_confirmation(true),
            ActionDefinition::new(
                "update_notification_settings",
                "Update notification settings",
                Settings,
                Medium,
            )
            .with_confirmation(true),
        ];

        let mut catalog = Self::empty();
        for def in defs {
            catalog.insert(def);
        }
        catalog
    }

    /// Load the built-in catalog with a TOML overlay applied.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Config`] if the TOML cannot be parsed.
    pub fn builtin_with_overlay(toml_str: &str) -> CatalogResult<Self> {
        let overlay: CatalogOverlay =
            toml::from_str(toml_str).map_err(|e| CatalogError::Config(e.to_string()))?;
        let mut catalog = Self::builtin();
        catalog.apply_overlay(&overlay);
        Ok(catalog)
    }

    /// Insert or replace a definition.
    pub fn insert(&mut self, def: ActionDefinition) {
        self.actions.insert(def.id.clone(), def);
    }

    /// Look up a definition by id.
    #[must_use]
    pub fn get(&self, id: &ActionId) -> Option<&ActionDefinition> {
        self.actions.get(id)
    }

    /// Iterate over every definition, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &ActionDefinition> {
        self.actions.values()
    }

    /// Iterate over the definitions in one category.
    pub fn in_category(
        &self,
        category: ActionCategory,
    ) -> impl Iterator<Item = &ActionDefinition> {
        self.actions.values().filter(move |d| d.category == category)
    }

    /// Number of known actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Apply per-action overrides from a config overlay.
    ///
    /// Overrides naming unknown actions are skipped with a warning so a
    /// stale config line never takes the process down.
    pub fn apply_overlay(&mut self, overlay: &CatalogOverlay) {
        for (id, patch) in &overlay.actions {
            let Some(def) = self.actions.get_mut(&ActionId::new(id.clone())) else {
                tracing::warn!(action = %id, "catalog overlay names unknown action, skipping");
                continue;
            };
            if let Some(enabled) = patch.enabled {
                def.enabled = enabled;
            }
            if let Some(requires_confirmation) = patch.requires_confirmation {
                def.requires_confirmation = requires_confirmation;
            }
        }
    }
}

/// Deployment overrides for the built-in catalog.
///
/// ```toml
/// [actions.send_payment]
/// enabled = false
///
/// [actions.send_message]
/// requires_confirmation = true
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogOverlay {
    /// Per-action patches, keyed by action id.
    #[serde(default)]
    pub actions: HashMap<String, ActionOverride>,
}

/// A single action's overridable fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionOverride {
    /// Force-enable or force-disable the action.
    pub enabled: Option<bool>,
    /// Override the confirmation default.
    pub requires_confirmation: Option<bool>,
}
