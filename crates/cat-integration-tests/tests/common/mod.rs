//! Shared fixture: a full pipeline wired over in-memory stores.

use std::sync::Arc;

use cat_approval::{MemoryPendingStore, PendingActionStore};
use cat_audit::{ActionLogStore, MemoryActionLog};
use cat_catalog::ActionCatalog;
use cat_core::{ActorId, UserId};
use cat_executor::{ActionExecutor, AppStore, HandlerRegistry, MemoryAppStore};
use cat_permissions::{GrantStore, MemoryGrantStore, PermissionService};

/// Everything a scenario needs, sharing one set of stores.
#[allow(dead_code)]
pub struct Pipeline {
    pub executor: ActionExecutor,
    pub permissions: Arc<PermissionService>,
    pub log: Arc<MemoryActionLog>,
    pub pending: Arc<MemoryPendingStore>,
    pub app: Arc<MemoryAppStore>,
}

#[allow(dead_code)]
impl Pipeline {
    pub fn new() -> Self {
        Self::with_catalog(ActionCatalog::builtin())
    }

    pub fn with_catalog(catalog: ActionCatalog) -> Self {
        let catalog = Arc::new(catalog);
        let grants: Arc<dyn GrantStore> = Arc::new(MemoryGrantStore::new());
        let log = Arc::new(MemoryActionLog::new());
        let permissions = Arc::new(PermissionService::new(
            Arc::clone(&catalog),
            grants,
            Arc::clone(&log) as Arc<dyn ActionLogStore>,
        ));
        let pending = Arc::new(MemoryPendingStore::new());
        let app = Arc::new(MemoryAppStore::new().with_balance(&user(), 100_000));
        let executor = ActionExecutor::new(
            catalog,
            Arc::clone(&permissions),
            Arc::clone(&pending) as Arc<dyn PendingActionStore>,
            Arc::clone(&log) as Arc<dyn ActionLogStore>,
            Arc::new(HandlerRegistry::builtin()),
            Arc::clone(&app) as Arc<dyn AppStore>,
        );
        Self {
            executor,
            permissions,
            log,
            pending,
            app,
        }
    }
}

pub fn user() -> UserId {
    UserId::new("u_alice")
}

pub fn actor() -> ActorId {
    ActorId::new("cat_assistant")
}
