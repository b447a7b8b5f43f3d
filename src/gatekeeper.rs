//! Process-wide access service: keeps persisted routes in step with the
//! controllers and answers per-request permission checks.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};

use crate::acl::engine;
use crate::acl::errors::AclError;
use crate::acl::loader::load_graph;
use crate::acl::types::{Access, CheckResponse};
use crate::acl::AclState;
use crate::cache::KeyValueCache;
use crate::errors::StoreError;
use crate::reconcile::{reconcile, WorkloadReport};
use crate::routes::{scan, ControllerRegistry, RouteTree};
use crate::session::SessionProvider;
use crate::settings::Settings;
use crate::store::{EntityStore, Role};

/// Cache key the scanned route tree is stored under.
pub const ROUTES_CACHE_KEY: &str = "routes";

#[derive(Debug, Clone)]
pub struct AccessPolicy {
    /// Role assumed when there is no authenticated session
    pub default_role: String,
    /// Role that bypasses every permission check
    pub super_role: String,
    pub routes_ttl: Duration,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self {
            default_role: "default".to_string(),
            super_role: "Super".to_string(),
            routes_ttl: Duration::from_secs(86_400),
        }
    }
}

impl From<&Settings> for AccessPolicy {
    fn from(settings: &Settings) -> Self {
        Self {
            default_role: settings.access.default_role.clone(),
            super_role: settings.access.super_role.clone(),
            routes_ttl: settings.cache.routes_ttl(),
        }
    }
}

pub struct Gatekeeper {
    store: Arc<dyn EntityStore>,
    cache: Arc<dyn KeyValueCache>,
    registry: Arc<ControllerRegistry>,
    policy: AccessPolicy,
    graph: RwLock<Option<Arc<AclState>>>,
    reconcile_lock: Mutex<()>,
}

impl Gatekeeper {
    pub fn new(
        store: Arc<dyn EntityStore>,
        cache: Arc<dyn KeyValueCache>,
        registry: Arc<ControllerRegistry>,
        policy: AccessPolicy,
    ) -> Self {
        Self {
            store,
            cache,
            registry,
            policy,
            graph: RwLock::new(None),
            reconcile_lock: Mutex::new(()),
        }
    }

    /// Scan and reconcile unless the route tree is already cached.
    ///
    /// Returns the report when a reconciliation ran. A warm cache answers
    /// without touching the lock. Cold callers are serialized; the ones that
    /// wait find the fresh cache entry and return `None`.
    pub async fn ensure_routes(&self) -> Result<Option<WorkloadReport>, StoreError> {
        if self.routes_cached() {
            return Ok(None);
        }

        let _guard = self.reconcile_lock.lock().await;
        if self.routes_cached() {
            return Ok(None);
        }

        self.refresh().await.map(Some)
    }

    fn routes_cached(&self) -> bool {
        match self.cache.has(ROUTES_CACHE_KEY) {
            Ok(cached) => cached,
            Err(e) => {
                tracing::warn!(error = %e, "route cache unavailable, rebuilding routes");
                false
            }
        }
    }

    /// Unconditional scan and reconcile.
    pub async fn reconcile_now(&self) -> Result<WorkloadReport, StoreError> {
        let _guard = self.reconcile_lock.lock().await;
        self.refresh().await
    }

    /// Failed controllers are listed in the report's `failed` map.
    async fn refresh(&self) -> Result<WorkloadReport, StoreError> {
        let scan = scan(&self.registry);
        let tree = &scan.tree;
        let mut report = reconcile(tree, self.store.as_ref()).await?;
        report.failed = scan.failures();

        // cached only once reconciled, so a failed run is retried next call
        match serde_json::to_value(tree) {
            Ok(value) => {
                if let Err(e) = self
                    .cache
                    .set(ROUTES_CACHE_KEY, value, self.policy.routes_ttl)
                {
                    tracing::warn!(error = %e, "failed to cache route tree");
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to serialize route tree"),
        }

        self.invalidate().await;
        Ok(report)
    }

    /// The cached route tree, or a fresh scan when it is missing.
    pub fn route_tree(&self) -> RouteTree {
        match self.cache.get(ROUTES_CACHE_KEY) {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(tree) => return tree,
                Err(e) => tracing::warn!(error = %e, "cached route tree is unreadable"),
            },
            Ok(None) => {}
            Err(e) => tracing::debug!(error = %e, "route cache unavailable"),
        }
        scan(&self.registry).tree
    }

    /// Current permission graph, built on first use.
    pub async fn graph(&self) -> Result<Arc<AclState>, AclError> {
        if let Some(state) = self.graph.read().await.as_ref() {
            return Ok(Arc::clone(state));
        }

        let mut slot = self.graph.write().await;
        if let Some(state) = slot.as_ref() {
            return Ok(Arc::clone(state));
        }
        let state = Arc::new(load_graph(self.store.as_ref()).await?);
        *slot = Some(Arc::clone(&state));
        Ok(state)
    }

    /// Drop the permission graph; the next check rebuilds it.
    pub async fn invalidate(&self) {
        *self.graph.write().await = None;
        tracing::debug!("permission graph invalidated");
    }

    /// Session roles, or the default role when there is no session.
    pub async fn roles(&self, session: &dyn SessionProvider) -> Result<Vec<Role>, AclError> {
        match session.current_roles() {
            Some(roles) if !roles.is_empty() => Ok(roles),
            _ => Ok(vec![self.default_role().await?]),
        }
    }

    async fn default_role(&self) -> Result<Role, AclError> {
        self.store
            .find_role(&self.policy.default_role)
            .await?
            .ok_or_else(|| AclError::RoleNotFound(self.policy.default_role.clone()))
    }

    pub async fn has_access(
        &self,
        session: &dyn SessionProvider,
        controller: &str,
        action: &str,
    ) -> Result<Access, AclError> {
        let roles = role_names(&self.roles(session).await?);
        let graph = self.graph().await?;
        Ok(engine::has_access(&graph, &roles, controller, action))
    }

    pub async fn is_super(&self, session: &dyn SessionProvider) -> Result<bool, AclError> {
        let roles = role_names(&self.roles(session).await?);
        Ok(engine::is_super(&roles, &self.policy.super_role))
    }

    /// Per-request gate: make sure routes are reconciled, let the superuser
    /// through, otherwise check the grants. Any failure denies.
    pub async fn authorize(
        &self,
        session: &dyn SessionProvider,
        controller: &str,
        action: &str,
    ) -> Access {
        if let Err(e) = self.ensure_routes().await {
            tracing::error!(error = %e, "route reconciliation failed");
        }

        match self.is_super(session).await {
            Ok(true) => return Access::Allow,
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(error = %e, controller, action, "access check failed, denying");
                return Access::Deny;
            }
        }

        match self.has_access(session, controller, action).await {
            Ok(access) => access,
            Err(e) => {
                tracing::warn!(error = %e, controller, action, "access check failed, denying");
                Access::Deny
            }
        }
    }

    /// Evaluate explicit role names. Unknown names carry no grants; an empty
    /// list falls back to the default role.
    pub async fn check_roles(
        &self,
        roles: &[String],
        component: &str,
        resource: &str,
    ) -> Result<CheckResponse, AclError> {
        let roles = if roles.is_empty() {
            vec![self.default_role().await?.name]
        } else {
            roles.to_vec()
        };

        let is_super = engine::is_super(&roles, &self.policy.super_role);
        let access = if is_super {
            Access::Allow
        } else {
            let graph = self.graph().await?;
            engine::has_access(&graph, &roles, component, resource)
        };

        Ok(CheckResponse {
            allowed: access.is_allowed(),
            access,
            is_super,
        })
    }
}

fn role_names(roles: &[Role]) -> Vec<String> {
    roles.iter().map(|r| r.name.clone()).collect()
}
