//! Entity store contract used by the reconciler and the access evaluator.
//!
//! Rows are never physically deleted through this interface: components and
//! resources carry a `removed_at` tombstone instead, so ACL grants that point
//! at an old resource stay referentially valid.

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::StoreError;

/// Name of the wildcard component/resource ("any controller" / "any action").
pub const WILDCARD: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub removed_at: Option<i64>,
}

impl Component {
    pub fn is_removed(&self) -> bool {
        self.removed_at.is_some()
    }

    pub fn is_wildcard(&self) -> bool {
        self.name == WILDCARD
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: i64,
    pub component_id: i64,
    pub name: String,
    pub api_alias: Option<String>,
    pub removed_at: Option<i64>,
}

impl Resource {
    pub fn is_removed(&self) -> bool {
        self.removed_at.is_some()
    }

    pub fn is_wildcard(&self) -> bool {
        self.name == WILDCARD
    }
}

/// "role may invoke resource on component". There are no deny rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclGrant {
    pub id: i64,
    pub role_id: i64,
    pub component_id: i64,
    pub resource_id: i64,
}

/// Generic find/save access to the persisted ACL model.
///
/// List operations make no ordering promise; callers that need a stable
/// order sort the result themselves.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn roles(&self) -> Result<Vec<Role>, StoreError>;
    async fn find_role(&self, name: &str) -> Result<Option<Role>, StoreError>;
    async fn create_role(
        &self,
        name: &str,
        description: Option<String>,
    ) -> Result<Role, StoreError>;

    /// All components, tombstoned ones included.
    async fn components(&self) -> Result<Vec<Component>, StoreError>;
    async fn find_component(&self, name: &str) -> Result<Option<Component>, StoreError>;
    async fn create_component(
        &self,
        name: &str,
        description: Option<String>,
    ) -> Result<Component, StoreError>;
    async fn update_component(&self, component: &Component) -> Result<(), StoreError>;

    /// All resources owned by `component_id`, tombstoned ones included.
    async fn resources(&self, component_id: i64) -> Result<Vec<Resource>, StoreError>;
    async fn find_resource(
        &self,
        component_id: i64,
        name: &str,
    ) -> Result<Option<Resource>, StoreError>;
    async fn create_resource(
        &self,
        component_id: i64,
        name: &str,
        api_alias: Option<String>,
    ) -> Result<Resource, StoreError>;
    async fn update_resource(&self, resource: &Resource) -> Result<(), StoreError>;

    async fn grants(&self) -> Result<Vec<AclGrant>, StoreError>;
    async fn create_grant(
        &self,
        role_id: i64,
        component_id: i64,
        resource_id: i64,
    ) -> Result<AclGrant, StoreError>;
}

/// Create the role if it does not exist yet and return it.
pub async fn ensure_role(
    store: &dyn EntityStore,
    name: &str,
    description: &str,
) -> Result<Role, StoreError> {
    if let Some(role) = store.find_role(name).await? {
        return Ok(role);
    }
    let role = store
        .create_role(name, Some(description.to_string()))
        .await?;
    tracing::info!(role = %role.name, "Seeded role");
    Ok(role)
}

/// Grant `role` access to `resource` on `component`, looking rows up by name.
pub async fn grant(
    store: &dyn EntityStore,
    role: &str,
    component: &str,
    resource: &str,
) -> Result<AclGrant, StoreError> {
    let role_row = store
        .find_role(role)
        .await?
        .ok_or_else(|| StoreError::NotFound {
            entity: "role",
            key: role.to_string(),
        })?;
    let component_row =
        store
            .find_component(component)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                entity: "component",
                key: component.to_string(),
            })?;
    let resource_row = store
        .find_resource(component_row.id, resource)
        .await?
        .ok_or_else(|| StoreError::NotFound {
            entity: "resource",
            key: format!("{component}/{resource}"),
        })?;
    store
        .create_grant(role_row.id, component_row.id, resource_row.id)
        .await
}
