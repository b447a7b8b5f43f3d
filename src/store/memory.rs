use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::errors::StoreError;
use crate::store::{AclGrant, Component, EntityStore, Resource, Role};

#[derive(Debug, Default)]
struct Tables {
    next_id: i64,
    roles: Vec<Role>,
    components: Vec<Component>,
    resources: Vec<Resource>,
    grants: Vec<AclGrant>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-process entity store. Rows come back in insertion order, not sorted.
///
/// Reads and writes can be made to fail on demand, which is how callers
/// exercise their handling of store outages.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful create/update calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn read(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("reads disabled".into()));
        }
        Ok(self.lock())
    }

    fn write(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".into()));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn roles(&self) -> Result<Vec<Role>, StoreError> {
        Ok(self.read()?.roles.clone())
    }

    async fn find_role(&self, name: &str) -> Result<Option<Role>, StoreError> {
        Ok(self.read()?.roles.iter().find(|r| r.name == name).cloned())
    }

    async fn create_role(
        &self,
        name: &str,
        description: Option<String>,
    ) -> Result<Role, StoreError> {
        let mut tables = self.write()?;
        let role = Role {
            id: tables.next_id(),
            name: name.to_string(),
            description,
        };
        tables.roles.push(role.clone());
        Ok(role)
    }

    async fn components(&self) -> Result<Vec<Component>, StoreError> {
        Ok(self.read()?.components.clone())
    }

    async fn find_component(&self, name: &str) -> Result<Option<Component>, StoreError> {
        Ok(self
            .read()?
            .components
            .iter()
            .find(|c| c.name == name)
            .cloned())
    }

    async fn create_component(
        &self,
        name: &str,
        description: Option<String>,
    ) -> Result<Component, StoreError> {
        let mut tables = self.write()?;
        let component = Component {
            id: tables.next_id(),
            name: name.to_string(),
            description,
            removed_at: None,
        };
        tables.components.push(component.clone());
        Ok(component)
    }

    async fn update_component(&self, component: &Component) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        let row = tables
            .components
            .iter_mut()
            .find(|c| c.id == component.id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "component",
                key: component.id.to_string(),
            })?;
        *row = component.clone();
        Ok(())
    }

    async fn resources(&self, component_id: i64) -> Result<Vec<Resource>, StoreError> {
        Ok(self
            .read()?
            .resources
            .iter()
            .filter(|r| r.component_id == component_id)
            .cloned()
            .collect())
    }

    async fn find_resource(
        &self,
        component_id: i64,
        name: &str,
    ) -> Result<Option<Resource>, StoreError> {
        Ok(self
            .read()?
            .resources
            .iter()
            .find(|r| r.component_id == component_id && r.name == name)
            .cloned())
    }

    async fn create_resource(
        &self,
        component_id: i64,
        name: &str,
        api_alias: Option<String>,
    ) -> Result<Resource, StoreError> {
        let mut tables = self.write()?;
        let resource = Resource {
            id: tables.next_id(),
            component_id,
            name: name.to_string(),
            api_alias,
            removed_at: None,
        };
        tables.resources.push(resource.clone());
        Ok(resource)
    }

    async fn update_resource(&self, resource: &Resource) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        let row = tables
            .resources
            .iter_mut()
            .find(|r| r.id == resource.id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "resource",
                key: resource.id.to_string(),
            })?;
        *row = resource.clone();
        Ok(())
    }

    async fn grants(&self) -> Result<Vec<AclGrant>, StoreError> {
        Ok(self.read()?.grants.clone())
    }

    async fn create_grant(
        &self,
        role_id: i64,
        component_id: i64,
        resource_id: i64,
    ) -> Result<AclGrant, StoreError> {
        let mut tables = self.write()?;
        let grant = AclGrant {
            id: tables.next_id(),
            role_id,
            component_id,
            resource_id,
        };
        tables.grants.push(grant.clone());
        Ok(grant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rows_keep_insertion_order() {
        let store = MemoryStore::new();
        store.create_component("users", None).await.unwrap();
        store.create_component("auth", None).await.unwrap();

        let names: Vec<_> = store
            .components()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["users", "auth"]);
    }

    #[tokio::test]
    async fn test_update_missing_row() {
        let store = MemoryStore::new();
        let ghost = Component {
            id: 42,
            name: "ghost".into(),
            description: None,
            removed_at: None,
        };
        let err = store.update_component(&ghost).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "component", .. }));
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = MemoryStore::new();
        store.set_fail_writes(true);
        assert!(matches!(
            store.create_role("admin", None).await,
            Err(StoreError::Unavailable(_))
        ));
        assert_eq!(store.write_count(), 0);

        store.set_fail_writes(false);
        store.create_role("admin", None).await.unwrap();
        assert_eq!(store.write_count(), 1);

        store.set_fail_reads(true);
        assert!(store.roles().await.is_err());
    }
}
