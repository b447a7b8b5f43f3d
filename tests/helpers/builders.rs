use std::fs;
use std::path::Path;

use routekeeper::store::{ensure_role, grant, EntityStore, Role};
use tempfile::TempDir;

/// Builder for a role and its grants
pub struct RoleBuilder {
    name: String,
    description: String,
    grants: Vec<(String, String)>,
}

impl RoleBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: format!("{name} role"),
            grants: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Grant `resource` on `component`; both must already be reconciled.
    pub fn grant(mut self, component: &str, resource: &str) -> Self {
        self.grants
            .push((component.to_string(), resource.to_string()));
        self
    }

    pub async fn create(self, store: &dyn EntityStore) -> Role {
        let role = ensure_role(store, &self.name, &self.description)
            .await
            .expect("Failed to create test role");
        for (component, resource) in &self.grants {
            grant(store, &self.name, component, resource)
                .await
                .expect("Failed to create grant");
        }
        role
    }
}

/// Temporary directory of controller manifests
pub struct ManifestDir {
    dir: TempDir,
}

impl ManifestDir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    /// Write `<class>.kdl`, replacing any previous version.
    pub fn controller(self, class: &str, source: &str) -> Self {
        self.write(class, source);
        self
    }

    pub fn write(&self, class: &str, source: &str) {
        fs::write(self.dir.path().join(format!("{class}.kdl")), source)
            .expect("Failed to write manifest");
    }

    pub fn remove(&self, class: &str) {
        fs::remove_file(self.dir.path().join(format!("{class}.kdl")))
            .expect("Failed to remove manifest");
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}
