//! Reconcile a freshly scanned [`RouteTree`] against persisted components
//! and resources.
//!
//! Pass 1 walks every persisted component (alphabetically) and tombstones,
//! reactivates or refreshes it. Pass 2 walks the route tree and creates rows
//! for anything the store has never seen. Nothing is ever hard-deleted.
//! Running twice over an unchanged tree adds and removes nothing and issues
//! no writes.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::StoreError;
use crate::routes::RouteTree;
use crate::store::{EntityStore, WILDCARD};

/// What a reconciliation touched: component name -> resource names.
///
/// `failed` maps components whose controller did not scan to the error; their
/// rows were left as they were.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadReport {
    pub processed: BTreeMap<String, Vec<String>>,
    pub updated: BTreeMap<String, Vec<String>>,
    pub removed: BTreeMap<String, Vec<String>>,
    pub added: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub failed: BTreeMap<String, String>,
}

impl WorkloadReport {
    fn touch(map: &mut BTreeMap<String, Vec<String>>, component: &str) {
        map.entry(component.to_string()).or_default();
    }

    fn record(map: &mut BTreeMap<String, Vec<String>>, component: &str, resource: &str) {
        map.entry(component.to_string())
            .or_default()
            .push(resource.to_string());
    }

    /// True when nothing was added or removed.
    pub fn is_steady(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// True when every controller scanned.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

pub async fn reconcile(
    tree: &RouteTree,
    store: &dyn EntityStore,
) -> Result<WorkloadReport, StoreError> {
    let now = Utc::now().timestamp();
    let mut report = WorkloadReport::default();

    sweep_existing(tree, store, now, &mut report).await?;
    add_new(tree, store, &mut report).await?;

    info!(
        processed = report.processed.len(),
        updated = report.updated.len(),
        removed = report.removed.len(),
        added = report.added.len(),
        "Route reconciliation finished"
    );

    Ok(report)
}

async fn sweep_existing(
    tree: &RouteTree,
    store: &dyn EntityStore,
    now: i64,
    report: &mut WorkloadReport,
) -> Result<(), StoreError> {
    let mut components = store.components().await?;
    components.sort_by(|a, b| a.name.cmp(&b.name));

    for mut component in components {
        let name = component.name.clone();
        if tree.is_skipped(&name) {
            warn!(component = %name, "controller failed to scan, leaving its rows untouched");
            continue;
        }

        let routes = tree.get(&name);
        let mut resources = store.resources(component.id).await?;
        resources.sort_by(|a, b| a.name.cmp(&b.name));

        WorkloadReport::touch(&mut report.processed, &name);

        if routes.is_none() && !component.is_wildcard() {
            if component.removed_at.is_none() {
                component.removed_at = Some(now);
                store.update_component(&component).await?;
                WorkloadReport::touch(&mut report.removed, &name);
                info!(component = %name, "component removed");
            }

            for mut resource in resources {
                if !resource.is_wildcard() && resource.removed_at.is_none() {
                    resource.removed_at = Some(now);
                    store.update_resource(&resource).await?;
                    WorkloadReport::record(&mut report.removed, &name, &resource.name);
                }
                WorkloadReport::record(&mut report.processed, &name, &resource.name);
            }
            continue;
        }

        let mut changed = false;
        if component.removed_at.take().is_some() {
            info!(component = %name, "component reactivated");
            changed = true;
        }
        if let Some(routes) = routes {
            if component.description != routes.description {
                component.description = routes.description.clone();
                changed = true;
            }
        }
        if changed {
            store.update_component(&component).await?;
        }
        WorkloadReport::touch(&mut report.updated, &name);

        for mut resource in resources {
            let descriptor = routes.and_then(|r| r.resources.get(&resource.name));

            if descriptor.is_none() && !resource.is_wildcard() {
                if resource.removed_at.is_none() {
                    resource.removed_at = Some(now);
                    store.update_resource(&resource).await?;
                    WorkloadReport::record(&mut report.removed, &name, &resource.name);
                    debug!(component = %name, resource = %resource.name, "resource removed");
                }
            } else {
                let mut changed = resource.removed_at.take().is_some();
                if let Some(descriptor) = descriptor {
                    let alias = descriptor.api_alias(&resource.name);
                    if resource.api_alias != alias {
                        resource.api_alias = alias;
                        changed = true;
                    }
                }
                if changed {
                    store.update_resource(&resource).await?;
                    debug!(component = %name, resource = %resource.name, "resource updated");
                }
                WorkloadReport::record(&mut report.updated, &name, &resource.name);
            }

            WorkloadReport::record(&mut report.processed, &name, &resource.name);
        }
    }

    Ok(())
}

async fn add_new(
    tree: &RouteTree,
    store: &dyn EntityStore,
    report: &mut WorkloadReport,
) -> Result<(), StoreError> {
    for (name, routes) in &tree.controllers {
        let component = match store.find_component(name).await? {
            Some(component) => component,
            None => {
                let component = store
                    .create_component(name, routes.description.clone())
                    .await?;
                store.create_resource(component.id, WILDCARD, None).await?;
                WorkloadReport::touch(&mut report.added, name);
                WorkloadReport::touch(&mut report.processed, name);
                info!(component = %name, "component added");
                component
            }
        };

        let known: BTreeSet<String> = store
            .resources(component.id)
            .await?
            .into_iter()
            .map(|r| r.name)
            .collect();

        if !known.contains(WILDCARD) {
            store.create_resource(component.id, WILDCARD, None).await?;
            WorkloadReport::record(&mut report.added, name, WILDCARD);
            WorkloadReport::record(&mut report.processed, name, WILDCARD);
            warn!(component = %name, "component had no wildcard resource, created one");
        }

        for (resource, descriptor) in &routes.resources {
            if known.contains(resource) {
                continue;
            }
            store
                .create_resource(component.id, resource, descriptor.api_alias(resource))
                .await?;
            WorkloadReport::record(&mut report.added, name, resource);
            WorkloadReport::record(&mut report.processed, name, resource);
            debug!(component = %name, resource = %resource, "resource added");
        }
    }

    Ok(())
}
