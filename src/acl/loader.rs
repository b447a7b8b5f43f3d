use std::collections::{BTreeSet, HashMap};

use crate::acl::errors::AclError;
use crate::acl::AclState;
use crate::store::{AclGrant, Component, EntityStore, Resource, Role, WILDCARD};

/// Read every role, component, resource and grant from the store and compile
/// them into a permission graph.
pub async fn load_graph(store: &dyn EntityStore) -> Result<AclState, AclError> {
    let roles = store.roles().await?;

    let mut components = Vec::new();
    for component in store.components().await? {
        let resources = store.resources(component.id).await?;
        components.push((component, resources));
    }

    let grants = store.grants().await?;
    let state = compile(&roles, &components, &grants);

    tracing::info!(
        roles = state.roles.len(),
        components = state.components.len(),
        grants = state.grant_count(),
        "Built permission graph"
    );

    Ok(state)
}

/// Build a permission graph from already-loaded rows.
///
/// Tombstoned components and resources are left out, and so is every grant
/// that points at one. The `*` component is not listed as a component, but
/// grants on it are kept since they mean "any component".
pub fn compile(
    roles: &[Role],
    components: &[(Component, Vec<Resource>)],
    grants: &[AclGrant],
) -> AclState {
    let mut state = AclState {
        roles: roles.iter().map(|r| r.name.clone()).collect(),
        ..Default::default()
    };

    let role_names: HashMap<i64, &str> = roles.iter().map(|r| (r.id, r.name.as_str())).collect();
    let mut live_components: HashMap<i64, &str> = HashMap::new();
    let mut live_resources: HashMap<i64, (i64, &str)> = HashMap::new();

    for (component, resources) in components {
        if component.is_removed() {
            continue;
        }
        live_components.insert(component.id, component.name.as_str());

        let mut names = BTreeSet::new();
        for resource in resources
            .iter()
            .filter(|r| r.component_id == component.id && !r.is_removed())
        {
            live_resources.insert(resource.id, (component.id, resource.name.as_str()));
            names.insert(resource.name.clone());
        }

        if component.is_wildcard() {
            continue;
        }
        if names.is_empty() {
            names.insert(WILDCARD.to_string());
        }
        state.components.insert(component.name.clone(), names);
    }

    for grant in grants {
        let role = role_names.get(&grant.role_id);
        let component = live_components.get(&grant.component_id);
        let resource = live_resources
            .get(&grant.resource_id)
            .filter(|(owner, _)| *owner == grant.component_id);

        let (Some(role), Some(component), Some((_, resource))) = (role, component, resource)
        else {
            tracing::debug!(grant = grant.id, "dropping grant on an unknown or removed row");
            continue;
        };

        state
            .grants
            .entry(role.to_string())
            .or_default()
            .entry(component.to_string())
            .or_default()
            .insert(resource.to_string());
    }

    state
}
