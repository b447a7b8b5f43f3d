use crate::acl::types::Access;
use crate::acl::AclState;
use crate::store::WILDCARD;

/// Whether `role` may invoke `resource` on `component`.
///
/// Unknown roles and resources that are not registered on a live component
/// are denied outright, wildcard grants included. Otherwise looks for an
/// exact grant, then a grant on every resource of the component, then a
/// grant on everything. No match means deny.
pub fn is_allowed(state: &AclState, role: &str, component: &str, resource: &str) -> bool {
    if !state.roles.contains(role) || !is_registered(state, component, resource) {
        return false;
    }
    let Some(granted) = state.grants.get(role) else {
        return false;
    };
    let allows = |c: &str, r: &str| granted.get(c).is_some_and(|set| set.contains(r));

    allows(component, resource) || allows(component, WILDCARD) || allows(WILDCARD, WILDCARD)
}

/// Whether `resource` is a live resource of the live `component`.
pub fn is_registered(state: &AclState, component: &str, resource: &str) -> bool {
    state
        .components
        .get(component)
        .is_some_and(|resources| resources.contains(resource))
}

/// Check a role set in order; the first role that is allowed wins.
pub fn has_access<S: AsRef<str>>(
    state: &AclState,
    roles: &[S],
    component: &str,
    resource: &str,
) -> Access {
    for role in roles {
        if is_allowed(state, role.as_ref(), component, resource) {
            tracing::trace!(role = role.as_ref(), component, resource, "access granted");
            return Access::Allow;
        }
    }
    Access::Deny
}

/// Pure membership check against the superuser role name.
pub fn is_super<S: AsRef<str>>(roles: &[S], super_role: &str) -> bool {
    roles.iter().any(|r| r.as_ref() == super_role)
}
