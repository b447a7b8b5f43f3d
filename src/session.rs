use crate::store::Role;

/// Source of the current caller's roles.
///
/// `None` (or an empty list) means there is no authenticated session; the
/// gatekeeper then falls back to the configured default role.
pub trait SessionProvider: Send + Sync {
    fn current_roles(&self) -> Option<Vec<Role>>;
}

/// Session with a fixed set of roles, e.g. resolved by an upstream login layer.
#[derive(Clone, Debug, Default)]
pub struct StaticSession {
    roles: Vec<Role>,
}

impl StaticSession {
    pub fn new(roles: Vec<Role>) -> Self {
        Self { roles }
    }
}

impl SessionProvider for StaticSession {
    fn current_roles(&self) -> Option<Vec<Role>> {
        if self.roles.is_empty() {
            None
        } else {
            Some(self.roles.clone())
        }
    }
}

/// No authenticated user.
#[derive(Clone, Copy, Debug, Default)]
pub struct AnonymousSession;

impl SessionProvider for AnonymousSession {
    fn current_roles(&self) -> Option<Vec<Role>> {
        None
    }
}
