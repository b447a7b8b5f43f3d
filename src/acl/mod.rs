pub mod engine;
pub mod errors;
pub mod loader;
pub mod types;

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

pub use types::Access;

/// Compiled permission graph, built from the persisted roles, components,
/// resources and grants.
/// Immutable after construction; grant changes require a rebuild.
#[derive(Debug, Default)]
pub struct AclState {
    /// Every role name known to the store
    pub roles: BTreeSet<String>,
    /// live component -> live resource names (`*` when it declares none)
    pub components: BTreeMap<String, BTreeSet<String>>,
    /// role -> component -> granted resources
    pub grants: HashMap<String, HashMap<String, HashSet<String>>>,
}

impl AclState {
    pub fn grant_count(&self) -> usize {
        self.grants
            .values()
            .flat_map(HashMap::values)
            .map(HashSet::len)
            .sum()
    }
}
