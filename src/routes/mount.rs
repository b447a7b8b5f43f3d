use serde::{Deserialize, Serialize};

use crate::routes::resolver::convention;
use crate::routes::types::{HttpVerb, RouteTree};

/// One concrete route for the dispatch layer to register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountedRoute {
    pub verb: HttpVerb,
    pub path: String,
    /// Fully-qualified controller class
    pub controller: String,
    /// Action method name
    pub action: String,
    pub name: Option<String>,
}

const REST_ACTIONS: [&str; 5] = ["index", "get", "put", "post", "delete"];

/// Flatten a route tree into mountable routes, sorted by path then verb.
pub fn mount_table(tree: &RouteTree) -> Vec<MountedRoute> {
    let mut table = Vec::new();

    for routes in tree.controllers.values() {
        for route in routes.resources.values() {
            let Some(path) = &route.path else {
                continue;
            };
            for verb in &route.verbs {
                table.push(MountedRoute {
                    verb: *verb,
                    path: normalize(path),
                    controller: routes.class.clone(),
                    action: route.method.clone(),
                    name: route.alias.clone(),
                });
            }
        }

        if routes.rest_defaults {
            for action in REST_ACTIONS {
                let Some(existing) = routes
                    .resources
                    .iter()
                    .find(|(name, _)| name.to_lowercase() == action)
                    .map(|(_, route)| route)
                else {
                    continue;
                };
                let Some(scaffold) = convention(&existing.method, &routes.prefix) else {
                    continue;
                };
                let (Some(verb), Some(path)) = (scaffold.verb(), scaffold.path.as_deref()) else {
                    continue;
                };
                let path = normalize(path);
                let already = table.iter().any(|m| {
                    m.controller == routes.class && m.verb == verb && m.path == path
                });
                if !already {
                    table.push(MountedRoute {
                        verb,
                        path,
                        controller: routes.class.clone(),
                        action: existing.method.clone(),
                        name: None,
                    });
                }
            }
        }
    }

    table.sort_by(|a, b| {
        a.path
            .cmp(&b.path)
            .then(a.verb.cmp(&b.verb))
            .then(a.controller.cmp(&b.controller))
    });
    table
}

/// Strip trailing slashes; the root stays `/`.
fn normalize(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}
