use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A declarative marker attached to a controller class or action method.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Directive {
    pub name: String,
    /// Positional arguments, in declaration order
    #[serde(default)]
    pub args: Vec<String>,
    /// Named arguments, stringified
    #[serde(default)]
    pub named: BTreeMap<String, String>,
}

impl Directive {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn with_named(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.named.insert(key.into(), value.into());
        self
    }

    pub fn first_arg(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl HttpVerb {
    /// Verbs a `Route` directive maps to when it names none.
    pub const ROUTE_DEFAULTS: [HttpVerb; 4] =
        [HttpVerb::Get, HttpVerb::Put, HttpVerb::Post, HttpVerb::Delete];

    /// Case-insensitive parse of a verb name.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "GET" => Some(HttpVerb::Get),
            "POST" => Some(HttpVerb::Post),
            "PUT" => Some(HttpVerb::Put),
            "DELETE" => Some(HttpVerb::Delete),
            "PATCH" => Some(HttpVerb::Patch),
            "HEAD" => Some(HttpVerb::Head),
            "OPTIONS" => Some(HttpVerb::Options),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpVerb::Get => "GET",
            HttpVerb::Post => "POST",
            HttpVerb::Put => "PUT",
            HttpVerb::Delete => "DELETE",
            HttpVerb::Patch => "PATCH",
            HttpVerb::Head => "HEAD",
            HttpVerb::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved route of one action method.
///
/// An empty `verbs` list means the method is not routable; it is still
/// recorded as a resource so it can be granted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDescriptor {
    pub method: String,
    #[serde(default)]
    pub verbs: Vec<HttpVerb>,
    pub path: Option<String>,
    pub alias: Option<String>,
}

impl RouteDescriptor {
    pub fn unroutable(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            verbs: Vec::new(),
            path: None,
            alias: None,
        }
    }

    /// Primary verb (the directive's verb, or the first of a `Route` list).
    pub fn verb(&self) -> Option<HttpVerb> {
        self.verbs.first().copied()
    }

    pub fn is_routable(&self) -> bool {
        !self.verbs.is_empty() && self.path.is_some()
    }

    /// Alias persisted on the resource row: the explicit alias, else the
    /// resource name, and nothing at all for unroutable methods.
    pub fn api_alias(&self, resource: &str) -> Option<String> {
        self.verb()?;
        Some(self.alias.clone().unwrap_or_else(|| resource.to_string()))
    }
}

/// Everything discovered about one controller.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ControllerRoutes {
    /// Fully-qualified class name
    pub class: String,
    #[serde(default)]
    pub prefix: String,
    pub description: Option<String>,
    /// Set by `RouteDefault "Rest"`
    #[serde(default)]
    pub rest_defaults: bool,
    /// resource name (method without the `Action` suffix) -> descriptor
    #[serde(default)]
    pub resources: BTreeMap<String, RouteDescriptor>,
}

/// Result of scanning all controllers, keyed by component short name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RouteTree {
    #[serde(default)]
    pub controllers: BTreeMap<String, ControllerRoutes>,
    /// Controllers whose scan failed; their persisted rows must not be touched
    #[serde(default)]
    pub skipped: BTreeSet<String>,
}

impl RouteTree {
    pub fn get(&self, component: &str) -> Option<&ControllerRoutes> {
        self.controllers.get(component)
    }

    pub fn is_skipped(&self, component: &str) -> bool {
        self.skipped.contains(component)
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn resource_count(&self) -> usize {
        self.controllers.values().map(|c| c.resources.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verb_parse() {
        assert_eq!(HttpVerb::parse("get"), Some(HttpVerb::Get));
        assert_eq!(HttpVerb::parse(" Delete "), Some(HttpVerb::Delete));
        assert_eq!(HttpVerb::parse("PATCH"), Some(HttpVerb::Patch));
        assert_eq!(HttpVerb::parse("FETCH"), None);
        assert_eq!(HttpVerb::Options.to_string(), "OPTIONS");
    }

    #[test]
    fn test_api_alias() {
        let routed = RouteDescriptor {
            method: "searchAction".into(),
            verbs: vec![HttpVerb::Get],
            path: Some("/users/search".into()),
            alias: Some("users.search".into()),
        };
        assert_eq!(routed.api_alias("search").as_deref(), Some("users.search"));

        let unnamed = RouteDescriptor {
            alias: None,
            ..routed.clone()
        };
        assert_eq!(unnamed.api_alias("search").as_deref(), Some("search"));

        let unroutable = RouteDescriptor::unroutable("helperAction");
        assert!(!unroutable.is_routable());
        assert_eq!(unroutable.api_alias("helper"), None);
    }

    #[test]
    fn test_tree_serde_defaults() {
        let tree: RouteTree = serde_json::from_str(
            r#"{ "controllers": { "users": { "class": "app::controllers::UsersController", "description": null } } }"#,
        )
        .unwrap();
        let users = tree.get("users").unwrap();
        assert_eq!(users.prefix, "");
        assert!(!users.rest_defaults);
        assert!(users.resources.is_empty());
        assert!(tree.skipped.is_empty());
    }
}
