use std::collections::BTreeMap;
use std::path::Path;

use crate::routes::errors::RouteError;
use crate::routes::manifest::load_manifests;
use crate::routes::registry::{ControllerRegistry, MetadataReader};
use crate::routes::resolver::resolve;
use crate::routes::types::{ControllerRoutes, Directive, RouteTree};
use crate::routes::{ACTION_SUFFIX, CONTROLLER_SUFFIX};

/// Outcome of a scan: the routes that resolved, plus one error per
/// controller that did not, keyed by component name.
#[derive(Debug, Default)]
pub struct Scan {
    pub tree: RouteTree,
    pub errors: BTreeMap<String, RouteError>,
}

impl Scan {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Component name -> error message, for reporting.
    pub fn failures(&self) -> BTreeMap<String, String> {
        self.errors
            .iter()
            .map(|(component, e)| (component.clone(), e.to_string()))
            .collect()
    }

    fn fail(&mut self, component: String, error: RouteError) {
        tracing::error!(%component, error = %error, "controller scan failed");
        self.tree.skipped.insert(component.clone());
        self.errors.insert(component, error);
    }
}

/// Load controller manifests from `dir` and scan them.
pub fn scan_directory(dir: &Path, namespace: &str) -> Result<Scan, RouteError> {
    let registry = load_manifests(dir, namespace)?;
    Ok(scan(&registry))
}

/// Build the route tree for every registered controller.
///
/// A controller whose directives fail to resolve, or whose definition was
/// rejected at load time, is left out of the tree and listed in
/// `tree.skipped`; the remaining controllers are still scanned.
pub fn scan(registry: &ControllerRegistry) -> Scan {
    let mut scan = Scan::default();

    for (class, reason) in registry.rejected() {
        if let Some(short) = short_name(class) {
            let error = RouteError::Rejected {
                class: class.to_string(),
                reason: reason.to_string(),
            };
            scan.fail(short, error);
        }
    }

    for class in registry.classes() {
        let Some(short) = short_name(class) else {
            tracing::debug!(%class, "skipping class without the Controller suffix");
            continue;
        };

        match scan_controller(registry, class) {
            Ok(routes) => {
                tracing::debug!(
                    component = %short,
                    resources = routes.resources.len(),
                    prefix = %routes.prefix,
                    "scanned controller"
                );
                scan.tree.controllers.insert(short, routes);
            }
            Err(e) => scan.fail(short, e),
        }
    }

    tracing::info!(
        controllers = scan.tree.len(),
        resources = scan.tree.resource_count(),
        failed = scan.errors.len(),
        "Route scan finished"
    );

    scan
}

fn scan_controller(
    reader: &dyn MetadataReader,
    class: &str,
) -> Result<ControllerRoutes, RouteError> {
    let class_directives = reader.class_directives(class);
    let prefix = first_arg_of(&class_directives, "RoutePrefix").unwrap_or_default();
    let description = first_arg_of(&class_directives, "Description");
    let rest_defaults = first_arg_of(&class_directives, "RouteDefault")
        .map(|kind| kind == "Rest")
        .unwrap_or(false);

    let method_directives = reader.method_directives(class);
    let mut resources = BTreeMap::new();

    for method in reader.class_methods(class) {
        let Some(resource) = resource_name(&method) else {
            continue;
        };
        let directives = method_directives
            .get(&method)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let route = resolve(class, &method, &prefix, directives)?;
        resources.insert(resource.to_string(), route);
    }

    Ok(ControllerRoutes {
        class: class.to_string(),
        prefix,
        description,
        rest_defaults,
        resources,
    })
}

/// `app::controllers::UsersController` -> `users`
pub fn short_name(class: &str) -> Option<String> {
    let base = class.rsplit("::").next().unwrap_or(class);
    let stem = base.strip_suffix(CONTROLLER_SUFFIX)?;
    if stem.is_empty() {
        return None;
    }
    Some(stem.to_lowercase())
}

/// `changePasswordAction` -> `changePassword`; `None` for non-actions.
pub fn resource_name(method: &str) -> Option<&str> {
    method
        .strip_suffix(ACTION_SUFFIX)
        .filter(|stem| !stem.is_empty())
}

fn first_arg_of(directives: &[Directive], name: &str) -> Option<String> {
    directives
        .iter()
        .find(|d| d.name == name)
        .and_then(|d| d.first_arg())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::registry::ControllerDef;
    use crate::routes::types::HttpVerb;

    fn registry() -> ControllerRegistry {
        ControllerRegistry::new("app::controllers")
            .with(
                ControllerDef::new("UsersController")
                    .directive(Directive::new("RoutePrefix").with_arg("/users"))
                    .directive(Directive::new("Description").with_arg("User management"))
                    .action("indexAction")
                    .action("getAction")
                    .method(
                        "changePasswordAction",
                        vec![Directive::new("Put").with_arg("/{id}/password")],
                    )
                    .action("formatName")
                    .action("searchAction"),
            )
            .with(ControllerDef::new("AuthController").method(
                "loginAction",
                vec![Directive::new("Post").with_arg("/login").with_arg("auth.login")],
            ))
    }

    #[test]
    fn test_scan_builds_tree() {
        let scan = scan(&registry());
        assert!(scan.is_clean());

        let names: Vec<_> = scan.tree.controllers.keys().cloned().collect();
        assert_eq!(names, vec!["auth", "users"]);

        let users = scan.tree.get("users").unwrap();
        assert_eq!(users.class, "app::controllers::UsersController");
        assert_eq!(users.prefix, "/users");
        assert_eq!(users.description.as_deref(), Some("User management"));
        assert!(!users.rest_defaults);

        let resources: Vec<_> = users.resources.keys().cloned().collect();
        assert_eq!(resources, vec!["changePassword", "get", "index", "search"]);

        let get = &users.resources["get"];
        assert_eq!(get.method, "getAction");
        assert_eq!(get.verb(), Some(HttpVerb::Get));
        assert_eq!(get.path.as_deref(), Some("/users/{id}"));

        let change = &users.resources["changePassword"];
        assert_eq!(change.path.as_deref(), Some("/users/{id}/password"));

        assert!(!users.resources["search"].is_routable());

        let auth = scan.tree.get("auth").unwrap();
        assert_eq!(auth.prefix, "");
        assert_eq!(auth.description, None);
        assert_eq!(auth.resources["login"].alias.as_deref(), Some("auth.login"));
    }

    #[test]
    fn test_failed_controller_is_skipped() {
        let registry = registry().with(ControllerDef::new("BrokenController").method(
            "oopsAction",
            vec![Directive::new("Get").with_arg("/a").with_arg("b").with_arg("c")],
        ));

        let scan = scan(&registry);
        assert_eq!(scan.errors.len(), 1);
        assert!(matches!(
            &scan.errors["broken"],
            RouteError::InvalidDirectiveArity { class, method, .. }
                if class == "app::controllers::BrokenController" && method == "oopsAction"
        ));
        assert!(scan.tree.get("broken").is_none());
        assert!(scan.tree.is_skipped("broken"));
        // the other controllers are unaffected
        assert_eq!(scan.tree.len(), 2);
        assert!(scan.failures()["broken"].contains("Invalid argument count 3"));
    }

    #[test]
    fn test_rejected_controller_is_skipped() {
        let mut registry = registry();
        registry.reject("NotesController", "KDL parse error");

        let scan = scan(&registry);
        assert!(scan.tree.is_skipped("notes"));
        assert!(matches!(&scan.errors["notes"], RouteError::Rejected { .. }));
        assert_eq!(scan.tree.len(), 2);
    }

    #[test]
    fn test_rest_default_flag() {
        let registry = ControllerRegistry::new("").with(
            ControllerDef::new("NotesController")
                .directive(Directive::new("RouteDefault").with_arg("Rest"))
                .action("indexAction"),
        );
        let scan = scan(&registry);
        assert!(scan.tree.get("notes").unwrap().rest_defaults);
    }

    #[test]
    fn test_short_and_resource_names() {
        assert_eq!(
            short_name("app::controllers::UserGroupsController").as_deref(),
            Some("usergroups")
        );
        assert_eq!(short_name("IndexController").as_deref(), Some("index"));
        assert_eq!(short_name("Controller"), None);
        assert_eq!(short_name("app::Helpers"), None);

        assert_eq!(resource_name("indexAction"), Some("index"));
        assert_eq!(resource_name("Action"), None);
        assert_eq!(resource_name("helper"), None);
    }

    #[test]
    fn test_missing_directory_yields_empty_tree() {
        let scan = scan_directory(Path::new("/definitely/not/here"), "app").unwrap();
        assert!(scan.tree.is_empty());
        assert!(scan.is_clean());
    }
}
