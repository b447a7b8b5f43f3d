//! Controller manifests: one `<Name>Controller.kdl` file per controller.
//!
//! ```kdl
//! RoutePrefix "/users"
//! Description "User management"
//! RouteDefault "Rest"
//!
//! method "indexAction"
//! method "searchAction" {
//!     Get "/search" "users.search"
//! }
//! method "bulkAction" {
//!     Route "/bulk" methods="POST,PUT" name="users.bulk"
//! }
//! ```
//!
//! Top-level nodes other than `method` are class directives. Positional
//! arguments become directive arguments and properties become named ones.

use std::path::Path;

use kdl::{KdlDocument, KdlNode, KdlValue};

use crate::routes::errors::RouteError;
use crate::routes::registry::{ControllerDef, ControllerRegistry};
use crate::routes::types::Directive;
use crate::routes::CONTROLLER_SUFFIX;

const MANIFEST_EXTENSION: &str = "kdl";

/// Load every `*Controller.kdl` file in `dir` into a registry.
///
/// A missing directory is not an error; it yields an empty registry. A file
/// that cannot be read or parsed is recorded as rejected and the rest of the
/// directory still loads.
pub fn load_manifests(dir: &Path, namespace: &str) -> Result<ControllerRegistry, RouteError> {
    let mut registry = ControllerRegistry::new(namespace);

    if !dir.is_dir() {
        tracing::warn!(
            dir = %dir.display(),
            "controller directory not found, no routes discovered"
        );
        return Ok(registry);
    }

    let mut entries: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.extension().map(|ext| ext == MANIFEST_EXTENSION).unwrap_or(false)
                && p.file_stem()
                    .and_then(|s| s.to_str())
                    .map(|s| s.ends_with(CONTROLLER_SUFFIX))
                    .unwrap_or(false)
        })
        .collect();
    entries.sort();

    for path in entries {
        let Some(class_name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        match load_manifest(class_name, &path) {
            Ok(def) => {
                registry.register(def);
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "controller manifest rejected");
                registry.reject(class_name, e);
            }
        }
    }

    tracing::info!(
        dir = %dir.display(),
        controllers = registry.len(),
        rejected = registry.rejected().count(),
        "Loaded controller manifests"
    );

    Ok(registry)
}

fn load_manifest(class_name: &str, path: &Path) -> Result<ControllerDef, RouteError> {
    let source = std::fs::read_to_string(path).map_err(|source| RouteError::ManifestLoad {
        path: path.display().to_string(),
        source,
    })?;
    parse_manifest(class_name, &source, &path.display().to_string())
}

/// Parse one manifest into a controller definition named `class_name`.
pub fn parse_manifest(
    class_name: &str,
    source: &str,
    path: &str,
) -> Result<ControllerDef, RouteError> {
    let doc: KdlDocument = source.parse().map_err(|e: kdl::KdlError| RouteError::KdlParse {
        path: path.to_string(),
        reason: e.to_string(),
    })?;

    let mut def = ControllerDef::new(class_name);

    for node in doc.nodes() {
        if node.name().value() == "method" {
            let name = first_string_arg(node).ok_or_else(|| RouteError::InvalidManifest {
                path: path.to_string(),
                reason: "method node requires a name (e.g. method \"indexAction\")".into(),
            })?;
            let mut directives = Vec::new();
            if let Some(children) = node.children() {
                for child in children.nodes() {
                    directives.push(to_directive(child, path)?);
                }
            }
            def = def.method(name, directives);
        } else {
            def = def.directive(to_directive(node, path)?);
        }
    }

    Ok(def)
}

fn to_directive(node: &KdlNode, path: &str) -> Result<Directive, RouteError> {
    let name = node.name().value();
    if node.children().is_some() {
        return Err(RouteError::InvalidManifest {
            path: path.to_string(),
            reason: format!("directive `{name}` cannot have children"),
        });
    }

    let mut directive = Directive::new(name);
    for entry in node.entries() {
        let value = value_to_string(entry.value());
        match entry.name() {
            Some(key) => directive = directive.with_named(key.value(), value),
            None => directive = directive.with_arg(value),
        }
    }
    Ok(directive)
}

/// Extract the first string argument from a KDL node.
fn first_string_arg(node: &KdlNode) -> Option<String> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}

fn value_to_string(value: &KdlValue) -> String {
    if let Some(s) = value.as_string() {
        s.to_string()
    } else if let Some(i) = value.as_integer() {
        i.to_string()
    } else if let Some(f) = value.as_float() {
        f.to_string()
    } else if let Some(b) = value.as_bool() {
        b.to_string()
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::registry::MetadataReader;
    use std::fs;
    use tempfile::TempDir;

    const USERS: &str = r#"
RoutePrefix "/users"
Description "User management"

method "indexAction"
method "searchAction" {
    Get "/search" "users.search"
}
method "bulkAction" {
    Route "/bulk" methods="POST,PUT" name="users.bulk"
}
"#;

    #[test]
    fn test_parse_manifest() {
        let def = parse_manifest("UsersController", USERS, "UsersController.kdl").unwrap();
        assert_eq!(def.name, "UsersController");
        assert_eq!(def.directives.len(), 2);
        assert_eq!(def.directives[0].name, "RoutePrefix");
        assert_eq!(def.directives[0].args, vec!["/users"]);
        assert_eq!(def.directives[1].first_arg(), Some("User management"));

        let names: Vec<_> = def.methods.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["indexAction", "searchAction", "bulkAction"]);

        let (_, search) = &def.methods[1];
        assert_eq!(search[0].name, "Get");
        assert_eq!(search[0].args, vec!["/search", "users.search"]);

        let (_, bulk) = &def.methods[2];
        assert_eq!(bulk[0].args, vec!["/bulk"]);
        assert_eq!(bulk[0].named.get("methods").map(String::as_str), Some("POST,PUT"));
        assert_eq!(bulk[0].named.get("name").map(String::as_str), Some("users.bulk"));
    }

    #[test]
    fn test_non_string_arguments_are_stringified() {
        let def = parse_manifest("PagesController", "Cache 300\n", "PagesController.kdl").unwrap();
        assert_eq!(def.directives[0].args, vec!["300"]);
    }

    #[test]
    fn test_method_without_name() {
        let err = parse_manifest("XController", "method\n", "XController.kdl").unwrap_err();
        assert!(matches!(err, RouteError::InvalidManifest { .. }));
    }

    #[test]
    fn test_nested_directive_rejected() {
        let src = r#"
method "indexAction" {
    Get "/" {
        nested
    }
}
"#;
        let err = parse_manifest("XController", src, "XController.kdl").unwrap_err();
        assert!(matches!(err, RouteError::InvalidManifest { .. }));
    }

    #[test]
    fn test_kdl_syntax_error() {
        let err = parse_manifest("XController", "method \"unterminated\n", "XController.kdl")
            .unwrap_err();
        assert!(matches!(err, RouteError::KdlParse { .. }));
    }

    #[test]
    fn test_load_manifests_filters_files() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        fs::write(dir.path().join("UsersController.kdl"), USERS).unwrap();
        fs::write(dir.path().join("AuthController.kdl"), "method \"loginAction\"\n").unwrap();
        fs::write(dir.path().join("helpers.kdl"), "method \"x\"\n").unwrap();
        fs::write(dir.path().join("NotesController.txt"), "junk").unwrap();

        let registry = load_manifests(dir.path(), "app::controllers").unwrap();
        assert_eq!(
            registry.classes().collect::<Vec<_>>(),
            vec![
                "app::controllers::AuthController",
                "app::controllers::UsersController"
            ]
        );
        assert_eq!(
            registry.class_methods("app::controllers::AuthController"),
            vec!["loginAction"]
        );
    }

    #[test]
    fn test_unparseable_manifest_is_rejected() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        fs::write(dir.path().join("UsersController.kdl"), USERS).unwrap();
        fs::write(dir.path().join("BrokenController.kdl"), "method \"unterminated\n").unwrap();

        let registry = load_manifests(dir.path(), "app").unwrap();
        assert_eq!(registry.classes().collect::<Vec<_>>(), vec!["app::UsersController"]);

        let rejected: Vec<_> = registry.rejected().collect();
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].0, "app::BrokenController");
        assert!(rejected[0].1.contains("KDL parse error"));
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let registry = load_manifests(&dir.path().join("nope"), "app").unwrap();
        assert!(registry.is_empty());
    }
}
