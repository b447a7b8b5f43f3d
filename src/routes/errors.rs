use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum RouteError {
    #[error("Invalid argument count {count} for {class}::{method}() / @{directive}")]
    #[diagnostic(
        code(routekeeper::routes::invalid_arity),
        help("Verb directives take a path and an optional alias, e.g. Get \"/search\" \"users.search\"; Route needs at least a path")
    )]
    InvalidDirectiveArity {
        class: String,
        method: String,
        directive: String,
        count: usize,
    },

    #[error("Unknown HTTP verb `{verb}` in {class}::{method}()")]
    #[diagnostic(
        code(routekeeper::routes::unknown_verb),
        help("Supported verbs: GET, POST, PUT, DELETE, PATCH, HEAD, OPTIONS")
    )]
    UnknownVerb {
        class: String,
        method: String,
        verb: String,
    },

    #[error("Failed to load controller manifest `{path}`")]
    #[diagnostic(
        code(routekeeper::routes::manifest_load),
        help("Check that the file exists and is readable")
    )]
    ManifestLoad {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid controller manifest `{path}`: {reason}")]
    #[diagnostic(
        code(routekeeper::routes::invalid_manifest),
        help("A manifest holds class directives and `method \"<name>Action\" {{ ... }}` nodes")
    )]
    InvalidManifest { path: String, reason: String },

    #[error("KDL parse error in `{path}`: {reason}")]
    #[diagnostic(
        code(routekeeper::routes::kdl_parse),
        help("Check your KDL file syntax, see https://kdl.dev for the specification")
    )]
    KdlParse { path: String, reason: String },

    #[error("Controller {class} was not loaded: {reason}")]
    #[diagnostic(
        code(routekeeper::routes::rejected),
        help("Fix the controller manifest; its persisted routes stay as they are until it loads")
    )]
    Rejected { class: String, reason: String },

    #[error("I/O error: {0}")]
    #[diagnostic(code(routekeeper::routes::io))]
    Io(#[from] std::io::Error),
}
