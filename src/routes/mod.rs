pub mod errors;
pub mod manifest;
pub mod mount;
pub mod registry;
pub mod resolver;
pub mod scanner;
pub mod types;

pub use errors::RouteError;
pub use registry::{ControllerDef, ControllerRegistry, MetadataReader};
pub use scanner::{scan, scan_directory, Scan};
pub use types::{ControllerRoutes, Directive, HttpVerb, RouteDescriptor, RouteTree};

/// Suffix that marks a method as a routable action.
pub const ACTION_SUFFIX: &str = "Action";

/// Suffix every controller class name carries.
pub const CONTROLLER_SUFFIX: &str = "Controller";
