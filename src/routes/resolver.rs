use crate::routes::errors::RouteError;
use crate::routes::types::{Directive, HttpVerb, RouteDescriptor};
use crate::routes::ACTION_SUFFIX;

/// Resolve one action method into a route.
///
/// The first `Get`/`Post`/`Put`/`Delete`/`Route` directive wins. Without one,
/// the REST naming convention applies (`indexAction`, `getAction`, ...).
/// Anything else yields an unroutable descriptor.
pub fn resolve(
    class: &str,
    method: &str,
    prefix: &str,
    directives: &[Directive],
) -> Result<RouteDescriptor, RouteError> {
    for directive in directives {
        match directive.name.as_str() {
            "Get" | "Post" | "Put" | "Delete" => {
                return resolve_verb(class, method, prefix, directive);
            }
            "Route" => {
                return resolve_route(class, method, prefix, directive);
            }
            _ => {}
        }
    }

    Ok(convention(method, prefix).unwrap_or_else(|| RouteDescriptor::unroutable(method)))
}

fn resolve_verb(
    class: &str,
    method: &str,
    prefix: &str,
    directive: &Directive,
) -> Result<RouteDescriptor, RouteError> {
    let (suffix, alias) = match directive.args.as_slice() {
        [suffix] => (suffix, None),
        [suffix, alias] => (suffix, Some(alias.clone())),
        args => return Err(arity_error(class, method, directive, args.len())),
    };
    let verb = HttpVerb::parse(&directive.name).ok_or_else(|| RouteError::UnknownVerb {
        class: class.to_string(),
        method: method.to_string(),
        verb: directive.name.clone(),
    })?;

    Ok(RouteDescriptor {
        method: method.to_string(),
        verbs: vec![verb],
        path: Some(format!("{prefix}{suffix}")),
        alias,
    })
}

fn resolve_route(
    class: &str,
    method: &str,
    prefix: &str,
    directive: &Directive,
) -> Result<RouteDescriptor, RouteError> {
    let suffix = directive
        .first_arg()
        .ok_or_else(|| arity_error(class, method, directive, 0))?;

    // an empty `methods` list means the defaults, same as leaving it out
    let mut verbs = Vec::new();
    let names = directive.named.get("methods").map(String::as_str).unwrap_or("");
    for name in names.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        let verb = HttpVerb::parse(name).ok_or_else(|| RouteError::UnknownVerb {
            class: class.to_string(),
            method: method.to_string(),
            verb: name.to_string(),
        })?;
        if !verbs.contains(&verb) {
            verbs.push(verb);
        }
    }
    if verbs.is_empty() {
        verbs = HttpVerb::ROUTE_DEFAULTS.to_vec();
    }

    Ok(RouteDescriptor {
        method: method.to_string(),
        verbs,
        path: Some(format!("{prefix}{suffix}")),
        alias: directive.named.get("name").cloned(),
    })
}

/// REST naming convention, keyed on the method name minus `Action`.
pub fn convention(method: &str, prefix: &str) -> Option<RouteDescriptor> {
    let stem = method.strip_suffix(ACTION_SUFFIX).unwrap_or(method);
    let (verb, tail) = match stem.to_lowercase().as_str() {
        "index" => (HttpVerb::Get, "/"),
        "get" => (HttpVerb::Get, "/{id}"),
        "put" => (HttpVerb::Put, "/{id}"),
        "post" => (HttpVerb::Post, "/"),
        "delete" => (HttpVerb::Delete, "/{id}"),
        _ => return None,
    };

    Some(RouteDescriptor {
        method: method.to_string(),
        verbs: vec![verb],
        path: Some(format!("{prefix}{tail}")),
        alias: None,
    })
}

fn arity_error(class: &str, method: &str, directive: &Directive, count: usize) -> RouteError {
    RouteError::InvalidDirectiveArity {
        class: class.to_string(),
        method: method.to_string(),
        directive: directive.name.clone(),
        count,
    }
}
