use std::collections::BTreeMap;

use crate::routes::types::Directive;

/// Read access to the directives attached to controllers and their methods.
pub trait MetadataReader {
    /// Class-level directives, in declaration order.
    fn class_directives(&self, class: &str) -> Vec<Directive>;
    /// Method name -> directives, for every method that carries any.
    fn method_directives(&self, class: &str) -> BTreeMap<String, Vec<Directive>>;
    /// All method names of the class, in declaration order.
    fn class_methods(&self, class: &str) -> Vec<String>;
}

/// Statically registered description of one controller class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerDef {
    /// Class name without namespace, e.g. `UsersController`
    pub name: String,
    pub directives: Vec<Directive>,
    pub methods: Vec<(String, Vec<Directive>)>,
}

impl ControllerDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn directive(mut self, directive: Directive) -> Self {
        self.directives.push(directive);
        self
    }

    pub fn method(mut self, name: impl Into<String>, directives: Vec<Directive>) -> Self {
        self.methods.push((name.into(), directives));
        self
    }

    /// A method without directives; it routes by naming convention, if at all.
    pub fn action(self, name: impl Into<String>) -> Self {
        self.method(name, Vec::new())
    }
}

/// Explicit registry of controllers, keyed by fully-qualified class name.
///
/// Controllers whose definition could not be loaded are kept by name in
/// `rejected` so a scan can leave their persisted routes alone.
#[derive(Debug, Clone, Default)]
pub struct ControllerRegistry {
    namespace: String,
    controllers: BTreeMap<String, ControllerDef>,
    rejected: BTreeMap<String, String>,
}

impl ControllerRegistry {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    /// Register a controller; a later registration of the same class wins.
    pub fn register(&mut self, def: ControllerDef) -> &mut Self {
        let class = self.qualify(&def.name);
        if self.controllers.insert(class.clone(), def).is_some() {
            tracing::warn!(%class, "controller registered twice, keeping the last definition");
        }
        self
    }

    pub fn with(mut self, def: ControllerDef) -> Self {
        self.register(def);
        self
    }

    /// Record a controller that exists but could not be loaded.
    pub fn reject(&mut self, name: &str, reason: impl ToString) -> &mut Self {
        let class = self.qualify(name);
        self.controllers.remove(&class);
        self.rejected.insert(class, reason.to_string());
        self
    }

    /// Rejected class names with the reason, sorted by class.
    pub fn rejected(&self) -> impl Iterator<Item = (&str, &str)> {
        self.rejected
            .iter()
            .map(|(class, reason)| (class.as_str(), reason.as_str()))
    }

    pub fn qualify(&self, name: &str) -> String {
        if self.namespace.is_empty() {
            name.to_string()
        } else {
            format!("{}::{}", self.namespace, name)
        }
    }

    /// Fully-qualified class names, sorted.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.controllers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}

impl MetadataReader for ControllerRegistry {
    fn class_directives(&self, class: &str) -> Vec<Directive> {
        self.controllers
            .get(class)
            .map(|def| def.directives.clone())
            .unwrap_or_default()
    }

    fn method_directives(&self, class: &str) -> BTreeMap<String, Vec<Directive>> {
        let Some(def) = self.controllers.get(class) else {
            return BTreeMap::new();
        };
        def.methods
            .iter()
            .filter(|(_, directives)| !directives.is_empty())
            .map(|(name, directives)| (name.clone(), directives.clone()))
            .collect()
    }

    fn class_methods(&self, class: &str) -> Vec<String> {
        self.controllers
            .get(class)
            .map(|def| def.methods.iter().map(|(name, _)| name.clone()).collect())
            .unwrap_or_default()
    }
}
