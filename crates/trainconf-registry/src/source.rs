//! Component sources: per-domain registries and ordered chains of them

use crate::{Component, ComponentType, Error, Params, Result};
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Anything that can answer "do you know this component name?".
///
/// Collaborators plug their own catalogues into a
/// [`ComponentResolver`](crate::ComponentResolver) through this trait.
pub trait ComponentSource: Send + Sync {
    /// Human-readable name used in logs.
    fn name(&self) -> &str;

    fn get(&self, name: &str) -> Option<ComponentType>;

    fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// Registry of components for one capability area (models, datasets, ...).
///
/// Registration takes `&self` so a registry can be shared process-wide
/// behind an `Arc` and filled in by collaborators at startup.
#[derive(Debug)]
pub struct DomainRegistry {
    domain: String,
    components: RwLock<BTreeMap<String, ComponentType>>,
}

impl DomainRegistry {
    /// Create a new empty registry.
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            components: RwLock::new(BTreeMap::new()),
        }
    }

    /// Create a registry pre-filled with `components`; later entries replace
    /// earlier ones of the same name.
    pub fn with_components(
        domain: impl Into<String>,
        components: impl IntoIterator<Item = ComponentType>,
    ) -> Self {
        let components = components
            .into_iter()
            .map(|component| (component.name().to_string(), component))
            .collect();
        Self {
            domain: domain.into(),
            components: RwLock::new(components),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Register a component type under its own name.
    ///
    /// Fails if the name is already taken in this domain.
    pub fn register(&self, component: ComponentType) -> Result<()> {
        let mut components = self
            .components
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if components.contains_key(component.name()) {
            tracing::warn!(
                domain = %self.domain,
                name = component.name(),
                "Refusing to register duplicate component"
            );
            return Err(Error::DuplicateComponent {
                domain: self.domain.clone(),
                name: component.name().to_string(),
            });
        }
        tracing::debug!(domain = %self.domain, name = component.name(), "Registered component");
        components.insert(component.name().to_string(), component);
        Ok(())
    }

    /// Register a plain constructor function.
    pub fn register_fn<F>(&self, name: &str, constructor: F) -> Result<()>
    where
        F: Fn(Params) -> Result<Arc<dyn Component>> + Send + Sync + 'static,
    {
        self.register(ComponentType::new(name, constructor))
    }

    /// List all registered names (sorted).
    pub fn list(&self) -> Vec<String> {
        self.components
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.components
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ComponentSource for DomainRegistry {
    fn name(&self) -> &str {
        &self.domain
    }

    fn get(&self, name: &str) -> Option<ComponentType> {
        self.components
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    fn contains(&self, name: &str) -> bool {
        self.components
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }
}

/// Several sources searched in order; the first one that knows a name wins.
pub struct SourceChain {
    name: String,
    sources: Vec<Arc<dyn ComponentSource>>,
}

impl SourceChain {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sources: Vec::new(),
        }
    }

    /// Append a source (builder pattern).
    pub fn with(mut self, source: Arc<dyn ComponentSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn push(&mut self, source: Arc<dyn ComponentSource>) {
        self.sources.push(source);
    }

    pub fn sources(&self) -> &[Arc<dyn ComponentSource>] {
        &self.sources
    }
}

impl ComponentSource for SourceChain {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, name: &str) -> Option<ComponentType> {
        self.sources.iter().find_map(|source| source.get(name))
    }
}
