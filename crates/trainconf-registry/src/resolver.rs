//! Resolution of `type` names to component types
//!
//! Lookup order, first match wins:
//!
//! 1. Names starting with a registered family prefix (`$seg:DeepLabV3`) are
//!    looked up in that family only, with the prefix stripped.
//! 2. Local domain registries, in the order they were added.
//! 3. Built-in namespaces (learning-rate schedules, optimizers, layers).

use crate::{ComponentSource, ComponentType, Error, Result, builtins, manager};
use std::fmt;
use std::sync::Arc;

/// Separator between a family prefix and the component name.
pub const FAMILY_SEPARATOR: char = ':';

/// An external component family addressed through a name prefix.
#[derive(Clone)]
pub struct ExternalFamily {
    prefix: String,
    source: Arc<dyn ComponentSource>,
}

impl ExternalFamily {
    /// `prefix` is matched case-insensitively and must be followed by
    /// [`FAMILY_SEPARATOR`], e.g. prefix `$seg` matches `$SEG:Unet`.
    pub fn new(prefix: impl Into<String>, source: Arc<dyn ComponentSource>) -> Self {
        Self {
            prefix: prefix.into(),
            source,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The component name with this family's prefix removed, if it carries it.
    fn strip<'a>(&self, name: &'a str) -> Option<&'a str> {
        let head = name.get(..self.prefix.len())?;
        if !head.eq_ignore_ascii_case(&self.prefix) {
            return None;
        }
        name[self.prefix.len()..].strip_prefix(FAMILY_SEPARATOR)
    }
}

impl fmt::Debug for ExternalFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalFamily")
            .field("prefix", &self.prefix)
            .field("source", &self.source.name())
            .finish()
    }
}

/// Resolves component names across families, local domains and built-ins.
#[derive(Clone, Default)]
pub struct ComponentResolver {
    families: Vec<ExternalFamily>,
    domains: Vec<Arc<dyn ComponentSource>>,
    builtins: Vec<Arc<dyn ComponentSource>>,
}

impl ComponentResolver {
    /// Create an empty resolver that knows no components.
    pub fn new() -> Self {
        Self::default()
    }

    /// A resolver over the process-wide [`manager`] registries and families,
    /// followed by the built-in namespaces.
    ///
    /// The registries are shared, so components registered later are still
    /// found. Families registered later are not.
    pub fn from_manager() -> Self {
        let mut resolver = Self::new().with_builtins();
        for domain in manager::domains() {
            resolver = resolver.with_domain(domain);
        }
        for family in manager::families() {
            resolver.families.push(family);
        }
        resolver
    }

    /// Add an external family (builder pattern).
    pub fn with_family(mut self, prefix: impl Into<String>, source: Arc<dyn ComponentSource>) -> Self {
        self.families.push(ExternalFamily::new(prefix, source));
        self
    }

    /// Add a local domain registry, searched after those added before it.
    pub fn with_domain(mut self, source: Arc<dyn ComponentSource>) -> Self {
        self.domains.push(source);
        self
    }

    /// Add the built-in namespaces: lr schedules, optimizers, layers.
    pub fn with_builtins(mut self) -> Self {
        self.builtins = vec![
            Arc::new(builtins::lr_schedules()),
            Arc::new(builtins::optimizers()),
            Arc::new(builtins::layers()),
        ];
        self
    }

    /// Resolve `name` to a constructible component type.
    pub fn resolve(&self, name: &str) -> Result<ComponentType> {
        for family in &self.families {
            if let Some(stripped) = family.strip(name) {
                return match family.source.get(stripped) {
                    Some(component) => {
                        tracing::debug!(name, family = family.prefix(), "Resolved family component");
                        Ok(component)
                    }
                    None => Err(Error::FamilyComponentNotFound {
                        name: stripped.to_string(),
                        family: family.prefix.clone(),
                    }),
                };
            }
        }

        for source in self.domains.iter().chain(&self.builtins) {
            if let Some(component) = source.get(name) {
                tracing::debug!(name, source = source.name(), "Resolved component");
                return Ok(component);
            }
        }

        Err(Error::ComponentNotFound {
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_ok()
    }
}

impl fmt::Debug for ComponentResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = |sources: &[Arc<dyn ComponentSource>]| -> Vec<String> {
            sources.iter().map(|s| s.name().to_string()).collect()
        };
        f.debug_struct("ComponentResolver")
            .field("families", &self.families)
            .field("domains", &names(&self.domains))
            .field("builtins", &names(&self.builtins))
            .finish()
    }
}
