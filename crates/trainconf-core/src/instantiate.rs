//! Recursive construction of objects from type descriptors

use crate::{Error, Result};
use std::collections::BTreeMap;
use trainconf_registry::{ComponentResolver, ComponentType, Instance};
use trainconf_tree::{ConfigMap, ConfigValue, keys};

/// Builds live objects from configuration values.
///
/// A mapping with a `type` key is a type descriptor: the name is resolved
/// and the remaining keys become keyword parameters. Mappings without one
/// stay plain maps. `_base_` and `_inherited_` are never passed on.
#[derive(Debug, Clone, Copy)]
pub struct Instantiator<'a> {
    resolver: &'a ComponentResolver,
}

impl<'a> Instantiator<'a> {
    pub fn new(resolver: &'a ComponentResolver) -> Self {
        Self { resolver }
    }

    /// Instantiate `value` and everything nested in it.
    pub fn instantiate(&self, value: &ConfigValue) -> Result<Instance> {
        self.instantiate_with(value, true)
    }

    /// With `recursive` false a descriptor receives its parameters as raw
    /// values. Sequence elements are always instantiated.
    pub fn instantiate_with(&self, value: &ConfigValue, recursive: bool) -> Result<Instance> {
        match value {
            ConfigValue::Mapping(map) => self.instantiate_mapping(map, recursive, BTreeMap::new()),
            ConfigValue::Sequence(items) => items
                .iter()
                .map(|item| self.instantiate(item))
                .collect::<Result<Vec<_>>>()
                .map(Instance::List),
            scalar => Ok(Instance::from(scalar)),
        }
    }

    pub fn instantiate_map(&self, map: &ConfigMap) -> Result<Instance> {
        self.instantiate_mapping(map, true, BTreeMap::new())
    }

    /// Instantiate a descriptor with extra, already-built parameters.
    ///
    /// Injected entries replace same-named keys from `map`.
    pub fn instantiate_injected(
        &self,
        map: &ConfigMap,
        injected: BTreeMap<String, Instance>,
    ) -> Result<Instance> {
        self.instantiate_mapping(map, true, injected)
    }

    /// Resolve the `type` named by a descriptor, if it has one.
    pub fn component_type(&self, map: &ConfigMap) -> Result<Option<ComponentType>> {
        match map.get(keys::TYPE) {
            None => Ok(None),
            Some(ConfigValue::String(name)) => Ok(Some(self.resolver.resolve(name)?)),
            Some(other) => Err(Error::InvalidTypeName {
                found: other.type_name(),
            }),
        }
    }

    fn instantiate_mapping(
        &self,
        map: &ConfigMap,
        recursive: bool,
        injected: BTreeMap<String, Instance>,
    ) -> Result<Instance> {
        let component = self.component_type(map)?;

        let mut params = BTreeMap::new();
        for (key, value) in map {
            if key == keys::TYPE || keys::is_bookkeeping(key) {
                continue;
            }
            let value = if recursive {
                self.instantiate(value)?
            } else {
                Instance::from(value)
            };
            params.insert(key.clone(), value);
        }
        params.extend(injected);

        match component {
            Some(component) => {
                tracing::debug!(component = component.name(), "Instantiating component");
                Ok(Instance::Object(component.construct(params)?))
            }
            None => Ok(Instance::Map(params)),
        }
    }
}
