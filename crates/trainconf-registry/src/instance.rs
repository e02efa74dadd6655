//! Instantiated values

use crate::{Component, Parameter};
use std::collections::BTreeMap;
use std::sync::Arc;
use trainconf_tree::ConfigValue;

/// The result of instantiating a configuration value.
///
/// Mirrors [`ConfigValue`] with one extra variant for constructed objects.
/// Objects are shared: cloning an `Instance` never rebuilds a component.
#[derive(Debug, Clone, Default)]
pub enum Instance {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<Instance>),
    Map(BTreeMap<String, Instance>),
    Object(Arc<dyn Component>),
}

impl Instance {
    pub fn type_name(&self) -> &'static str {
        match self {
            Instance::Null => "null",
            Instance::Bool(_) => "bool",
            Instance::Integer(_) => "integer",
            Instance::Float(_) => "float",
            Instance::String(_) => "string",
            Instance::List(_) => "list",
            Instance::Map(_) => "map",
            Instance::Object(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Instance::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Instance::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Instance::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Instance::Float(f) => Some(*f),
            Instance::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Instance::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Instance]> {
        match self {
            Instance::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Instance>> {
        match self {
            Instance::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Arc<dyn Component>> {
        match self {
            Instance::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Borrow the constructed object as a concrete type.
    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        self.as_object()?.as_any().downcast_ref::<T>()
    }

    /// Reference equality for objects; always false for plain values.
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        match (self, other) {
            (Instance::Object(a), Instance::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Wrap a parameter list as a list of objects.
    pub fn from_parameters(parameters: Vec<Arc<Parameter>>) -> Self {
        Instance::List(
            parameters
                .into_iter()
                .map(|p| Instance::Object(p as Arc<dyn Component>))
                .collect(),
        )
    }
}

/// Plain values compare structurally, objects by identity.
impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Instance::Null, Instance::Null) => true,
            (Instance::Bool(a), Instance::Bool(b)) => a == b,
            (Instance::Integer(a), Instance::Integer(b)) => a == b,
            (Instance::Float(a), Instance::Float(b)) => a == b,
            (Instance::String(a), Instance::String(b)) => a == b,
            (Instance::List(a), Instance::List(b)) => a == b,
            (Instance::Map(a), Instance::Map(b)) => a == b,
            (Instance::Object(_), Instance::Object(_)) => self.ptr_eq(other),
            _ => false,
        }
    }
}

/// Raw conversion without constructing anything; `type` keys stay as data.
impl From<&ConfigValue> for Instance {
    fn from(value: &ConfigValue) -> Self {
        match value {
            ConfigValue::Null => Instance::Null,
            ConfigValue::Bool(b) => Instance::Bool(*b),
            ConfigValue::Integer(i) => Instance::Integer(*i),
            ConfigValue::Float(f) => Instance::Float(*f),
            ConfigValue::String(s) => Instance::String(s.clone()),
            ConfigValue::Sequence(items) => Instance::List(items.iter().map(Instance::from).collect()),
            ConfigValue::Mapping(map) => Instance::Map(
                map.iter()
                    .map(|(key, value)| (key.clone(), Instance::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<Arc<dyn Component>> for Instance {
    fn from(value: Arc<dyn Component>) -> Self {
        Instance::Object(value)
    }
}

impl From<bool> for Instance {
    fn from(value: bool) -> Self {
        Instance::Bool(value)
    }
}

impl From<i64> for Instance {
    fn from(value: i64) -> Self {
        Instance::Integer(value)
    }
}

impl From<f64> for Instance {
    fn from(value: f64) -> Self {
        Instance::Float(value)
    }
}

impl From<&str> for Instance {
    fn from(value: &str) -> Self {
        Instance::String(value.to_string())
    }
}

impl From<String> for Instance {
    fn from(value: String) -> Self {
        Instance::String(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trainconf_tree::ConfigMap;

    #[test]
    fn test_raw_conversion_keeps_type_keys_as_data() {
        let mut raw = ConfigMap::new();
        raw.insert("type".into(), "Constant".into());
        raw.insert("learning_rate".into(), ConfigValue::Float(0.01));

        let instance = Instance::from(&ConfigValue::Mapping(raw));
        let map = instance.as_map().unwrap();
        assert_eq!(map["type"], Instance::from("Constant"));
        assert_eq!(map["learning_rate"], Instance::Float(0.01));
    }

    #[test]
    fn test_objects_compare_by_identity() {
        let a: Arc<dyn Component> = Arc::new(Parameter::new("w", vec![2]));
        let b: Arc<dyn Component> = Arc::new(Parameter::new("w", vec![2]));

        assert_eq!(Instance::Object(a.clone()), Instance::Object(a.clone()));
        assert_ne!(Instance::Object(a), Instance::Object(b));
    }

    #[test]
    fn test_downcast_to_concrete_type() {
        let instance = Instance::from_parameters(vec![Arc::new(Parameter::new("bias", vec![8]))]);
        let first = &instance.as_list().unwrap()[0];
        assert_eq!(first.downcast_ref::<Parameter>().unwrap().shape(), &[8]);
    }
}
