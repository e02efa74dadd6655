//! Keyword parameters handed to component constructors

use crate::{Component, Error, Instance, Parameter, Result};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Keyword arguments for one constructor call.
///
/// Accessors remove the value they read, so [`finish`](Params::finish) can
/// reject anything the constructor did not consume. A `null` value counts as
/// absent for the `*_or` accessors.
#[derive(Debug, Clone)]
pub struct Params {
    component: String,
    values: BTreeMap<String, Instance>,
}

impl Params {
    pub fn new(component: impl Into<String>, values: BTreeMap<String, Instance>) -> Self {
        Self {
            component: component.into(),
            values,
        }
    }

    /// Name of the component being constructed.
    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn take(&mut self, key: &str) -> Option<Instance> {
        self.values.remove(key)
    }

    /// Like [`take`](Self::take) but treats `null` as absent.
    pub fn take_present(&mut self, key: &str) -> Option<Instance> {
        self.take(key).filter(|value| !value.is_null())
    }

    pub fn require(&mut self, key: &str) -> Result<Instance> {
        self.take_present(key).ok_or_else(|| Error::MissingParameter {
            component: self.component.clone(),
            parameter: key.to_string(),
        })
    }

    pub fn invalid(&self, key: &str, message: impl Into<String>) -> Error {
        Error::InvalidParameter {
            component: self.component.clone(),
            parameter: key.to_string(),
            message: message.into(),
        }
    }

    fn expect_f64(&self, key: &str, value: &Instance) -> Result<f64> {
        value
            .as_f64()
            .ok_or_else(|| self.invalid(key, format!("expected a number, found {}", value.type_name())))
    }

    fn expect_usize(&self, key: &str, value: &Instance) -> Result<usize> {
        value
            .as_i64()
            .and_then(|i| usize::try_from(i).ok())
            .ok_or_else(|| {
                self.invalid(
                    key,
                    format!("expected a non-negative integer, found {}", value.type_name()),
                )
            })
    }

    pub fn f64(&mut self, key: &str) -> Result<f64> {
        let value = self.require(key)?;
        self.expect_f64(key, &value)
    }

    pub fn f64_or(&mut self, key: &str, default: f64) -> Result<f64> {
        match self.take_present(key) {
            Some(value) => self.expect_f64(key, &value),
            None => Ok(default),
        }
    }

    pub fn usize(&mut self, key: &str) -> Result<usize> {
        let value = self.require(key)?;
        self.expect_usize(key, &value)
    }

    pub fn usize_or(&mut self, key: &str, default: usize) -> Result<usize> {
        match self.take_present(key) {
            Some(value) => self.expect_usize(key, &value),
            None => Ok(default),
        }
    }

    pub fn bool_or(&mut self, key: &str, default: bool) -> Result<bool> {
        match self.take_present(key) {
            Some(value) => value
                .as_bool()
                .ok_or_else(|| self.invalid(key, format!("expected a bool, found {}", value.type_name()))),
            None => Ok(default),
        }
    }

    pub fn string_or(&mut self, key: &str, default: &str) -> Result<String> {
        match self.take_present(key) {
            Some(Instance::String(s)) => Ok(s),
            Some(other) => Err(self.invalid(key, format!("expected a string, found {}", other.type_name()))),
            None => Ok(default.to_string()),
        }
    }

    /// A single integer or a list of integers (`kernel_size: 3` or `[3, 1]`).
    pub fn usize_list(&mut self, key: &str) -> Result<Vec<usize>> {
        match self.require(key)? {
            Instance::List(items) => items
                .iter()
                .map(|item| self.expect_usize(key, item))
                .collect(),
            single => Ok(vec![self.expect_usize(key, &single)?]),
        }
    }

    pub fn usize_list_or(&mut self, key: &str, default: &[usize]) -> Result<Vec<usize>> {
        match self.take_present(key) {
            Some(Instance::List(items)) => items
                .iter()
                .map(|item| self.expect_usize(key, item))
                .collect(),
            Some(single) => Ok(vec![self.expect_usize(key, &single)?]),
            None => Ok(default.to_vec()),
        }
    }

    pub fn f64_list(&mut self, key: &str) -> Result<Vec<f64>> {
        match self.require(key)? {
            Instance::List(items) => items.iter().map(|item| self.expect_f64(key, item)).collect(),
            other => Err(self.invalid(key, format!("expected a list, found {}", other.type_name()))),
        }
    }

    pub fn object(&mut self, key: &str) -> Result<Arc<dyn Component>> {
        match self.require(key)? {
            Instance::Object(object) => Ok(object),
            other => Err(self.invalid(
                key,
                format!("expected a component, found {}", other.type_name()),
            )),
        }
    }

    pub fn objects_or_empty(&mut self, key: &str) -> Result<Vec<Arc<dyn Component>>> {
        match self.take_present(key) {
            Some(Instance::List(items)) => items
                .into_iter()
                .map(|item| match item {
                    Instance::Object(object) => Ok(object),
                    other => Err(self.invalid(
                        key,
                        format!("expected a list of components, found {}", other.type_name()),
                    )),
                })
                .collect(),
            Some(other) => Err(self.invalid(key, format!("expected a list, found {}", other.type_name()))),
            None => Ok(Vec::new()),
        }
    }

    /// The `parameters` list an optimizer receives; absent means none.
    ///
    /// Every entry must be a [`Parameter`]; the shared handles are returned
    /// as is so the optimizer and the model point at the same slots.
    pub fn parameter_list(&mut self, key: &str) -> Result<Vec<Arc<dyn Component>>> {
        let objects = self.objects_or_empty(key)?;
        if objects
            .iter()
            .any(|object| object.as_any().downcast_ref::<Parameter>().is_none())
        {
            return Err(self.invalid(key, "expected a list of parameters"));
        }
        Ok(objects)
    }

    /// Hand over every remaining value, for components taking free-form keywords.
    pub fn into_values(self) -> BTreeMap<String, Instance> {
        self.values
    }

    /// Fail on the first parameter nobody consumed.
    pub fn finish(self) -> Result<()> {
        match self.values.into_keys().next() {
            Some(parameter) => Err(Error::UnexpectedParameter {
                component: self.component,
                parameter,
            }),
            None => Ok(()),
        }
    }
}
