//! Component trait and constructible component types

use crate::{Instance, Params, Result};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A live object built from a type descriptor.
///
/// Implementors only need [`as_any`](Component::as_any); the remaining hooks
/// let the core query capabilities without knowing concrete types.
pub trait Component: Any + Send + Sync + fmt::Debug {
    fn as_any(&self) -> &dyn Any;

    /// Trainable parameters owned by this component and its children.
    fn parameters(&self) -> Vec<Arc<Parameter>> {
        Vec::new()
    }

    fn as_lr_schedule(&self) -> Option<&dyn LrSchedule> {
        None
    }

    fn as_optimizer(&self) -> Option<&dyn Optimizer> {
        None
    }
}

/// Step-indexed learning rate.
pub trait LrSchedule {
    fn learning_rate_at(&self, step: usize) -> f64;
}

/// An optimizer bound to a parameter list.
pub trait Optimizer {
    fn learning_rate_at(&self, step: usize) -> f64;

    /// The shared parameter handles this optimizer updates.
    ///
    /// Every entry downcasts to [`Parameter`].
    fn parameter_list(&self) -> &[Arc<dyn Component>];
}

/// A named tensor slot owned by a layer.
///
/// Only the metadata is modelled; storage belongs to the numerical runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: String,
    shape: Vec<usize>,
    trainable: bool,
}

impl Parameter {
    pub fn new(name: impl Into<String>, shape: Vec<usize>) -> Self {
        Self {
            name: name.into(),
            shape,
            trainable: true,
        }
    }

    /// A non-trainable buffer such as batch-norm running statistics.
    pub fn frozen(name: impl Into<String>, shape: Vec<usize>) -> Self {
        Self {
            trainable: false,
            ..Self::new(name, shape)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn trainable(&self) -> bool {
        self.trainable
    }

    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }
}

impl Component for Parameter {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

type ConstructorFn = dyn Fn(Params) -> Result<Arc<dyn Component>> + Send + Sync;

/// A registered, constructible component type.
///
/// This is what a `type:` name resolves to. Callers that need variants of a
/// dataset can hold on to it and call [`construct`](Self::construct)
/// themselves.
#[derive(Clone)]
pub struct ComponentType {
    name: String,
    constructor: Arc<ConstructorFn>,
}

impl ComponentType {
    pub fn new<F>(name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(Params) -> Result<Arc<dyn Component>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            constructor: Arc::new(constructor),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Build an instance from already-instantiated keyword parameters.
    pub fn construct(&self, values: BTreeMap<String, Instance>) -> Result<Arc<dyn Component>> {
        (self.constructor)(Params::new(self.name.clone(), values))
    }

    /// True if both handles share the same registered constructor.
    pub fn same_type(&self, other: &ComponentType) -> bool {
        Arc::ptr_eq(&self.constructor, &other.constructor)
    }
}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentType")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
