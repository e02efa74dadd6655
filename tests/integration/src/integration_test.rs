//! End-to-end tests for the full flow
//!
//! documents on disk -> inheritance merge -> property resolution -> objects

use pretty_assertions::assert_eq;
use std::any::Any;
use std::sync::Arc;
use trainconf_core::{Config, Error};
use trainconf_registry::builtins::lr::Constant;
use trainconf_registry::builtins::optimizer::Sgd;
use trainconf_registry::{
    Component, ComponentResolver, DomainRegistry, Instance, Params, Parameter, Result,
};
use trainconf_test_utils::TestDocs;
use trainconf_tree::{ConfigValue, keypath};

/// Minimal model: remembers its depth and owns two parameters.
#[derive(Debug)]
struct Foo {
    depth: usize,
    slots: Vec<Arc<Parameter>>,
}

impl Foo {
    fn build(mut params: Params) -> Result<Arc<dyn Component>> {
        let depth = params.usize_or("depth", 18)?;
        params.finish()?;
        Ok(Arc::new(Self {
            depth,
            slots: vec![
                Arc::new(Parameter::new("weight", vec![depth, 4])),
                Arc::new(Parameter::new("bias", vec![4])),
            ],
        }))
    }
}

impl Component for Foo {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn parameters(&self) -> Vec<Arc<Parameter>> {
        self.slots.clone()
    }
}

fn resolver() -> ComponentResolver {
    let models = Arc::new(DomainRegistry::new("models"));
    models.register_fn("Foo", Foo::build).unwrap();
    ComponentResolver::new().with_domain(models).with_builtins()
}

fn load(path: std::path::PathBuf) -> Config {
    Config::builder(path).resolver(resolver()).build().unwrap()
}

#[test]
fn test_sgd_with_constant_schedule() {
    let docs = TestDocs::new();
    let path = docs.write(
        "train.yml",
        "\
lr_scheduler:
  type: Constant
  learning_rate: 0.01
optimizer:
  type: SGD
  momentum: 0.9
model:
  type: Foo
batch_size: 4
",
    );
    let config = load(path);

    assert_eq!(config.batch_size().unwrap(), 4);

    let model = config.model().unwrap();
    assert!(model.downcast_ref::<Foo>().is_some());
    assert!(model.ptr_eq(config.model().unwrap()));

    let optimizer = config.optimizer().unwrap();
    let sgd = optimizer.downcast_ref::<Sgd>().unwrap();
    assert_eq!(sgd.momentum(), 0.9);

    let schedule = sgd.core().learning_rate().schedule().unwrap();
    assert!(schedule.as_any().downcast_ref::<Constant>().is_some());
    assert_eq!(schedule.as_lr_schedule().unwrap().learning_rate_at(0), 0.01);

    let model_params = model.as_object().unwrap().parameters();
    let held = optimizer.as_object().unwrap().as_optimizer().unwrap().parameter_list();
    assert_eq!(held.len(), model_params.len());
    for (held, owned) in held.iter().zip(&model_params) {
        assert!(std::ptr::addr_eq(Arc::as_ptr(held), Arc::as_ptr(owned)));
    }
}

#[test]
fn test_child_overrides_only_depth() {
    let docs = TestDocs::new();
    docs.write("base.yaml", "model:\n  type: Foo\n  depth: 50\n");
    let child = docs.write("child.yaml", "_base_: base.yaml\nmodel:\n  depth: 101\n");
    let config = load(child);

    let model = config.tree()["model"].as_mapping().unwrap();
    assert_eq!(model["type"], ConfigValue::from("Foo"));
    assert_eq!(model["depth"], ConfigValue::Integer(101));
    assert_eq!(model.len(), 2);

    assert_eq!(config.model().unwrap().downcast_ref::<Foo>().unwrap().depth, 101);
}

#[test]
fn test_optimizer_before_model_builds_model_once() {
    let docs = TestDocs::new();
    let path = docs.write(
        "train.yml",
        "lr_scheduler:\n  type: Constant\n  learning_rate: 0.1\nmodel:\n  type: Foo\n",
    );
    let config = load(path);

    let first = config.optimizer().unwrap();
    let second = config.optimizer().unwrap();
    assert!(!first.ptr_eq(&second));

    let model_param = config.model().unwrap().as_object().unwrap().parameters()[0].clone();
    for optimizer in [first, second] {
        let held = &optimizer.as_map().unwrap()["parameters"].as_list().unwrap()[0];
        let held = held.as_object().unwrap();
        assert!(std::ptr::addr_eq(Arc::as_ptr(held), Arc::as_ptr(&model_param)));
    }
}

#[test]
fn test_three_level_chain_with_inherited_false() {
    let docs = TestDocs::new();
    docs.write(
        "configs/_base_/runtime.yml",
        "batch_size: 2\niters: 100\nlr_scheduler:\n  type: PiecewiseDecay\n  boundaries: [50]\n  values: [0.1, 0.01]\n",
    );
    docs.write(
        "configs/_base_/model.yml",
        "_base_: runtime.yml\nmodel:\n  type: Foo\n  depth: 50\n",
    );
    let child = docs.write(
        "configs/experiment.yml",
        "\
_base_: _base_/model.yml
batch_size: 8
lr_scheduler:
  _inherited_: false
  type: Constant
  learning_rate: 0.5
",
    );
    let config = load(child);

    assert_eq!(config.batch_size().unwrap(), 8);
    assert_eq!(config.iters().unwrap(), Some(100));
    assert_eq!(
        keypath::lookup(config.tree(), "lr_scheduler.boundaries"),
        None
    );

    let schedule = config.lr_scheduler().unwrap();
    assert_eq!(
        schedule.as_object().unwrap().as_lr_schedule().unwrap().learning_rate_at(75),
        0.5
    );
    assert_eq!(config.model().unwrap().downcast_ref::<Foo>().unwrap().depth, 50);
}

#[test]
fn test_nested_sequences_and_plain_maps_survive() {
    let docs = TestDocs::new();
    let path = docs.write(
        "train.yml",
        "\
model:
  type: Sequential
  layers:
    - type: Conv2D
      in_channels: 3
      out_channels: 8
      kernel_size: 3
    - type: BatchNorm2D
      num_features: 8
    - type: ReLU
train_dataset:
  root: data
  sizes: [1, 2, 3]
",
    );
    let config = load(path);

    let model = config.model().unwrap().as_object().unwrap();
    // conv weight + bias, bn weight + bias
    assert_eq!(model.parameters().len(), 4);

    let dataset = config.train_dataset().unwrap().unwrap().as_map().unwrap();
    assert_eq!(dataset["root"], Instance::from("data"));
    assert_eq!(
        dataset["sizes"],
        Instance::List(vec![Instance::Integer(1), Instance::Integer(2), Instance::Integer(3)])
    );
}

#[test]
fn test_format_errors_surface_before_instantiation() {
    let docs = TestDocs::new();
    docs.write("train.cfg", "model:\n  type: Foo\n");

    let err = Config::builder(docs.path("train.cfg"))
        .resolver(resolver())
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Tree(trainconf_tree::Error::UnsupportedFormat { .. })
    ));

    let err = Config::builder(docs.path("absent.yml"))
        .resolver(resolver())
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Tree(trainconf_tree::Error::NotFound { .. })
    ));
}

#[test]
fn test_unknown_component_is_reported_by_name() {
    let docs = TestDocs::new();
    let path = docs.write("train.yml", "model:\n  type: Bar\n");
    let config = load(path);

    let err = config.model().unwrap_err();
    assert_eq!(err.to_string(), "The specified component was not found: Bar");
}
