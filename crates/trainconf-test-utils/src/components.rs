//! Fake components standing in for real models, datasets and transforms.
//!
//! They validate their keyword arguments like real constructors would and
//! expose enough state for assertions.

use std::any::Any;
use std::sync::Arc;
use trainconf_registry::{
    Component, ComponentResolver, DomainRegistry, Params, Parameter, Result,
};

/// Residual backbone; one parameter slot per block plus the stem.
#[derive(Debug)]
pub struct ResNet {
    pub depth: usize,
    pub in_channels: usize,
    slots: Vec<Arc<Parameter>>,
}

impl ResNet {
    fn build(mut params: Params) -> Result<Arc<dyn Component>> {
        let depth = params.usize("depth")?;
        let in_channels = params.usize_or("in_channels", 3)?;
        let blocks: &[usize] = match depth {
            18 => &[2, 2, 2, 2],
            34 | 50 => &[3, 4, 6, 3],
            101 => &[3, 4, 23, 3],
            152 => &[3, 8, 36, 3],
            other => {
                return Err(params.invalid("depth", format!("unsupported depth {other}")));
            }
        };
        params.finish()?;

        let mut slots = vec![Arc::new(Parameter::new(
            "conv1.weight",
            vec![64, in_channels, 7, 7],
        ))];
        for (stage, count) in blocks.iter().enumerate() {
            for block in 0..*count {
                slots.push(Arc::new(Parameter::new(
                    format!("layer{}.{block}.weight", stage + 1),
                    vec![64, 64, 3, 3],
                )));
            }
        }
        Ok(Arc::new(Self {
            depth,
            in_channels,
            slots,
        }))
    }

    /// Number of parameter slots a backbone of `depth` exposes.
    pub fn expected_parameters(depth: usize) -> usize {
        match depth {
            18 => 9,
            34 | 50 => 17,
            101 => 34,
            152 => 51,
            _ => 0,
        }
    }
}

impl Component for ResNet {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn parameters(&self) -> Vec<Arc<Parameter>> {
        self.slots.clone()
    }
}

/// Backbone plus a linear head.
#[derive(Debug)]
pub struct Classifier {
    pub backbone: Arc<dyn Component>,
    pub num_classes: usize,
    head: Arc<Parameter>,
}

impl Classifier {
    fn build(mut params: Params) -> Result<Arc<dyn Component>> {
        let backbone = params.object("backbone")?;
        let num_classes = params.usize_or("num_classes", 10)?;
        params.finish()?;
        Ok(Arc::new(Self {
            backbone,
            num_classes,
            head: Arc::new(Parameter::new("head.weight", vec![512, num_classes])),
        }))
    }
}

impl Component for Classifier {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn parameters(&self) -> Vec<Arc<Parameter>> {
        let mut parameters = self.backbone.parameters();
        parameters.push(self.head.clone());
        parameters
    }
}

/// A model with no backbone, for tests that only need something buildable.
#[derive(Debug)]
pub struct TinyNet {
    weight: Arc<Parameter>,
}

impl TinyNet {
    fn build(params: Params) -> Result<Arc<dyn Component>> {
        params.finish()?;
        Ok(Arc::new(Self {
            weight: Arc::new(Parameter::new("weight", vec![1])),
        }))
    }
}

impl Component for TinyNet {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn parameters(&self) -> Vec<Arc<Parameter>> {
        vec![self.weight.clone()]
    }
}

#[derive(Debug)]
pub struct FakeDataset {
    pub dataset_root: String,
    pub mode: String,
    pub transforms: Vec<Arc<dyn Component>>,
}

impl FakeDataset {
    fn build(mut params: Params) -> Result<Arc<dyn Component>> {
        let dataset_root = match params.require("dataset_root")?.as_str() {
            Some(root) => root.to_string(),
            None => return Err(params.invalid("dataset_root", "expected a string")),
        };
        let mode = params.string_or("mode", "train")?;
        let transforms = params.objects_or_empty("transforms")?;
        params.finish()?;
        Ok(Arc::new(Self {
            dataset_root,
            mode,
            transforms,
        }))
    }
}

impl Component for FakeDataset {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct Resize {
    pub size: Vec<usize>,
}

impl Resize {
    fn build(mut params: Params) -> Result<Arc<dyn Component>> {
        let size = params.usize_list("size")?;
        params.finish()?;
        Ok(Arc::new(Self { size }))
    }
}

impl Component for Resize {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct RandomFlip {
    pub prob: f64,
}

impl RandomFlip {
    fn build(mut params: Params) -> Result<Arc<dyn Component>> {
        let prob = params.f64_or("prob", 0.5)?;
        params.finish()?;
        Ok(Arc::new(Self { prob }))
    }
}

impl Component for RandomFlip {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub fn backbones() -> Arc<DomainRegistry> {
    let registry = Arc::new(DomainRegistry::new("backbones"));
    registry.register_fn("ResNet", ResNet::build).unwrap();
    registry
}

pub fn models() -> Arc<DomainRegistry> {
    let registry = Arc::new(DomainRegistry::new("models"));
    registry.register_fn("Classifier", Classifier::build).unwrap();
    registry
}

pub fn datasets() -> Arc<DomainRegistry> {
    let registry = Arc::new(DomainRegistry::new("datasets"));
    registry.register_fn("FakeDataset", FakeDataset::build).unwrap();
    registry
}

pub fn transforms() -> Arc<DomainRegistry> {
    let registry = Arc::new(DomainRegistry::new("transforms"));
    registry.register_fn("Resize", Resize::build).unwrap();
    registry.register_fn("RandomFlip", RandomFlip::build).unwrap();
    registry
}

/// The `$ext` family: `TinyNet` only.
pub fn external() -> Arc<DomainRegistry> {
    let registry = Arc::new(DomainRegistry::new("ext"));
    registry.register_fn("TinyNet", TinyNet::build).unwrap();
    registry
}

/// A resolver over the fake registries, the `$ext` family and the built-ins.
pub fn fixture_resolver() -> ComponentResolver {
    ComponentResolver::new()
        .with_family("$ext", external())
        .with_domain(backbones())
        .with_domain(models())
        .with_domain(datasets())
        .with_domain(transforms())
        .with_builtins()
}
