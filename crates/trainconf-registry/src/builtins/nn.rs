//! Built-in neural network layers
//!
//! Layers carry their parameter slots so optimizers can be bound to them.

use crate::{Component, ComponentType, Params, Parameter, Result};
use std::any::Any;
use std::sync::Arc;

fn trainable(slots: &[Arc<Parameter>]) -> Vec<Arc<Parameter>> {
    slots.iter().filter(|p| p.trainable()).cloned().collect()
}

/// `bias_attr: false` turns the bias off; anything else keeps it.
fn has_bias(params: &mut Params) -> Result<bool> {
    params.bool_or("bias_attr", true)
}

/// Expand a scalar-or-pair spatial argument to `[h, w]`.
fn pair(params: &Params, key: &str, values: Vec<usize>) -> Result<[usize; 2]> {
    match values.as_slice() {
        [n] => Ok([*n, *n]),
        [h, w] => Ok([*h, *w]),
        _ => Err(params.invalid(key, format!("expected 1 or 2 values, found {}", values.len()))),
    }
}

macro_rules! layer_component {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Component for $ty {
                fn as_any(&self) -> &dyn Any {
                    self
                }

                fn parameters(&self) -> Vec<Arc<Parameter>> {
                    trainable(&self.slots)
                }
            }
        )+
    };
}

layer_component!(Linear, Conv2D, BatchNorm2D);

/// Fully connected layer; weight is `[in_features, out_features]`.
#[derive(Debug, Clone)]
pub struct Linear {
    in_features: usize,
    out_features: usize,
    slots: Vec<Arc<Parameter>>,
}

impl Linear {
    pub fn new(in_features: usize, out_features: usize, bias: bool) -> Self {
        let mut slots = vec![Arc::new(Parameter::new(
            "weight",
            vec![in_features, out_features],
        ))];
        if bias {
            slots.push(Arc::new(Parameter::new("bias", vec![out_features])));
        }
        Self {
            in_features,
            out_features,
            slots,
        }
    }

    pub fn in_features(&self) -> usize {
        self.in_features
    }

    pub fn out_features(&self) -> usize {
        self.out_features
    }

    fn build(mut params: Params) -> Result<Arc<dyn Component>> {
        let in_features = params.usize("in_features")?;
        let out_features = params.usize("out_features")?;
        let bias = has_bias(&mut params)?;
        params.finish()?;
        Ok(Arc::new(Self::new(in_features, out_features, bias)))
    }
}

/// 2-D convolution; weight is `[out, in / groups, kh, kw]`.
#[derive(Debug, Clone)]
pub struct Conv2D {
    in_channels: usize,
    out_channels: usize,
    kernel_size: [usize; 2],
    stride: [usize; 2],
    padding: [usize; 2],
    dilation: [usize; 2],
    groups: usize,
    slots: Vec<Arc<Parameter>>,
}

impl Conv2D {
    pub fn kernel_size(&self) -> [usize; 2] {
        self.kernel_size
    }

    pub fn stride(&self) -> [usize; 2] {
        self.stride
    }

    pub fn padding(&self) -> [usize; 2] {
        self.padding
    }

    pub fn dilation(&self) -> [usize; 2] {
        self.dilation
    }

    pub fn groups(&self) -> usize {
        self.groups
    }

    pub fn in_channels(&self) -> usize {
        self.in_channels
    }

    pub fn out_channels(&self) -> usize {
        self.out_channels
    }

    fn build(mut params: Params) -> Result<Arc<dyn Component>> {
        let in_channels = params.usize("in_channels")?;
        let out_channels = params.usize("out_channels")?;
        let kernel_size = params.usize_list("kernel_size")?;
        let kernel_size = pair(&params, "kernel_size", kernel_size)?;
        let stride = params.usize_list_or("stride", &[1])?;
        let stride = pair(&params, "stride", stride)?;
        let padding = params.usize_list_or("padding", &[0])?;
        let padding = pair(&params, "padding", padding)?;
        let dilation = params.usize_list_or("dilation", &[1])?;
        let dilation = pair(&params, "dilation", dilation)?;
        let groups = params.usize_or("groups", 1)?;
        if groups == 0 || in_channels % groups != 0 || out_channels % groups != 0 {
            return Err(params.invalid(
                "groups",
                format!("{groups} does not divide {in_channels} input and {out_channels} output channels"),
            ));
        }
        let bias = has_bias(&mut params)?;
        params.finish()?;

        let mut slots = vec![Arc::new(Parameter::new(
            "weight",
            vec![out_channels, in_channels / groups, kernel_size[0], kernel_size[1]],
        ))];
        if bias {
            slots.push(Arc::new(Parameter::new("bias", vec![out_channels])));
        }
        Ok(Arc::new(Self {
            in_channels,
            out_channels,
            kernel_size,
            stride,
            padding,
            dilation,
            groups,
            slots,
        }))
    }
}

/// Batch normalisation over channels; running statistics are frozen slots.
#[derive(Debug, Clone)]
pub struct BatchNorm2D {
    num_features: usize,
    momentum: f64,
    epsilon: f64,
    slots: Vec<Arc<Parameter>>,
}

impl BatchNorm2D {
    pub fn num_features(&self) -> usize {
        self.num_features
    }

    pub fn momentum(&self) -> f64 {
        self.momentum
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Every slot including running statistics.
    pub fn slots(&self) -> &[Arc<Parameter>] {
        &self.slots
    }

    fn build(mut params: Params) -> Result<Arc<dyn Component>> {
        let num_features = params.usize("num_features")?;
        let momentum = params.f64_or("momentum", 0.9)?;
        let epsilon = params.f64_or("epsilon", 1e-5)?;
        params.finish()?;

        let shape = vec![num_features];
        Ok(Arc::new(Self {
            num_features,
            momentum,
            epsilon,
            slots: vec![
                Arc::new(Parameter::new("weight", shape.clone())),
                Arc::new(Parameter::new("bias", shape.clone())),
                Arc::new(Parameter::frozen("_mean", shape.clone())),
                Arc::new(Parameter::frozen("_variance", shape)),
            ],
        }))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReLU;

impl ReLU {
    fn build(params: Params) -> Result<Arc<dyn Component>> {
        params.finish()?;
        Ok(Arc::new(ReLU))
    }
}

impl Component for ReLU {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Dropout {
    p: f64,
}

impl Dropout {
    pub fn p(&self) -> f64 {
        self.p
    }

    fn build(mut params: Params) -> Result<Arc<dyn Component>> {
        let p = params.f64_or("p", 0.5)?;
        if !(0.0..=1.0).contains(&p) {
            return Err(params.invalid("p", format!("must be in [0, 1], found {p}")));
        }
        params.finish()?;
        Ok(Arc::new(Self { p }))
    }
}

impl Component for Dropout {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Ordered container of layers; its parameters are its children's, in order.
#[derive(Debug, Clone)]
pub struct Sequential {
    layers: Vec<Arc<dyn Component>>,
}

impl Sequential {
    pub fn layers(&self) -> &[Arc<dyn Component>] {
        &self.layers
    }

    fn build(mut params: Params) -> Result<Arc<dyn Component>> {
        let layers = params.objects_or_empty("layers")?;
        params.finish()?;
        Ok(Arc::new(Self { layers }))
    }
}

impl Component for Sequential {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn parameters(&self) -> Vec<Arc<Parameter>> {
        self.layers.iter().flat_map(|layer| layer.parameters()).collect()
    }
}

pub(crate) fn component_types() -> Vec<ComponentType> {
    vec![
        ComponentType::new("Linear", Linear::build),
        ComponentType::new("Conv2D", Conv2D::build),
        ComponentType::new("BatchNorm2D", BatchNorm2D::build),
        ComponentType::new("ReLU", ReLU::build),
        ComponentType::new("Dropout", Dropout::build),
        ComponentType::new("Sequential", Sequential::build),
    ]
}
