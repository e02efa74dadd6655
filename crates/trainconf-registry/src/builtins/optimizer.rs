//! Built-in optimizers
//!
//! Only the hyper-parameters and the parameter binding are modelled. The
//! update rules themselves run in the numerical runtime.

use super::lr::LearningRate;
use crate::{Component, ComponentType, Optimizer, Params, Result};
use std::any::Any;
use std::sync::Arc;

/// State every optimizer shares.
#[derive(Debug, Clone)]
pub struct OptimizerCore {
    learning_rate: LearningRate,
    parameters: Vec<Arc<dyn Component>>,
    weight_decay: f64,
}

impl OptimizerCore {
    fn from_params(params: &mut Params, default_weight_decay: f64) -> Result<Self> {
        Ok(Self {
            learning_rate: LearningRate::from_params(params, "learning_rate")?,
            parameters: params.parameter_list("parameters")?,
            weight_decay: params.f64_or("weight_decay", default_weight_decay)?,
        })
    }

    pub fn learning_rate(&self) -> &LearningRate {
        &self.learning_rate
    }

    pub fn weight_decay(&self) -> f64 {
        self.weight_decay
    }
}

macro_rules! optimizer_component {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $ty {
                pub fn core(&self) -> &OptimizerCore {
                    &self.core
                }
            }

            impl Component for $ty {
                fn as_any(&self) -> &dyn Any {
                    self
                }

                fn as_optimizer(&self) -> Option<&dyn Optimizer> {
                    Some(self)
                }
            }

            impl Optimizer for $ty {
                fn learning_rate_at(&self, step: usize) -> f64 {
                    self.core.learning_rate.at(step)
                }

                fn parameter_list(&self) -> &[Arc<dyn Component>] {
                    &self.core.parameters
                }
            }
        )+
    };
}

optimizer_component!(Sgd, Momentum, Adam, AdamW);

/// Stochastic gradient descent; `momentum` defaults to 0 (plain SGD).
#[derive(Debug, Clone)]
pub struct Sgd {
    core: OptimizerCore,
    momentum: f64,
}

impl Sgd {
    pub fn momentum(&self) -> f64 {
        self.momentum
    }

    fn build(mut params: Params) -> Result<Arc<dyn Component>> {
        let core = OptimizerCore::from_params(&mut params, 0.0)?;
        let momentum = params.f64_or("momentum", 0.0)?;
        params.finish()?;
        Ok(Arc::new(Self { core, momentum }))
    }
}

/// SGD with a velocity term, optionally Nesterov.
#[derive(Debug, Clone)]
pub struct Momentum {
    core: OptimizerCore,
    momentum: f64,
    use_nesterov: bool,
}

impl Momentum {
    pub fn momentum(&self) -> f64 {
        self.momentum
    }

    pub fn use_nesterov(&self) -> bool {
        self.use_nesterov
    }

    fn build(mut params: Params) -> Result<Arc<dyn Component>> {
        let core = OptimizerCore::from_params(&mut params, 0.0)?;
        let momentum = params.f64_or("momentum", 0.9)?;
        let use_nesterov = params.bool_or("use_nesterov", false)?;
        params.finish()?;
        Ok(Arc::new(Self {
            core,
            momentum,
            use_nesterov,
        }))
    }
}

/// First and second moment decay rates shared by the Adam family.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moments {
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
}

impl Moments {
    fn from_params(params: &mut Params) -> Result<Self> {
        let moments = Self {
            beta1: params.f64_or("beta1", 0.9)?,
            beta2: params.f64_or("beta2", 0.999)?,
            epsilon: params.f64_or("epsilon", 1e-8)?,
        };
        for (key, beta) in [("beta1", moments.beta1), ("beta2", moments.beta2)] {
            if !(0.0..1.0).contains(&beta) {
                return Err(params.invalid(key, format!("must be in [0, 1), found {beta}")));
            }
        }
        Ok(moments)
    }
}

/// Adam with L2 weight decay folded into the gradient.
#[derive(Debug, Clone)]
pub struct Adam {
    core: OptimizerCore,
    moments: Moments,
}

impl Adam {
    pub fn moments(&self) -> Moments {
        self.moments
    }

    fn build(mut params: Params) -> Result<Arc<dyn Component>> {
        let core = OptimizerCore::from_params(&mut params, 0.0)?;
        let moments = Moments::from_params(&mut params)?;
        params.finish()?;
        Ok(Arc::new(Self { core, moments }))
    }
}

/// Adam with decoupled weight decay (default 0.01).
#[derive(Debug, Clone)]
pub struct AdamW {
    core: OptimizerCore,
    moments: Moments,
}

impl AdamW {
    pub const DEFAULT_WEIGHT_DECAY: f64 = 0.01;

    pub fn moments(&self) -> Moments {
        self.moments
    }

    fn build(mut params: Params) -> Result<Arc<dyn Component>> {
        let core = OptimizerCore::from_params(&mut params, Self::DEFAULT_WEIGHT_DECAY)?;
        let moments = Moments::from_params(&mut params)?;
        params.finish()?;
        Ok(Arc::new(Self { core, moments }))
    }
}

pub(crate) fn component_types() -> Vec<ComponentType> {
    vec![
        ComponentType::new("SGD", Sgd::build),
        ComponentType::new("Momentum", Momentum::build),
        ComponentType::new("Adam", Adam::build),
        ComponentType::new("AdamW", AdamW::build),
    ]
}
