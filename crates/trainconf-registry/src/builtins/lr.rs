//! Built-in learning-rate schedules
//!
//! Every schedule is a pure function of the step index, so the same
//! instance can be shared by an optimizer and by whoever logs the rate.

use crate::{Component, ComponentType, Instance, LrSchedule, Params, Result};
use std::any::Any;
use std::f64::consts::PI;
use std::sync::Arc;

/// A learning rate that is either a fixed number or a shared schedule.
///
/// Optimizers and [`LinearWarmup`] accept both forms under the same key.
#[derive(Debug, Clone)]
pub enum LearningRate {
    Fixed(f64),
    Scheduled(Arc<dyn Component>),
}

impl LearningRate {
    /// Read `key` as a number or as an object implementing [`LrSchedule`].
    pub fn from_params(params: &mut Params, key: &str) -> Result<Self> {
        match params.require(key)? {
            Instance::Object(object) if object.as_lr_schedule().is_some() => {
                Ok(LearningRate::Scheduled(object))
            }
            other => other.as_f64().map(LearningRate::Fixed).ok_or_else(|| {
                params.invalid(
                    key,
                    format!(
                        "expected a number or a learning-rate schedule, found {}",
                        other.type_name()
                    ),
                )
            }),
        }
    }

    pub fn at(&self, step: usize) -> f64 {
        match self {
            LearningRate::Fixed(lr) => *lr,
            // from_params only admits objects with a schedule
            LearningRate::Scheduled(object) => object
                .as_lr_schedule()
                .map_or(0.0, |schedule| schedule.learning_rate_at(step)),
        }
    }

    /// The shared schedule object, if any.
    pub fn schedule(&self) -> Option<&Arc<dyn Component>> {
        match self {
            LearningRate::Scheduled(object) => Some(object),
            LearningRate::Fixed(_) => None,
        }
    }
}

macro_rules! lr_schedule_component {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Component for $ty {
                fn as_any(&self) -> &dyn Any {
                    self
                }

                fn as_lr_schedule(&self) -> Option<&dyn LrSchedule> {
                    Some(self)
                }
            }
        )+
    };
}

lr_schedule_component!(
    Constant,
    PolynomialDecay,
    PiecewiseDecay,
    CosineAnnealingDecay,
    ExponentialDecay,
    LinearWarmup,
);

/// The same rate at every step.
#[derive(Debug, Clone)]
pub struct Constant {
    learning_rate: f64,
}

impl Constant {
    pub fn new(learning_rate: f64) -> Self {
        Self { learning_rate }
    }

    fn build(mut params: Params) -> Result<Arc<dyn Component>> {
        let learning_rate = params.f64("learning_rate")?;
        params.finish()?;
        Ok(Arc::new(Self::new(learning_rate)))
    }
}

impl LrSchedule for Constant {
    fn learning_rate_at(&self, _step: usize) -> f64 {
        self.learning_rate
    }
}

/// Polynomial decay from `learning_rate` to `end_lr` over `decay_steps`.
///
/// With `cycle` the horizon is stretched to the next multiple of
/// `decay_steps` instead of holding at `end_lr`.
#[derive(Debug, Clone)]
pub struct PolynomialDecay {
    learning_rate: f64,
    decay_steps: usize,
    end_lr: f64,
    power: f64,
    cycle: bool,
}

impl PolynomialDecay {
    pub const DEFAULT_END_LR: f64 = 0.0001;

    pub fn new(learning_rate: f64, decay_steps: usize) -> Self {
        Self {
            learning_rate,
            decay_steps,
            end_lr: Self::DEFAULT_END_LR,
            power: 1.0,
            cycle: false,
        }
    }

    pub fn with_end_lr(mut self, end_lr: f64) -> Self {
        self.end_lr = end_lr;
        self
    }

    pub fn with_power(mut self, power: f64) -> Self {
        self.power = power;
        self
    }

    pub fn with_cycle(mut self, cycle: bool) -> Self {
        self.cycle = cycle;
        self
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn decay_steps(&self) -> usize {
        self.decay_steps
    }

    pub fn end_lr(&self) -> f64 {
        self.end_lr
    }

    pub fn power(&self) -> f64 {
        self.power
    }

    fn build(mut params: Params) -> Result<Arc<dyn Component>> {
        let learning_rate = params.f64("learning_rate")?;
        let decay_steps = params.usize("decay_steps")?;
        if decay_steps == 0 {
            return Err(params.invalid("decay_steps", "must be greater than zero"));
        }
        let schedule = Self::new(learning_rate, decay_steps)
            .with_end_lr(params.f64_or("end_lr", Self::DEFAULT_END_LR)?)
            .with_power(params.f64_or("power", 1.0)?)
            .with_cycle(params.bool_or("cycle", false)?);
        params.finish()?;
        Ok(Arc::new(schedule))
    }
}

impl LrSchedule for PolynomialDecay {
    fn learning_rate_at(&self, step: usize) -> f64 {
        let (step, horizon) = if self.cycle {
            let cycles = step.div_ceil(self.decay_steps).max(1);
            (step, self.decay_steps as f64 * cycles as f64)
        } else {
            (step.min(self.decay_steps), self.decay_steps as f64)
        };
        let remaining = 1.0 - step as f64 / horizon;
        (self.learning_rate - self.end_lr) * remaining.powf(self.power) + self.end_lr
    }
}

/// Step function: `values[i]` applies until `boundaries[i]`.
#[derive(Debug, Clone)]
pub struct PiecewiseDecay {
    boundaries: Vec<usize>,
    values: Vec<f64>,
}

impl PiecewiseDecay {
    fn build(mut params: Params) -> Result<Arc<dyn Component>> {
        let boundaries = params.usize_list("boundaries")?;
        let values = params.f64_list("values")?;
        if values.len() != boundaries.len() + 1 {
            return Err(params.invalid(
                "values",
                format!(
                    "expected {} values for {} boundaries, found {}",
                    boundaries.len() + 1,
                    boundaries.len(),
                    values.len()
                ),
            ));
        }
        params.finish()?;
        Ok(Arc::new(Self { boundaries, values }))
    }
}

impl LrSchedule for PiecewiseDecay {
    fn learning_rate_at(&self, step: usize) -> f64 {
        let index = self
            .boundaries
            .iter()
            .position(|&boundary| step < boundary)
            .unwrap_or(self.boundaries.len());
        self.values[index]
    }
}

/// Half-cosine from `learning_rate` down to `eta_min` over `T_max` steps.
#[derive(Debug, Clone)]
pub struct CosineAnnealingDecay {
    learning_rate: f64,
    t_max: usize,
    eta_min: f64,
}

impl CosineAnnealingDecay {
    fn build(mut params: Params) -> Result<Arc<dyn Component>> {
        let learning_rate = params.f64("learning_rate")?;
        let t_max = params.usize("T_max")?;
        if t_max == 0 {
            return Err(params.invalid("T_max", "must be greater than zero"));
        }
        let eta_min = params.f64_or("eta_min", 0.0)?;
        params.finish()?;
        Ok(Arc::new(Self {
            learning_rate,
            t_max,
            eta_min,
        }))
    }
}

impl LrSchedule for CosineAnnealingDecay {
    fn learning_rate_at(&self, step: usize) -> f64 {
        let progress = step as f64 / self.t_max as f64;
        self.eta_min + (self.learning_rate - self.eta_min) * 0.5 * (1.0 + (PI * progress).cos())
    }
}

#[derive(Debug, Clone)]
pub struct ExponentialDecay {
    learning_rate: f64,
    gamma: f64,
}

impl ExponentialDecay {
    fn build(mut params: Params) -> Result<Arc<dyn Component>> {
        let learning_rate = params.f64("learning_rate")?;
        let gamma = params.f64("gamma")?;
        params.finish()?;
        Ok(Arc::new(Self {
            learning_rate,
            gamma,
        }))
    }
}

impl LrSchedule for ExponentialDecay {
    fn learning_rate_at(&self, step: usize) -> f64 {
        self.learning_rate * self.gamma.powf(step as f64)
    }
}

/// Linear ramp from `start_lr` to `end_lr`, then hand over to `learning_rate`.
///
/// A wrapped schedule sees step 0 at the end of warmup.
#[derive(Debug, Clone)]
pub struct LinearWarmup {
    learning_rate: LearningRate,
    warmup_steps: usize,
    start_lr: f64,
    end_lr: f64,
}

impl LinearWarmup {
    pub fn after_warmup(&self) -> &LearningRate {
        &self.learning_rate
    }

    fn build(mut params: Params) -> Result<Arc<dyn Component>> {
        let learning_rate = LearningRate::from_params(&mut params, "learning_rate")?;
        let warmup_steps = params.usize("warmup_steps")?;
        let start_lr = params.f64("start_lr")?;
        let end_lr = params.f64("end_lr")?;
        params.finish()?;
        Ok(Arc::new(Self {
            learning_rate,
            warmup_steps,
            start_lr,
            end_lr,
        }))
    }
}

impl LrSchedule for LinearWarmup {
    fn learning_rate_at(&self, step: usize) -> f64 {
        if step < self.warmup_steps {
            let progress = step as f64 / self.warmup_steps as f64;
            self.start_lr + (self.end_lr - self.start_lr) * progress
        } else {
            self.learning_rate.at(step - self.warmup_steps)
        }
    }
}

pub(crate) fn component_types() -> Vec<ComponentType> {
    vec![
        ComponentType::new("Constant", Constant::build),
        ComponentType::new("PolynomialDecay", PolynomialDecay::build),
        ComponentType::new("PiecewiseDecay", PiecewiseDecay::build),
        ComponentType::new("CosineAnnealingDecay", CosineAnnealingDecay::build),
        ComponentType::new("ExponentialDecay", ExponentialDecay::build),
        ComponentType::new("LinearWarmup", LinearWarmup::build),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::collections::BTreeMap;

    fn construct(ty: &str, entries: &[(&str, Instance)]) -> Result<Arc<dyn Component>> {
        let values: BTreeMap<String, Instance> = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        component_types()
            .into_iter()
            .find(|c| c.name() == ty)
            .unwrap()
            .construct(values)
    }

    fn lr_at(schedule: &Arc<dyn Component>, step: usize) -> f64 {
        schedule.as_lr_schedule().unwrap().learning_rate_at(step)
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_constant_ignores_step() {
        let s = construct("Constant", &[("learning_rate", Instance::Float(0.01))]).unwrap();
        assert_close(lr_at(&s, 0), 0.01);
        assert_close(lr_at(&s, 10_000), 0.01);
    }

    #[test]
    fn test_polynomial_decay_defaults() {
        let s = construct(
            "PolynomialDecay",
            &[
                ("learning_rate", Instance::Float(0.01)),
                ("decay_steps", Instance::Integer(100)),
            ],
        )
        .unwrap();
        let decay = s.as_any().downcast_ref::<PolynomialDecay>().unwrap();
        assert_eq!(decay.end_lr(), PolynomialDecay::DEFAULT_END_LR);
        assert_eq!(decay.power(), 1.0);

        assert_close(lr_at(&s, 0), 0.01);
        assert_close(lr_at(&s, 50), (0.01 - 0.0001) * 0.5 + 0.0001);
        assert_close(lr_at(&s, 100), 0.0001);
        assert_close(lr_at(&s, 500), 0.0001);
    }

    #[test]
    fn test_polynomial_decay_cycles() {
        let s = PolynomialDecay::new(1.0, 10)
            .with_end_lr(0.0)
            .with_cycle(true);
        assert_close(s.learning_rate_at(0), 1.0);
        assert_close(s.learning_rate_at(10), 0.0);
        assert_close(s.learning_rate_at(15), 0.25);
    }

    #[test]
    fn test_polynomial_decay_cycles_at_last_step() {
        let s = PolynomialDecay::new(1.0, 3).with_end_lr(0.0).with_cycle(true);
        let lr = s.learning_rate_at(usize::MAX);
        assert!(lr.is_finite());
        assert!((0.0..=1.0).contains(&lr), "{lr}");
    }

    #[test]
    fn test_polynomial_decay_rejects_zero_steps() {
        let err = construct(
            "PolynomialDecay",
            &[
                ("learning_rate", Instance::Float(0.01)),
                ("decay_steps", Instance::Integer(0)),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { .. }));
    }

    #[test]
    fn test_piecewise_decay_steps_through_values() {
        let s = construct(
            "PiecewiseDecay",
            &[
                (
                    "boundaries",
                    Instance::List(vec![Instance::Integer(10), Instance::Integer(20)]),
                ),
                (
                    "values",
                    Instance::List(vec![
                        Instance::Float(0.1),
                        Instance::Float(0.01),
                        Instance::Float(0.001),
                    ]),
                ),
            ],
        )
        .unwrap();
        assert_close(lr_at(&s, 0), 0.1);
        assert_close(lr_at(&s, 10), 0.01);
        assert_close(lr_at(&s, 19), 0.01);
        assert_close(lr_at(&s, 20), 0.001);
    }

    #[test]
    fn test_piecewise_decay_requires_one_more_value() {
        let err = construct(
            "PiecewiseDecay",
            &[
                ("boundaries", Instance::List(vec![Instance::Integer(10)])),
                ("values", Instance::List(vec![Instance::Float(0.1)])),
            ],
        )
        .unwrap_err();
        assert!(err.to_string().contains("expected 2 values for 1 boundaries"));
    }

    #[test]
    fn test_cosine_annealing_endpoints() {
        let s = construct(
            "CosineAnnealingDecay",
            &[
                ("learning_rate", Instance::Float(1.0)),
                ("T_max", Instance::Integer(100)),
            ],
        )
        .unwrap();
        assert_close(lr_at(&s, 0), 1.0);
        assert_close(lr_at(&s, 50), 0.5);
        assert_close(lr_at(&s, 100), 0.0);
    }

    #[test]
    fn test_exponential_decay() {
        let s = construct(
            "ExponentialDecay",
            &[
                ("learning_rate", Instance::Float(1.0)),
                ("gamma", Instance::Float(0.5)),
            ],
        )
        .unwrap();
        assert_close(lr_at(&s, 3), 0.125);
    }

    #[test]
    fn test_linear_warmup_hands_over_to_wrapped_schedule() {
        let inner = construct(
            "PiecewiseDecay",
            &[
                ("boundaries", Instance::List(vec![Instance::Integer(5)])),
                (
                    "values",
                    Instance::List(vec![Instance::Float(0.1), Instance::Float(0.01)]),
                ),
            ],
        )
        .unwrap();
        let s = construct(
            "LinearWarmup",
            &[
                ("learning_rate", Instance::Object(inner.clone())),
                ("warmup_steps", Instance::Integer(10)),
                ("start_lr", Instance::Float(0.0)),
                ("end_lr", Instance::Float(0.1)),
            ],
        )
        .unwrap();

        assert_close(lr_at(&s, 0), 0.0);
        assert_close(lr_at(&s, 5), 0.05);
        assert_close(lr_at(&s, 10), 0.1);
        assert_close(lr_at(&s, 15), 0.01);

        let warmup = s.as_any().downcast_ref::<LinearWarmup>().unwrap();
        assert!(Arc::ptr_eq(warmup.after_warmup().schedule().unwrap(), &inner));
    }

    #[test]
    fn test_linear_warmup_rejects_non_schedule_objects() {
        let not_a_schedule: Arc<dyn Component> =
            Arc::new(crate::Parameter::new("w", vec![1]));
        let err = construct(
            "LinearWarmup",
            &[
                ("learning_rate", Instance::Object(not_a_schedule)),
                ("warmup_steps", Instance::Integer(10)),
                ("start_lr", Instance::Float(0.0)),
                ("end_lr", Instance::Float(0.1)),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { .. }));
    }

    #[test]
    fn test_unknown_keyword_is_rejected() {
        let err = construct(
            "Constant",
            &[
                ("learning_rate", Instance::Float(0.01)),
                ("warmup", Instance::Integer(3)),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnexpectedParameter { .. }));
    }
}
