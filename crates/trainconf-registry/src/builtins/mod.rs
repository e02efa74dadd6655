//! Built-in component namespaces
//!
//! These are searched after every local domain, so a collaborator can shadow
//! any of them by registering the same name.

pub mod lr;
pub mod nn;
pub mod optimizer;

use crate::DomainRegistry;

pub use lr::LearningRate;

/// Learning-rate schedules.
pub fn lr_schedules() -> DomainRegistry {
    DomainRegistry::with_components("lr", lr::component_types())
}

pub fn optimizers() -> DomainRegistry {
    DomainRegistry::with_components("optimizer", optimizer::component_types())
}

/// Neural network layers.
pub fn layers() -> DomainRegistry {
    DomainRegistry::with_components("nn", nn::component_types())
}
