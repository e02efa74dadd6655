//! Component registries and name resolution for trainconf
//!
//! This crate turns `type:` names into constructible [`ComponentType`]s:
//!
//! - [`Component`] and [`Instance`] for built objects and plain values
//! - [`Params`] for keyword arguments handed to constructors
//! - [`DomainRegistry`] and [`ComponentSource`] for pluggable catalogues
//! - [`ComponentResolver`] for ordered lookup across families, local domains
//!   and the [`builtins`]
//! - [`manager`] for the process-wide registries

pub mod builtins;
pub mod component;
pub mod error;
pub mod instance;
pub mod manager;
pub mod params;
pub mod resolver;
pub mod source;

pub use component::{Component, ComponentType, LrSchedule, Optimizer, Parameter};
pub use error::{Error, Result};
pub use instance::Instance;
pub use params::Params;
pub use resolver::{ComponentResolver, ExternalFamily, FAMILY_SEPARATOR};
pub use source::{ComponentSource, DomainRegistry, SourceChain};
