//! Property resolution and object instantiation for trainconf
//!
//! [`Config`] loads a document chain and turns its sections into live
//! objects on demand; [`Instantiator`] does the recursive construction.
//!
//! # Example
//!
//! ```ignore
//! use trainconf_core::{Config, Overrides};
//!
//! let config = Config::builder("configs/resnet101.yml")
//!     .overrides(Overrides::new().learning_rate(0.02))
//!     .build()?;
//! let model = config.model()?;
//! let optimizer = config.optimizer()?;
//! ```

pub mod config;
pub mod error;
pub mod instantiate;
pub mod logging;

pub use config::{Config, ConfigBuilder, Overrides, Summary, TrainingLength};
pub use error::{Error, Result};
pub use instantiate::Instantiator;
