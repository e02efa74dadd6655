//! Configuration tree for trainconf
//!
//! Provides the generic [`ConfigValue`] tree, format-aware document loading
//! with `_base_` inheritance, and the deep merge used to combine a document
//! with its base.
//!
//! # Example
//!
//! ```ignore
//! use trainconf_tree::DocumentLoader;
//!
//! let tree = DocumentLoader::new().load("configs/resnet101.yaml")?;
//! assert!(tree.contains_key("model"));
//! ```

pub mod error;
pub mod format;
pub mod keypath;
pub mod keys;
pub mod loader;
pub mod merge;
pub mod value;

pub use error::{Error, Result};
pub use format::DocumentFormat;
pub use loader::{Document, DocumentLoader, load};
pub use merge::merge;
pub use value::{ConfigMap, ConfigValue};
