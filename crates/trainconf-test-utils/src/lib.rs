//! Shared test utilities for the trainconf workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`docs`]: [`TestDocs`](docs::TestDocs) for writing document trees to a temp dir
//! - [`components`]: fake models, datasets and transforms plus a resolver over them

pub mod components;
pub mod docs;

pub use components::fixture_resolver;
pub use docs::TestDocs;
