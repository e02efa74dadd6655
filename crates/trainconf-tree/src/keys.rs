//! Reserved keys recognized inside configuration documents.
//!
//! These names live in the same namespace as ordinary parameters. A component
//! cannot take a constructor argument called `type`, and `_base_` /
//! `_inherited_` are never forwarded to constructors.

/// Top-level key naming the base document, relative to the current one.
pub const BASE: &str = "_base_";

/// Per-mapping switch; `false` replaces the base subtree instead of merging.
pub const INHERITED: &str = "_inherited_";

/// Component name inside a type descriptor.
pub const TYPE: &str = "type";

/// Returns true for keys consumed by document loading and merging.
pub fn is_bookkeeping(key: &str) -> bool {
    key == BASE || key == INHERITED
}
