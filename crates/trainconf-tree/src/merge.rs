//! Deep merge of a document over its base

use crate::{ConfigMap, ConfigValue, keys};

/// Merge `overlay` on top of `base`, returning a new tree.
///
/// - A mapping carrying `_inherited_: false` replaces its base counterpart
///   wholesale (the marker itself is dropped).
/// - Mapping values whose key also holds a mapping in `base` merge recursively.
/// - Any other overlay value replaces the base value.
/// - Keys present only in `base` are kept unchanged.
///
/// Neither input is modified.
pub fn merge(overlay: &ConfigMap, base: &ConfigMap) -> ConfigMap {
    if opts_out(overlay) {
        let mut verbatim = overlay.clone();
        verbatim.remove(keys::INHERITED);
        return verbatim;
    }

    let mut merged = base.clone();
    for (key, value) in overlay {
        let combined = match (value, base.get(key)) {
            (ConfigValue::Mapping(child), Some(ConfigValue::Mapping(base_child))) => {
                ConfigValue::Mapping(merge(child, base_child))
            }
            _ => value.clone(),
        };
        merged.insert(key.clone(), combined);
    }
    merged
}

fn opts_out(map: &ConfigMap) -> bool {
    matches!(map.get(keys::INHERITED), Some(ConfigValue::Bool(false)))
}
