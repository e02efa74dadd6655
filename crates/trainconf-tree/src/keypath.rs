//! Dotted key paths (`lr_scheduler.learning_rate`) into a configuration tree

use crate::{ConfigMap, ConfigValue, Error, Result};

fn segments(path: &str) -> Result<Vec<&str>> {
    let parts: Vec<&str> = path.split('.').collect();
    if parts.iter().any(|part| part.is_empty()) {
        return Err(Error::InvalidKeyPath {
            path: path.to_string(),
            message: "empty path segment".into(),
        });
    }
    Ok(parts)
}

/// Look up the value at `path`, descending through mappings only.
pub fn lookup<'a>(tree: &'a ConfigMap, path: &str) -> Option<&'a ConfigValue> {
    let mut parts = path.split('.');
    let mut current = tree.get(parts.next()?)?;
    for part in parts {
        current = current.as_mapping()?.get(part)?;
    }
    Some(current)
}

/// Write `value` at `path`, creating intermediate mappings as needed.
///
/// Fails if an intermediate segment exists but is not a mapping.
pub fn assign(tree: &mut ConfigMap, path: &str, value: ConfigValue) -> Result<()> {
    let parts = segments(path)?;
    let (last, parents) = parts
        .split_last()
        .ok_or_else(|| Error::InvalidKeyPath {
            path: path.to_string(),
            message: "path is empty".into(),
        })?;

    let mut current = tree;
    for (depth, part) in parents.iter().enumerate() {
        let entry = current
            .entry((*part).to_string())
            .or_insert_with(|| ConfigValue::Mapping(ConfigMap::new()));
        current = entry.as_mapping_mut().ok_or_else(|| Error::InvalidKeyPath {
            path: path.to_string(),
            message: format!("'{}' is not a mapping", parts[..=depth].join(".")),
        })?;
    }
    current.insert((*last).to_string(), value);
    Ok(())
}
