//! Document format detection, parsing and rendering

use crate::{ConfigMap, ConfigValue, Error, Result};
use std::fmt;
use std::path::Path;

/// A supported document format.
///
/// Format is detected from the file extension:
/// - `.yaml`, `.yml` -> YAML
/// - `.json` -> JSON
/// - `.toml` -> TOML
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    Yaml,
    Json,
    Toml,
}

impl DocumentFormat {
    /// Detect the format of `path` from its extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("");

        match extension.to_lowercase().as_str() {
            "yaml" | "yml" => Ok(DocumentFormat::Yaml),
            "json" => Ok(DocumentFormat::Json),
            "toml" => Ok(DocumentFormat::Toml),
            _ => Err(Error::UnsupportedFormat {
                path: path.to_path_buf(),
                extension: extension.to_string(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DocumentFormat::Yaml => "YAML",
            DocumentFormat::Json => "JSON",
            DocumentFormat::Toml => "TOML",
        }
    }

    /// Parse document text into its root mapping.
    ///
    /// `path` is only used for error reporting. An empty YAML document
    /// parses to an empty mapping, and YAML `<<` merge keys are resolved.
    pub fn parse(&self, content: &str, path: &Path) -> Result<ConfigMap> {
        let parse_error = |message: String| Error::Parse {
            path: path.to_path_buf(),
            format: self.name().into(),
            message,
        };

        let root = match self {
            DocumentFormat::Yaml => {
                let mut raw: serde_yaml::Value =
                    serde_yaml::from_str(content).map_err(|e| parse_error(e.to_string()))?;
                raw.apply_merge().map_err(|e| parse_error(e.to_string()))?;
                ConfigValue::try_from(raw).map_err(parse_error)?
            }
            DocumentFormat::Json => {
                let raw: serde_json::Value =
                    serde_json::from_str(content).map_err(|e| parse_error(e.to_string()))?;
                ConfigValue::from(raw)
            }
            DocumentFormat::Toml => {
                let raw: toml::Table =
                    toml::from_str(content).map_err(|e| parse_error(e.to_string()))?;
                ConfigValue::from(toml::Value::Table(raw))
            }
        };

        match root {
            ConfigValue::Mapping(map) => Ok(map),
            ConfigValue::Null => Ok(ConfigMap::new()),
            other => Err(parse_error(format!(
                "document root must be a mapping, found {}",
                other.type_name()
            ))),
        }
    }

    /// Render a tree back into document text.
    ///
    /// TOML has no null, so null entries are left out of TOML output.
    pub fn render(&self, tree: &ConfigMap) -> Result<String> {
        let serialize_error = |message: String| Error::Serialize {
            format: self.name().into(),
            message,
        };

        match self {
            DocumentFormat::Yaml => {
                serde_yaml::to_string(tree).map_err(|e| serialize_error(e.to_string()))
            }
            DocumentFormat::Json => {
                serde_json::to_string_pretty(tree).map_err(|e| serialize_error(e.to_string()))
            }
            DocumentFormat::Toml => {
                toml::to_string_pretty(&without_nulls(tree))
                    .map_err(|e| serialize_error(e.to_string()))
            }
        }
    }
}

fn without_nulls(map: &ConfigMap) -> ConfigMap {
    map.iter()
        .filter_map(|(key, value)| strip_null(value).map(|value| (key.clone(), value)))
        .collect()
}

fn strip_null(value: &ConfigValue) -> Option<ConfigValue> {
    match value {
        ConfigValue::Null => None,
        ConfigValue::Mapping(map) => Some(ConfigValue::Mapping(without_nulls(map))),
        ConfigValue::Sequence(items) => Some(ConfigValue::Sequence(
            items.iter().filter_map(strip_null).collect(),
        )),
        other => Some(other.clone()),
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
