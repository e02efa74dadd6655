//! Document loading with `_base_` inheritance
//!
//! A document may name a base document through a top-level `_base_` key:
//!
//! ```yaml
//! _base_: ../_base_/resnet50.yaml
//! model:
//!   depth: 101
//! ```
//!
//! The base path is resolved relative to the directory of the document that
//! references it. Bases may themselves have bases; the chain is loaded
//! recursively and merged from the root down with [`merge`](crate::merge).

use crate::{ConfigMap, ConfigValue, DocumentFormat, Error, Result, keys, merge};
use std::fs;
use std::path::{Path, PathBuf};

/// A loaded document with its inheritance chain already merged.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Path the document was loaded from
    pub path: PathBuf,
    /// Format of the top-level document
    pub format: DocumentFormat,
    /// Merged tree
    pub tree: ConfigMap,
}

/// Loads configuration documents and resolves their inheritance chain.
#[derive(Debug, Default)]
pub struct DocumentLoader;

impl DocumentLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load `path` and merge it over its base documents.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if `path` or any base document does not exist
    /// - [`Error::UnsupportedFormat`] if an extension is not yaml/yml/json/toml
    /// - [`Error::InheritanceCycle`] if a document is reached twice in one chain
    pub fn load(&self, path: impl AsRef<Path>) -> Result<ConfigMap> {
        Ok(self.load_document(path)?.tree)
    }

    /// Like [`load`](Self::load) but also reports the format of the
    /// top-level document.
    pub fn load_document(&self, path: impl AsRef<Path>) -> Result<Document> {
        let path = path.as_ref();
        let format = check_path(path)?;
        let mut chain = Vec::new();
        let tree = self.load_chain(path, &mut chain)?;

        Ok(Document {
            path: path.to_path_buf(),
            format,
            tree,
        })
    }

    fn load_chain(&self, path: &Path, chain: &mut Vec<PathBuf>) -> Result<ConfigMap> {
        let format = check_path(path)?;
        let canonical = dunce::canonicalize(path).map_err(|e| Error::io(path, e))?;
        if chain.contains(&canonical) {
            return Err(Error::InheritanceCycle { path: canonical });
        }
        chain.push(canonical);

        tracing::debug!(?path, %format, "Loading configuration document");
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let mut tree = format.parse(&content, path)?;

        let Some(base_ref) = tree.remove(keys::BASE) else {
            return Ok(tree);
        };
        let base_path = match base_ref {
            ConfigValue::String(relative) => path
                .parent()
                .unwrap_or_else(|| Path::new(""))
                .join(relative),
            other => {
                return Err(Error::InvalidBase {
                    path: path.to_path_buf(),
                    found: other.type_name(),
                });
            }
        };

        tracing::debug!(?path, ?base_path, "Merging over base document");
        let base_tree = self.load_chain(&base_path, chain)?;
        Ok(merge(&tree, &base_tree))
    }
}

/// Load `path` with a default [`DocumentLoader`].
pub fn load(path: impl AsRef<Path>) -> Result<ConfigMap> {
    DocumentLoader::new().load(path)
}

/// Existence is checked before the format so a missing `.txt` file reports
/// `NotFound` rather than `UnsupportedFormat`.
fn check_path(path: &Path) -> Result<DocumentFormat> {
    if path.as_os_str().is_empty() {
        return Err(Error::EmptyPath);
    }
    if !path.exists() {
        return Err(Error::NotFound {
            path: path.to_path_buf(),
        });
    }
    DocumentFormat::from_path(path)
}
