//! Error types for trainconf-core

/// Result type for trainconf-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while resolving properties or instantiating sections
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("No `{section}` specified in the configuration file")]
    MissingSection { section: String },

    #[error("Section `{section}` has no `type` key")]
    MissingType { section: String },

    #[error("`type` must be a component name string, found {found}")]
    InvalidTypeName { found: &'static str },

    #[error("Section `{section}` must be {expected}, found {found}")]
    InvalidSection {
        section: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Section `{section}` did not build a component (got {found})")]
    NotAComponent { section: String, found: &'static str },

    #[error(transparent)]
    Tree(#[from] trainconf_tree::Error),

    #[error(transparent)]
    Registry(#[from] trainconf_registry::Error),
}

impl Error {
    pub(crate) fn missing_section(section: &str) -> Self {
        Self::MissingSection {
            section: section.to_string(),
        }
    }
}
