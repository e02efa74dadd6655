//! Error types for trainconf-registry

/// Result type for trainconf-registry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while resolving component names or constructing components
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Name not found in any local registry or built-in namespace
    #[error("The specified component was not found: {name}")]
    ComponentNotFound { name: String },

    /// Name carried an external family prefix but the family has no such component
    #[error("The specified component was not found: {name} in {family}")]
    FamilyComponentNotFound { name: String, family: String },

    #[error("Component {name} is already registered in {domain}")]
    DuplicateComponent { domain: String, name: String },

    #[error("{component}: missing required parameter `{parameter}`")]
    MissingParameter { component: String, parameter: String },

    #[error("{component}: unexpected parameter `{parameter}`")]
    UnexpectedParameter { component: String, parameter: String },

    #[error("{component}: invalid parameter `{parameter}`: {message}")]
    InvalidParameter {
        component: String,
        parameter: String,
        message: String,
    },
}
