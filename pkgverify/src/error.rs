use config::ConfigError;
use ociclient::{ClientError, ImageReferenceError};
use thiserror::Error;

use crate::package::RegistryType;
use crate::registry::SUPPORTED_REGISTRY_EXAMPLES;
use crate::server_name::ServerNameError;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error(
        "unsupported OCI registry: '{url}'. Supported registries: {}",
        SUPPORTED_REGISTRY_EXAMPLES.join(", ")
    )]
    UnsupportedRegistry { url: String },

    #[error("no validator registered for registry type '{0}'")]
    UnsupportedRegistryType(RegistryType),

    #[error("invalid OCI image reference: {0}")]
    InvalidReference(#[from] ImageReferenceError),

    #[error(transparent)]
    Registry(#[from] ClientError),

    #[error(
        "OCI image '{reference}' is missing required annotation. Add this to your Dockerfile: LABEL {label}=\"{expected}\""
    )]
    MissingOwnershipAnnotation {
        reference: String,
        label: &'static str,
        expected: String,
    },

    #[error(
        "OCI image ownership validation failed. Expected annotation '{label}' = '{expected}', got '{actual}'"
    )]
    OwnershipMismatch {
        label: &'static str,
        expected: String,
        actual: String,
    },

    #[error(transparent)]
    InvalidServerName(#[from] ServerNameError),

    #[error("OCI validation cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ValidationError {
    /// Whether the caller may retry the publish attempt later.
    pub fn is_retryable(&self) -> bool {
        match self {
            ValidationError::Registry(err) => err.is_retryable(),
            ValidationError::Cancelled => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ValidationError>;

impl From<ConfigError> for ValidationError {
    fn from(err: ConfigError) -> Self {
        ValidationError::Config(err.to_string())
    }
}
