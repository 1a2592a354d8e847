use std::fmt;

use thiserror::Error;

/// Namespace used when an identifier carries no explicit namespace segment
pub const DEFAULT_NAMESPACE: &str = "library";

/// Error type for image reference parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageReferenceError {
    #[error("invalid image reference: {0}")]
    InvalidFormat(String),
}

/// Represents an image reference inside a single registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// Namespace (organisation or user)
    pub namespace: String,
    /// Repository name inside the namespace
    pub repository: String,
    /// Tag or digest
    pub tag: String,
}

impl ImageReference {
    /// Create a new ImageReference from an already split namespace and repository
    pub fn new(namespace: String, repository: String, tag: String) -> Self {
        Self {
            namespace,
            repository,
            tag,
        }
    }

    /// Parse a package identifier and attach the given tag.
    pub fn parse(identifier: &str, tag: &str) -> Result<Self, ImageReferenceError> {
        let (namespace, repository) = split_identifier(identifier)?;
        Ok(Self::new(namespace, repository, tag.to_string()))
    }

    /// The `namespace/repository` path used in `/v2/...` URLs
    pub fn path(&self) -> String {
        format!("{}/{}", self.namespace, self.repository)
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.namespace, self.repository, self.tag)
    }
}

/// Split an identifier into `(namespace, repository)`.
///
/// A single segment lands in [`DEFAULT_NAMESPACE`]. Two segments are taken
/// verbatim. Anything else is rejected. The empty identifier is a single
/// empty segment and is not rejected here; the registry answers it.
pub fn split_identifier(identifier: &str) -> Result<(String, String), ImageReferenceError> {
    let parts: Vec<&str> = identifier.split('/').collect();
    match parts.as_slice() {
        [repository] => Ok((DEFAULT_NAMESPACE.to_string(), repository.to_string())),
        [namespace, repository] => Ok((namespace.to_string(), repository.to_string())),
        _ => Err(ImageReferenceError::InvalidFormat(identifier.to_string())),
    }
}
