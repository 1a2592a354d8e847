use std::collections::HashMap;

use serde::Deserialize;

/// Docker image manifest, schema 2
pub const DOCKER_MANIFEST_V2: &str = "application/vnd.docker.distribution.manifest.v2+json";
/// OCI image manifest
pub const OCI_MANIFEST_V1: &str = "application/vnd.oci.image.manifest.v1+json";

/// Represents a manifest as returned by `GET /v2/<name>/manifests/<reference>`.
///
/// Registries answer with either an image manifest carrying a config
/// descriptor or an index listing per-platform manifests. Both shapes
/// decode into this struct; see [`ManifestVariant`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    /// Per-platform entries of a manifest list / image index
    #[serde(default)]
    pub manifests: Option<Vec<Descriptor>>,
    /// Descriptor for the config blob
    #[serde(default)]
    pub config: Option<Descriptor>,
}

/// Represents a descriptor for a content blob in an OCI registry
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Descriptor {
    /// Media type of the referenced content
    #[serde(default, rename = "mediaType")]
    pub media_type: Option<String>,
    /// Digest of the referenced content
    #[serde(default)]
    pub digest: String,
}

/// Enum representing the two manifest shapes the client follows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestVariant {
    /// Image index; holds the digest of the first platform entry
    List(String),
    /// Image manifest; holds the config digest, possibly empty
    Image(String),
}

impl Manifest {
    pub fn variant(&self) -> ManifestVariant {
        match self.manifests.as_deref() {
            Some([first, ..]) => ManifestVariant::List(first.digest.clone()),
            _ => ManifestVariant::Image(self.config_digest().to_string()),
        }
    }

    /// Config digest of an image manifest, empty when absent
    pub fn config_digest(&self) -> &str {
        self.config.as_ref().map(|c| c.digest.as_str()).unwrap_or("")
    }
}

/// Represents the image configuration blob
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageConfig {
    #[serde(default)]
    pub config: Option<ContainerConfig>,
}

/// The `config` object of an image configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContainerConfig {
    #[serde(default, rename = "Labels")]
    pub labels: Option<HashMap<String, String>>,
}

impl ImageConfig {
    /// Take the declared labels; a missing `config` or `Labels` yields an empty map
    pub fn into_labels(self) -> HashMap<String, String> {
        self.config.and_then(|c| c.labels).unwrap_or_default()
    }
}

// Token authentication response from the auth service
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}
