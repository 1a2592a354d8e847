//! Mapping of public registry base URLs to the API origin serving `/v2/...`.
//!
//! Known providers are looked up exactly. Hostname families that cannot be
//! enumerated (regional and per-account hosts) are matched by an ordered list
//! of [`FallbackRule`]s; the first rule that matches wins and the base URL is
//! used as the API origin unchanged.

use std::collections::HashMap;
use std::fmt;

use ociclient::AuthStrategy;

use crate::error::{Result, ValidationError};

/// Base URL used when a package names no registry
pub const DEFAULT_REGISTRY_URL: &str = "https://docker.io";
/// API origin of the default public registry
pub const DOCKER_HUB_API_URL: &str = "https://registry-1.docker.io";

pub const GHCR_URL: &str = "https://ghcr.io";
pub const GAR_URL: &str = "https://artifactregistry.googleapis.com";
pub const GCR_URL: &str = "https://gcr.io";
pub const ECR_PUBLIC_URL: &str = "https://public.ecr.aws";
pub const ACR_URL: &str = "https://azurecr.io";
pub const QUAY_URL: &str = "https://quay.io";
pub const GITLAB_CR_URL: &str = "https://registry.gitlab.com";
pub const DOCKER_HUB_URL: &str = "https://hub.docker.com";
pub const JFROG_URL: &str = "https://jfrog.io";
pub const HARBOR_URL: &str = "https://goharbor.io";
pub const ALIBABA_ACR_URL: &str = "https://cr.console.aliyun.com";
pub const IBM_CR_URL: &str = "https://icr.io";
pub const ORACLE_CR_URL: &str = "https://container-registry.oracle.com";
pub const DIGITALOCEAN_CR_URL: &str = "https://registry.digitalocean.com";

/// Providers named in the "unsupported registry" message
pub const SUPPORTED_REGISTRY_EXAMPLES: &[&str] = &[
    "docker.io",
    "ghcr.io",
    "gcr.io",
    "quay.io",
    "artifactregistry.googleapis.com",
];

/// Where and how to talk to a registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiOrigin {
    pub url: String,
    pub auth: AuthStrategy,
}

impl ApiOrigin {
    pub fn anonymous(url: &str) -> Self {
        Self {
            url: url.to_string(),
            auth: AuthStrategy::Anonymous,
        }
    }
}

/// A named predicate over registry base URLs
#[derive(Clone, Copy)]
pub struct FallbackRule {
    pub name: &'static str,
    predicate: fn(&str) -> bool,
}

impl FallbackRule {
    pub const fn new(name: &'static str, predicate: fn(&str) -> bool) -> Self {
        Self { name, predicate }
    }

    pub fn matches(&self, base_url: &str) -> bool {
        (self.predicate)(base_url)
    }
}

impl fmt::Debug for FallbackRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FallbackRule").field(&self.name).finish()
    }
}

fn is_regional_artifact_registry(base_url: &str) -> bool {
    base_url.contains("-docker.pkg.dev")
}

fn is_regional_container_registry(base_url: &str) -> bool {
    base_url.contains(".gcr.io")
}

fn is_aws_account_registry(base_url: &str) -> bool {
    base_url.contains(".amazonaws.com")
}

fn is_azure_registry_instance(base_url: &str) -> bool {
    base_url.contains(".azurecr.io")
}

fn is_loopback(base_url: &str) -> bool {
    base_url.starts_with("http://127.0.0.1:") || base_url.starts_with("http://localhost:")
}

/// Fallback rules in evaluation order
pub const FALLBACK_RULES: &[FallbackRule] = &[
    FallbackRule::new("artifact-registry-regional", is_regional_artifact_registry),
    FallbackRule::new("container-registry-regional", is_regional_container_registry),
    FallbackRule::new("aws-account", is_aws_account_registry),
    FallbackRule::new("azure-instance", is_azure_registry_instance),
    FallbackRule::new("loopback", is_loopback),
];

/// Immutable provider table, built once and shared by all validations.
#[derive(Debug, Clone)]
pub struct ProviderTable {
    default_registry: String,
    providers: HashMap<String, ApiOrigin>,
    fallbacks: Vec<FallbackRule>,
}

impl ProviderTable {
    /// Build a table from explicit parts. Used for synthetic tables in tests.
    pub fn new(
        default_registry: &str,
        providers: impl IntoIterator<Item = (String, ApiOrigin)>,
        fallbacks: Vec<FallbackRule>,
    ) -> Self {
        Self {
            default_registry: default_registry.to_string(),
            providers: providers.into_iter().collect(),
            fallbacks,
        }
    }

    /// The providers the registry supports out of the box.
    pub fn builtin() -> Self {
        let docker = ApiOrigin {
            url: DOCKER_HUB_API_URL.to_string(),
            auth: AuthStrategy::docker_hub(),
        };

        let mut providers = vec![
            (DEFAULT_REGISTRY_URL.to_string(), docker.clone()),
            (DOCKER_HUB_URL.to_string(), docker),
        ];
        providers.extend(
            [
                (GHCR_URL, "https://ghcr.io"),
                (GAR_URL, "https://artifactregistry.googleapis.com"),
                (GCR_URL, "https://gcr.io"),
                (ECR_PUBLIC_URL, "https://public.ecr.aws"),
                (ACR_URL, "https://azurecr.io"),
                (QUAY_URL, "https://quay.io"),
                (GITLAB_CR_URL, "https://registry.gitlab.com"),
                (JFROG_URL, "https://jfrog.io"),
                (HARBOR_URL, "https://goharbor.io"),
                (ALIBABA_ACR_URL, "https://cr.console.aliyun.com"),
                (IBM_CR_URL, "https://icr.io"),
                (ORACLE_CR_URL, "https://container-registry.oracle.com"),
                (DIGITALOCEAN_CR_URL, "https://registry.digitalocean.com"),
            ]
            .into_iter()
            .map(|(base_url, api)| (base_url.to_string(), ApiOrigin::anonymous(api))),
        );

        Self::new(DEFAULT_REGISTRY_URL, providers, FALLBACK_RULES.to_vec())
    }

    /// Add or replace the entry for `base_url`.
    pub fn with_provider(mut self, base_url: &str, origin: ApiOrigin) -> Self {
        self.providers.insert(base_url.to_string(), origin);
        self
    }

    /// Base URL substituted for packages that name no registry.
    pub fn with_default_registry(mut self, base_url: &str) -> Self {
        self.default_registry = base_url.to_string();
        self
    }

    /// Map a registry base URL to its API origin.
    pub fn resolve(&self, base_url: &str) -> Result<ApiOrigin> {
        let base_url = if base_url.is_empty() {
            self.default_registry.as_str()
        } else {
            base_url
        };

        if let Some(origin) = self.providers.get(base_url) {
            return Ok(origin.clone());
        }

        self.fallbacks
            .iter()
            .find(|rule| rule.matches(base_url))
            .map(|_| ApiOrigin::anonymous(base_url))
            .ok_or_else(|| ValidationError::UnsupportedRegistry {
                url: base_url.to_string(),
            })
    }
}

impl Default for ProviderTable {
    fn default() -> Self {
        Self::builtin()
    }
}
