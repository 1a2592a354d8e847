use crate::image_reference::ImageReference;

/// Token endpoint of the default public registry
pub const DOCKER_HUB_REALM: &str = "https://auth.docker.io/token";
/// Service name the default public registry expects in token requests
pub const DOCKER_HUB_SERVICE: &str = "registry.docker.io";

/// How a registry family must be approached before `/v2/...` calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStrategy {
    /// Public images are served to anonymous callers
    Anonymous,
    /// A pull-scoped bearer token has to be requested from `realm` first
    BearerToken { realm: String, service: String },
}

impl AuthStrategy {
    /// The token handshake used by Docker Hub
    pub fn docker_hub() -> Self {
        AuthStrategy::BearerToken {
            realm: DOCKER_HUB_REALM.to_string(),
            service: DOCKER_HUB_SERVICE.to_string(),
        }
    }

    pub fn requires_token(&self) -> bool {
        matches!(self, AuthStrategy::BearerToken { .. })
    }
}

/// Pull scope for a repository, `repository:<namespace>/<repository>:pull`
pub fn pull_scope(reference: &ImageReference) -> String {
    format!("repository:{}:pull", reference.path())
}

/// Token endpoint URL for the given realm, service and reference
pub(crate) fn token_url(realm: &str, service: &str, reference: &ImageReference) -> String {
    format!("{}?service={}&scope={}", realm, service, pull_scope(reference))
}
