use std::time::Duration;

use reqwest::{Client as ReqwestClient, RequestBuilder, StatusCode, header};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::auth::{AuthStrategy, token_url};
use crate::error::{AuthError, ClientError, Result};
use crate::image_reference::ImageReference;
use crate::models::{
    DOCKER_MANIFEST_V2, ImageConfig, Manifest, ManifestVariant, OCI_MANIFEST_V1, TokenResponse,
};

/// User-Agent sent with every registry request unless overridden
pub const DEFAULT_USER_AGENT: &str = "MCP-Registry-Validator/1.0";
/// Per-request timeout unless overridden
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A client for reading image metadata from one registry API origin.
#[derive(Debug, Clone)]
pub struct Client {
    api_origin: String,
    auth: AuthStrategy,
    user_agent: String,
    timeout: Duration,
    client: ReqwestClient,
}

impl Client {
    /// Create a new client for the given API origin.
    ///
    /// The reqwest client may be shared between many `Client`s; it only
    /// pools connections.
    pub fn new(api_origin: String, auth: AuthStrategy, client: ReqwestClient) -> Self {
        Self {
            api_origin: api_origin.trim_end_matches('/').to_string(),
            auth,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            client,
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Create a new session for the given image reference.
    pub fn new_session(&self, reference: ImageReference) -> ClientSession {
        ClientSession {
            reference,
            api_origin: self.api_origin.clone(),
            auth: self.auth.clone(),
            user_agent: self.user_agent.clone(),
            timeout: self.timeout,
            client: self.client.clone(),
        }
    }
}

/// A session for reading one image reference.
///
/// Sessions hold no credentials: a token is requested for every fetch
/// that needs one.
pub struct ClientSession {
    reference: ImageReference,
    api_origin: String,
    auth: AuthStrategy,
    user_agent: String,
    timeout: Duration,
    client: ReqwestClient,
}

impl ClientSession {
    /// Request a pull token when the registry family needs one.
    async fn bearer_token(&self) -> Result<Option<String>> {
        let (realm, service) = match &self.auth {
            AuthStrategy::Anonymous => return Ok(None),
            AuthStrategy::BearerToken { realm, service } => (realm, service),
        };

        let url = token_url(realm, service, &self.reference);
        debug!(url = %url, "requesting pull token");

        self.fetch_token(&url)
            .await
            .map(Some)
            .map_err(|source| ClientError::Authentication {
                origin: self.api_origin.clone(),
                source,
            })
    }

    async fn fetch_token(&self, url: &str) -> std::result::Result<String, AuthError> {
        let response = self
            .client
            .get(url)
            .header(header::USER_AGENT, &self.user_agent)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(AuthError::Request)?;

        if response.status() != StatusCode::OK {
            return Err(AuthError::Status(response.status().as_u16()));
        }

        let body = response.bytes().await.map_err(AuthError::Request)?;
        let token: TokenResponse = serde_json::from_slice(&body).map_err(AuthError::Parse)?;
        Ok(token.token)
    }

    /// Build an authenticated GET request against the API origin.
    async fn get(&self, path: &str, accept: &str) -> Result<RequestBuilder> {
        let url = format!("{}/v2/{}/{}", self.api_origin, self.reference.path(), path);
        debug!(url = %url, accept, "registry request");

        let mut request = self
            .client
            .get(&url)
            .header(header::ACCEPT, accept)
            .header(header::USER_AGENT, &self.user_agent)
            .timeout(self.timeout);

        if let Some(token) = self.bearer_token().await? {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        Ok(request)
    }

    /// Resolve the config digest for the session's tag.
    ///
    /// An image index is followed exactly once, to its first platform
    /// entry.
    #[instrument(skip(self), fields(reference = %self.reference))]
    pub async fn resolve_config_digest(&self) -> Result<String> {
        let manifest = self.fetch_manifest().await?;

        let config_digest = match manifest.variant() {
            ManifestVariant::List(digest) => {
                debug!(digest = %digest, "following image index to first platform manifest");
                self.fetch_platform_manifest(&digest)
                    .await?
                    .config_digest()
                    .to_string()
            }
            ManifestVariant::Image(digest) => digest,
        };

        if config_digest.is_empty() {
            return Err(ClientError::ConfigDigestMissing {
                reference: self.reference.to_string(),
            });
        }

        Ok(config_digest)
    }

    /// Fetch the manifest for the session's tag.
    pub async fn fetch_manifest(&self) -> Result<Manifest> {
        let reference = self.reference.to_string();
        let accept = format!("{},{}", DOCKER_MANIFEST_V2, OCI_MANIFEST_V1);
        let path = format!("manifests/{}", self.reference.tag);

        let response = self
            .get(&path, &accept)
            .await?
            .send()
            .await
            .map_err(|source| ClientError::ManifestRequest {
                reference: reference.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::UNAUTHORIZED => Err(ClientError::ImageNotFound {
                reference,
                status: response.status().as_u16(),
            }),
            StatusCode::TOO_MANY_REQUESTS => Err(ClientError::RateLimited { reference }),
            StatusCode::OK => {
                let body = response
                    .bytes()
                    .await
                    .map_err(|source| ClientError::ManifestRequest {
                        reference: reference.clone(),
                        source,
                    })?;
                decode(&body).map_err(|source| ClientError::ManifestParse { reference, source })
            }
            status => Err(ClientError::ManifestStatus {
                reference,
                status: status.as_u16(),
            }),
        }
    }

    /// Fetch a platform-specific manifest by digest.
    pub async fn fetch_platform_manifest(&self, digest: &str) -> Result<Manifest> {
        let path = format!("manifests/{}", digest);

        let response = self
            .get(&path, OCI_MANIFEST_V1)
            .await?
            .send()
            .await
            .map_err(|source| ClientError::PlatformManifestRequest {
                digest: digest.to_string(),
                source,
            })?;

        if response.status() != StatusCode::OK {
            return Err(ClientError::PlatformManifestStatus {
                digest: digest.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| ClientError::PlatformManifestRequest {
                digest: digest.to_string(),
                source,
            })?;
        decode(&body).map_err(|source| ClientError::PlatformManifestParse {
            digest: digest.to_string(),
            source,
        })
    }

    /// Fetch the image configuration blob with the given digest.
    #[instrument(skip(self), fields(reference = %self.reference))]
    pub async fn fetch_config(&self, digest: &str) -> Result<ImageConfig> {
        let path = format!("blobs/{}", digest);

        let response = self
            .get(&path, DOCKER_MANIFEST_V2)
            .await?
            .send()
            .await
            .map_err(|source| ClientError::ConfigRequest {
                digest: digest.to_string(),
                source,
            })?;

        if response.status() != StatusCode::OK {
            return Err(ClientError::ConfigStatus {
                digest: digest.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| ClientError::ConfigRequest {
                digest: digest.to_string(),
                source,
            })?;
        decode(&body).map_err(|source| ClientError::ConfigParse {
            digest: digest.to_string(),
            source,
        })
    }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> std::result::Result<T, serde_json::Error> {
    serde_json::from_slice(body)
}
