use reqwest::StatusCode;
use thiserror::Error;

/// Failures of the bearer-token handshake
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("failed to request auth token: {0}")]
    Request(#[source] reqwest::Error),

    #[error("auth request failed with status {0}")]
    Status(u16),

    #[error("failed to parse auth response: {0}")]
    Parse(#[source] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("failed to authenticate with registry {origin}: {source}")]
    Authentication {
        origin: String,
        #[source]
        source: AuthError,
    },

    #[error("OCI image '{reference}' not found (status: {status})")]
    ImageNotFound { reference: String, status: u16 },

    #[error("rate limited when accessing OCI image '{reference}'")]
    RateLimited { reference: String },

    #[error("failed to fetch OCI manifest for '{reference}': {source}")]
    ManifestRequest {
        reference: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to fetch OCI manifest for '{reference}' (status: {status})")]
    ManifestStatus { reference: String, status: u16 },

    #[error("failed to parse OCI manifest for '{reference}': {source}")]
    ManifestParse {
        reference: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to get specific manifest '{digest}': {source}")]
    PlatformManifestRequest {
        digest: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to get specific manifest: specific manifest '{digest}' not found (status: {status})")]
    PlatformManifestStatus { digest: String, status: u16 },

    #[error("failed to get specific manifest: failed to parse specific manifest '{digest}': {source}")]
    PlatformManifestParse {
        digest: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unable to determine image config digest for '{reference}'")]
    ConfigDigestMissing { reference: String },

    #[error("failed to get image config: failed to fetch image config '{digest}': {source}")]
    ConfigRequest {
        digest: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to get image config: image config '{digest}' not found (status: {status})")]
    ConfigStatus { digest: String, status: u16 },

    #[error("failed to get image config: failed to parse image config '{digest}': {source}")]
    ConfigParse {
        digest: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    /// HTTP status reported by the registry, if the failure carried one
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Authentication {
                source: AuthError::Status(status),
                ..
            } => Some(*status),
            ClientError::ImageNotFound { status, .. }
            | ClientError::ManifestStatus { status, .. }
            | ClientError::PlatformManifestStatus { status, .. }
            | ClientError::ConfigStatus { status, .. } => Some(*status),
            ClientError::RateLimited { .. } => Some(StatusCode::TOO_MANY_REQUESTS.as_u16()),
            _ => None,
        }
    }

    /// Whether repeating the whole validation later could succeed.
    ///
    /// Transport failures, 429 and 5xx are retryable. Missing images,
    /// undecodable documents and other 4xx answers are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Authentication {
                source: AuthError::Request(_),
                ..
            }
            | ClientError::ManifestRequest { .. }
            | ClientError::PlatformManifestRequest { .. }
            | ClientError::ConfigRequest { .. } => true,
            ClientError::RateLimited { .. } => true,
            ClientError::ImageNotFound { .. } => false,
            _ => self
                .status()
                .and_then(|status| StatusCode::from_u16(status).ok())
                .is_some_and(|status| {
                    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
                }),
        }
    }
}
