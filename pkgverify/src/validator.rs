use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ociclient::client::{DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
use ociclient::{Client, ClientError, ImageReference};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::config::ValidatorConfig;
use crate::error::{Result, ValidationError};
use crate::package::{PackageDescriptor, RegistryType};
use crate::registry::ProviderTable;
use crate::server_name::validate_server_name;

/// Image label that names the server an image belongs to
pub const SERVER_NAME_LABEL: &str = "io.modelcontextprotocol.server.name";

/// Validates a package against the registry it is published to.
#[async_trait]
pub trait PackageValidator: Send + Sync {
    fn registry_type(&self) -> RegistryType;

    async fn validate(&self, package: &PackageDescriptor, server_name: &str) -> Result<()>;
}

/// Route a package to the validator for its registry type.
pub async fn validate_package(
    validators: &[Arc<dyn PackageValidator>],
    package: &PackageDescriptor,
    server_name: &str,
) -> Result<()> {
    validate_server_name(server_name)?;

    let validator = validators
        .iter()
        .find(|v| v.registry_type() == package.registry_type)
        .ok_or(ValidationError::UnsupportedRegistryType(package.registry_type))?;

    validator.validate(package, server_name).await
}

/// Checks that an OCI image carries the ownership label of the claimed server.
///
/// Holds only immutable state and may be shared between concurrent
/// validations.
#[derive(Debug, Clone)]
pub struct OciValidator {
    providers: ProviderTable,
    http: reqwest::Client,
    user_agent: String,
    timeout: Duration,
}

impl OciValidator {
    /// Create a validator from configuration, with its own connection pool.
    pub fn new(config: &ValidatorConfig) -> Self {
        Self::with_client(config.provider_table(), reqwest::Client::new())
            .with_user_agent(&config.user_agent)
            .with_timeout(config.timeout())
    }

    /// Create a validator over an explicit provider table and HTTP client.
    pub fn with_client(providers: ProviderTable, http: reqwest::Client) -> Self {
        Self {
            providers,
            http,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validate that `package` belongs to `server_name`.
    pub async fn validate_ownership(
        &self,
        package: &PackageDescriptor,
        server_name: &str,
    ) -> Result<()> {
        self.validate_ownership_with_cancel(package, server_name, &CancellationToken::new())
            .await
    }

    /// Like [`validate_ownership`](Self::validate_ownership), aborting the
    /// in-flight request once `cancel` fires.
    #[instrument(
        skip(self, package, cancel),
        fields(
            registry = %package.registry_base_url,
            identifier = %package.identifier,
            version = %package.version,
        )
    )]
    pub async fn validate_ownership_with_cancel(
        &self,
        package: &PackageDescriptor,
        server_name: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let origin = self.providers.resolve(&package.registry_base_url)?;
        let reference = ImageReference::parse(&package.identifier, &package.version)?;

        let session = Client::new(origin.url, origin.auth, self.http.clone())
            .with_user_agent(self.user_agent.as_str())
            .with_timeout(self.timeout)
            .new_session(reference.clone());

        let digest = match cancellable(cancel, session.resolve_config_digest()).await {
            Err(ValidationError::Registry(ClientError::RateLimited { reference })) => {
                // TODO: return RateLimited to the caller instead of skipping the check
                warn!(
                    "Rate limited when accessing OCI image '{}'. Skipping validation.",
                    reference
                );
                return Ok(());
            }
            result => result?,
        };

        let labels = cancellable(cancel, session.fetch_config(&digest))
            .await?
            .into_labels();

        verify_ownership(&labels, server_name, &reference)?;
        info!("OCI image '{}' belongs to '{}'", reference, server_name);
        Ok(())
    }
}

#[async_trait]
impl PackageValidator for OciValidator {
    fn registry_type(&self) -> RegistryType {
        RegistryType::Oci
    }

    async fn validate(&self, package: &PackageDescriptor, server_name: &str) -> Result<()> {
        if package.registry_type != RegistryType::Oci {
            return Err(ValidationError::UnsupportedRegistryType(package.registry_type));
        }
        self.validate_ownership(package, server_name).await
    }
}

async fn cancellable<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = ociclient::error::Result<T>>,
) -> Result<T> {
    tokio::select! {
        _ = cancel.cancelled() => Err(ValidationError::Cancelled),
        result = fut => result.map_err(ValidationError::from),
    }
}

/// Compare the ownership label against the claimed server name, byte for byte.
pub fn verify_ownership(
    labels: &HashMap<String, String>,
    server_name: &str,
    reference: &ImageReference,
) -> Result<()> {
    match labels.get(SERVER_NAME_LABEL) {
        None => Err(ValidationError::MissingOwnershipAnnotation {
            reference: reference.to_string(),
            label: SERVER_NAME_LABEL,
            expected: server_name.to_string(),
        }),
        Some(actual) if actual != server_name => Err(ValidationError::OwnershipMismatch {
            label: SERVER_NAME_LABEL,
            expected: server_name.to_string(),
            actual: actual.clone(),
        }),
        Some(_) => Ok(()),
    }
}
