use std::env;
use std::time::Duration;

use config::{Config, Environment, File};
use ociclient::AuthStrategy;
use ociclient::client::DEFAULT_USER_AGENT;
use serde::Deserialize;

use crate::error::{Result, ValidationError};
use crate::registry::{ApiOrigin, DEFAULT_REGISTRY_URL, ProviderTable};

#[derive(Debug, Clone, Deserialize)]
pub struct ValidatorConfig {
    /// Timeout applied to every outbound request
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Base URL substituted when a package names no registry
    pub default_registry: String,
    /// Extra providers merged over the built-in table
    #[serde(default)]
    pub registries: Vec<ProviderConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_origin: String,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AuthConfig {
    #[default]
    Anonymous,
    BearerToken { realm: String, service: String },
}

impl From<&ProviderConfig> for ApiOrigin {
    fn from(provider: &ProviderConfig) -> Self {
        let auth = match &provider.auth {
            AuthConfig::Anonymous => AuthStrategy::Anonymous,
            AuthConfig::BearerToken { realm, service } => AuthStrategy::BearerToken {
                realm: realm.clone(),
                service: service.clone(),
            },
        };
        ApiOrigin {
            url: provider.api_origin.clone(),
            auth,
        }
    }
}

impl ValidatorConfig {
    pub fn load() -> Result<Self> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "dev".into());

        let config = Config::builder()
            // Start with default values
            .set_default("timeout_secs", 10)?
            .set_default("user_agent", DEFAULT_USER_AGENT)?
            .set_default("default_registry", DEFAULT_REGISTRY_URL)?
            // Add configuration from files
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add environment variables with prefix PKGVERIFY, e.g. PKGVERIFY__TIMEOUT_SECS
            .add_source(
                Environment::with_prefix("PKGVERIFY")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .map_err(|e| ValidationError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| ValidationError::Config(e.to_string()))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The built-in provider table with this configuration's overrides applied.
    pub fn provider_table(&self) -> ProviderTable {
        self.registries.iter().fold(
            ProviderTable::builtin().with_default_registry(&self.default_registry),
            |table, provider| table.with_provider(&provider.base_url, ApiOrigin::from(provider)),
        )
    }
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            default_registry: DEFAULT_REGISTRY_URL.to_string(),
            registries: Vec::new(),
        }
    }
}
