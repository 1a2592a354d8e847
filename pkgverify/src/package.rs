use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Package ecosystems a published server may point at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryType {
    Npm,
    Pypi,
    Oci,
    Nuget,
    Mcpb,
}

impl fmt::Display for RegistryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryType::Npm => write!(f, "npm"),
            RegistryType::Pypi => write!(f, "pypi"),
            RegistryType::Oci => write!(f, "oci"),
            RegistryType::Nuget => write!(f, "nuget"),
            RegistryType::Mcpb => write!(f, "mcpb"),
        }
    }
}

impl FromStr for RegistryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "npm" => Ok(RegistryType::Npm),
            "pypi" => Ok(RegistryType::Pypi),
            "oci" => Ok(RegistryType::Oci),
            "nuget" => Ok(RegistryType::Nuget),
            "mcpb" => Ok(RegistryType::Mcpb),
            other => Err(format!("unknown registry type '{}'", other)),
        }
    }
}

/// A package as referenced from a publish request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDescriptor {
    pub registry_type: RegistryType,
    /// Empty means the default public registry
    #[serde(default)]
    pub registry_base_url: String,
    pub identifier: String,
    pub version: String,
}

impl PackageDescriptor {
    pub fn oci(registry_base_url: &str, identifier: &str, version: &str) -> Self {
        Self {
            registry_type: RegistryType::Oci,
            registry_base_url: registry_base_url.to_string(),
            identifier: identifier.to_string(),
            version: version.to_string(),
        }
    }
}
