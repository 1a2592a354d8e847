pub mod config;
pub mod error;
pub mod package;
pub mod registry;
pub mod server_name;
pub mod validator;

pub use error::{Result, ValidationError};
pub use package::{PackageDescriptor, RegistryType};
pub use registry::{ApiOrigin, ProviderTable};
pub use validator::{OciValidator, PackageValidator, SERVER_NAME_LABEL, validate_package};
