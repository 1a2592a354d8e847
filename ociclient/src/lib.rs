pub mod auth;
pub mod client;
pub mod error;
pub mod image_reference;
pub mod models;

// Re-export main client types for convenience
pub use auth::AuthStrategy;
pub use client::{Client, ClientSession};
pub use error::{AuthError, ClientError};
pub use image_reference::{ImageReference, ImageReferenceError};
pub use models::{ImageConfig, Manifest, ManifestVariant};
