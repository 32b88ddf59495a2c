//! High-level API for the manifesto library.
//!
//! [`Manifesto`] picks the storage backend from configuration and exposes the
//! three metadata operations. It is the recommended entry point.
//!
//! # Examples
//!
//! ```no_run
//! use libmanifesto::Manifesto;
//! use libmanifesto::resolver::StaticResolver;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let resolver = StaticResolver::new().with_image(
//!         "quay.io/acme/widget:v1",
//!         "sha256:2c26b46b68ffc68ff99b453c1d30413413422d706483bfa0f98a5e886266e7ae",
//!     );
//!     let manifesto = Manifesto::builder().resolver(resolver).build()?;
//!
//!     let (types, image) = manifesto.list("quay.io/acme/widget:v1")?;
//!     for metadata_type in types {
//!         println!("{}: {}", image, metadata_type);
//!     }
//!     Ok(())
//! }
//! ```

use crate::auth::Credentials;
use crate::client::ClientConfig;
use crate::config::{Config, StorageBackend};
use crate::error::{ManifestoError, Result};
use crate::resolver::ImageResolver;
use crate::storage::{MetadataStorage, RegistryStorage};
use std::path::Path;

/// Metadata operations over the configured storage backend.
pub struct Manifesto {
    storage: Box<dyn MetadataStorage>,
}

impl Manifesto {
    /// Creates a builder.
    pub fn builder() -> ManifestoBuilder {
        ManifestoBuilder::new()
    }

    /// Wraps an existing storage backend.
    pub fn with_storage(storage: Box<dyn MetadataStorage>) -> Self {
        Self { storage }
    }

    /// Fetches the `metadata_type` blob of `image`.
    ///
    /// Returns `None` when the image has no metadata of that type, along with
    /// the resolved image name.
    pub fn get(&self, image: &str, metadata_type: &str) -> Result<(Option<Vec<u8>>, String)> {
        self.storage.get_metadata(image, metadata_type)
    }

    /// Lists the metadata types stored for `image`.
    pub fn list(&self, image: &str) -> Result<(Vec<String>, String)> {
        self.storage.list_metadata(image)
    }

    /// Stores the contents of `file` as the `metadata_type` blob of `image`.
    pub fn put(&self, image: &str, metadata_type: &str, file: &Path) -> Result<String> {
        self.storage.put_metadata(image, metadata_type, file)
    }
}

/// Builder for [`Manifesto`].
pub struct ManifestoBuilder {
    config: Config,
    credentials: Option<Credentials>,
    resolver: Option<Box<dyn ImageResolver>>,
}

impl ManifestoBuilder {
    /// Create a new builder with the default configuration.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            credentials: None,
            resolver: None,
        }
    }

    /// Set configuration directly.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Set credentials for authentication.
    ///
    /// Without this, credentials come from the configuration's `registry`
    /// section.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set the resolver used to look up image digests.
    pub fn resolver(mut self, resolver: impl ImageResolver + 'static) -> Self {
        self.resolver = Some(Box::new(resolver));
        self
    }

    /// Build the `Manifesto` instance.
    pub fn build(self) -> Result<Manifesto> {
        let resolver = self
            .resolver
            .ok_or_else(|| ManifestoError::validation("An image resolver is required"))?;

        let credentials = self.credentials.unwrap_or_else(|| {
            Credentials::from_parts(
                self.config.registry.username.as_deref(),
                self.config.registry.password.as_deref(),
            )
        });
        let client_config = ClientConfig::new()
            .with_timeout(self.config.network.timeout)
            .with_insecure(self.config.registry.insecure);

        let storage: Box<dyn MetadataStorage> = match self.config.storage {
            StorageBackend::Registry => Box::new(RegistryStorage::new(
                resolver,
                credentials,
                client_config,
            )),
        };

        Ok(Manifesto { storage })
    }
}

impl Default for ManifestoBuilder {
    fn default() -> Self {
        Self::new()
    }
}
