//! Metadata storage backends.
//!
//! A [`MetadataStorage`] attaches named metadata blobs to images. The only
//! backend is [`RegistryStorage`], which keeps the blobs and the index that
//! maps image digests to them in the image's own repository.

use crate::auth::Credentials;
use crate::client::{Client, ClientConfig};
use crate::error::{ManifestoError, Result};
use crate::index::{MetadataIndex, PutOutcome};
use crate::reference::Reference;
use crate::registry::Registry;
use crate::resolver::ImageResolver;
use std::fs;
use std::path::Path;
use tracing::{debug, info};


/// Reads and writes metadata attached to images.
///
/// Every operation returns the image name it acted on, as `repo:tag` plus
/// `@digest` when the reference carried one.
pub trait MetadataStorage {
    /// Fetches the `metadata_type` blob of `image`; `None` when there is none.
    fn get_metadata(&self, image: &str, metadata_type: &str) -> Result<(Option<Vec<u8>>, String)>;

    /// Lists the metadata types stored for `image`.
    fn list_metadata(&self, image: &str) -> Result<(Vec<String>, String)>;

    /// Stores the contents of `file` as the `metadata_type` blob of `image`.
    fn put_metadata(&self, image: &str, metadata_type: &str, file: &Path) -> Result<String>;
}

/// Metadata kept in the registry that hosts the image.
///
/// Each operation opens a fresh client for the reference's registry host, so
/// tokens never outlive one call.
pub struct RegistryStorage {
    resolver: Box<dyn ImageResolver>,
    credentials: Credentials,
    client_config: ClientConfig,
}

impl RegistryStorage {
    /// Creates a registry-backed storage.
    ///
    /// # Examples
    ///
    /// ```
    /// use libmanifesto::auth::Credentials;
    /// use libmanifesto::client::ClientConfig;
    /// use libmanifesto::resolver::StaticResolver;
    /// use libmanifesto::storage::RegistryStorage;
    ///
    /// let storage = RegistryStorage::new(
    ///     Box::new(StaticResolver::new()),
    ///     Credentials::anonymous(),
    ///     ClientConfig::new(),
    /// );
    /// # let _ = storage;
    /// ```
    pub fn new(
        resolver: Box<dyn ImageResolver>,
        credentials: Credentials,
        client_config: ClientConfig,
    ) -> Self {
        Self {
            resolver,
            credentials,
            client_config,
        }
    }

    /// Parses `image` and returns it with the digest it designates.
    fn resolve(&self, image: &str) -> Result<(Reference, String)> {
        let reference = Reference::parse(image);
        let digest = match reference.digest() {
            Some(digest) => digest.to_string(),
            None => self.resolver.resolve_digest(&reference.image_name())?,
        };
        debug!(image = %reference, %digest, "resolved image digest");
        Ok((reference, digest))
    }

    fn connect(&self, reference: &Reference) -> Result<Registry> {
        let client = Client::with_config(
            &reference.registry_host,
            self.client_config.clone(),
            Some(self.credentials.clone()),
        )?;
        Ok(Registry::new(client))
    }

    fn fetch_index(registry: &mut Registry, reference: &Reference) -> Result<MetadataIndex> {
        let index = registry
            .fetch_tagged_blob(&reference.repo_path_no_host)?
            .map(|bytes| MetadataIndex::from_slice(&bytes))
            .unwrap_or_default();
        Ok(index)
    }
}

impl MetadataStorage for RegistryStorage {
    fn get_metadata(&self, image: &str, metadata_type: &str) -> Result<(Option<Vec<u8>>, String)> {
        let (reference, digest) = self.resolve(image)?;
        let mut registry = self.connect(&reference)?;
        let index = Self::fetch_index(&mut registry, &reference)?;

        let Some(entry) = index.get(&digest, metadata_type) else {
            debug!(image = %reference, metadata_type, "no such metadata");
            return Ok((None, reference.to_string()));
        };

        let data = registry.fetch_blob(&reference.repo_path_no_host, &entry.digest)?;
        Ok((Some(data), reference.to_string()))
    }

    fn list_metadata(&self, image: &str) -> Result<(Vec<String>, String)> {
        let (reference, digest) = self.resolve(image)?;
        let mut registry = self.connect(&reference)?;
        let index = Self::fetch_index(&mut registry, &reference)?;

        Ok((index.list(&digest), reference.to_string()))
    }

    fn put_metadata(&self, image: &str, metadata_type: &str, file: &Path) -> Result<String> {
        let data = fs::read(file).map_err(|e| {
            ManifestoError::io(format!("Failed to read '{}'", file.display()), e)
        })?;

        let (reference, digest) = self.resolve(image)?;
        let repository = reference.repo_path_no_host.as_str();
        let mut registry = self.connect(&reference)?;
        let mut index = Self::fetch_index(&mut registry, &reference)?;

        // A failure past this upload leaves an unreferenced blob behind.
        let blob_digest = registry.upload_blob(repository, &data)?;
        let outcome = index.put(&digest, metadata_type, &blob_digest);
        registry.put_tagged_blob(repository, &index.to_vec()?)?;

        match outcome {
            PutOutcome::Replaced => info!(image = %reference, metadata_type, "replaced metadata"),
            PutOutcome::Added | PutOutcome::NewImage => {
                info!(image = %reference, metadata_type, "added metadata")
            }
        }
        Ok(reference.to_string())
    }
}
