//! OCI manifest used to publish the metadata index under its tag.
//!
//! Registries only bind tags to manifests, so the index blob is wrapped in a
//! fixed-shape image manifest: an empty JSON config and exactly one layer
//! carrying [`INDEX_MEDIA_TYPE`]. Nothing else about manifests is modelled.

pub use oci_spec::image::{Descriptor, ImageManifest, MediaType};

use crate::digest::compute_digest;
use crate::error::{ManifestoError, Result};
use oci_spec::image::{DescriptorBuilder, Digest as OciDigest, ImageManifestBuilder};
use std::str::FromStr;

#[cfg(test)]
mod tests;

/// Media type of the layer holding the metadata index document.
pub const INDEX_MEDIA_TYPE: &str = "application/vnd.manifesto.index.v1+json";

/// Media type sent and accepted for the index manifest.
pub const MANIFEST_MEDIA_TYPE: &str = "application/vnd.oci.image.manifest.v1+json";

/// Body of the empty config blob every index manifest references.
pub const EMPTY_CONFIG: &[u8] = b"{}";

/// Builds the manifest that binds an index blob to the index tag.
///
/// # Examples
///
/// ```
/// use libmanifesto::digest::compute_digest;
/// use libmanifesto::oci::{index_layer, index_manifest};
///
/// let body = br#"{"images":[]}"#;
/// let digest = compute_digest(body);
/// let manifest = index_manifest(&digest, body.len() as u64).unwrap();
/// assert_eq!(index_layer(&manifest).unwrap().0, digest);
/// ```
pub fn index_manifest(index_digest: &str, index_size: u64) -> Result<ImageManifest> {
    let config = DescriptorBuilder::default()
        .media_type(MediaType::EmptyJSON)
        .digest(parse_digest(&compute_digest(EMPTY_CONFIG))?)
        .size(EMPTY_CONFIG.len() as u64)
        .build()
        .map_err(|e| ManifestoError::validation_with_source("Failed to build config descriptor", e))?;

    let layer = DescriptorBuilder::default()
        .media_type(MediaType::Other(INDEX_MEDIA_TYPE.to_string()))
        .digest(parse_digest(index_digest)?)
        .size(index_size)
        .build()
        .map_err(|e| ManifestoError::validation_with_source("Failed to build index descriptor", e))?;

    ImageManifestBuilder::default()
        .schema_version(2u32)
        .media_type(MediaType::ImageManifest)
        .config(config)
        .layers(vec![layer])
        .build()
        .map_err(|e| ManifestoError::validation_with_source("Failed to build index manifest", e))
}

/// Serializes a manifest to the JSON sent to the registry.
pub fn manifest_to_vec(manifest: &ImageManifest) -> Result<Vec<u8>> {
    serde_json::to_vec(manifest)
        .map_err(|e| ManifestoError::validation_with_source("Failed to serialize manifest", e))
}

/// Parses manifest bytes returned by the registry.
pub fn manifest_from_slice(bytes: &[u8]) -> Result<ImageManifest> {
    serde_json::from_slice(bytes)
        .map_err(|e| ManifestoError::validation_with_source("Failed to parse image manifest", e))
}

/// Returns the digest and size of the index layer, if the manifest has one.
pub fn index_layer(manifest: &ImageManifest) -> Option<(String, u64)> {
    manifest
        .layers()
        .iter()
        .find(|layer| layer.media_type().to_string() == INDEX_MEDIA_TYPE)
        .map(|layer| (layer.digest().to_string(), layer.size()))
}

fn parse_digest(digest: &str) -> Result<OciDigest> {
    OciDigest::from_str(digest).map_err(|e| {
        ManifestoError::validation_with_source(format!("Invalid digest '{}'", digest), e)
    })
}
