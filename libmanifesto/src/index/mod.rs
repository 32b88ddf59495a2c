//! The metadata index document.
//!
//! One index lives in each repository, published under the index tag. It maps
//! image digests to the metadata blobs stored for them:
//!
//! ```json
//! {"images": [{"image_digest": "sha256:...", "manifesto": [{"type": "scan", "digest": "sha256:..."}]}]}
//! ```

use crate::error::{ManifestoError, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;


/// One metadata blob attached to an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    /// Metadata type, e.g. `scan` or `contacts`
    #[serde(rename = "type")]
    pub metadata_type: String,
    /// Digest of the blob holding the metadata
    pub digest: String,
}

/// All metadata entries of one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub image_digest: String,
    #[serde(rename = "manifesto", default)]
    pub entries: Vec<MetadataEntry>,
}

/// What [`MetadataIndex::put`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// An entry of the same type was overwritten
    Replaced,
    /// The type was appended to an existing image record
    Added,
    /// A record was created for the image
    NewImage,
}

/// Index of every image's metadata in one repository.
///
/// Holds at most one entry per (image digest, type) pair as long as it is
/// only mutated through [`MetadataIndex::put`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataIndex {
    #[serde(default)]
    pub images: Vec<ImageMetadata>,
}

/// Stand-in for documents that are not a JSON object with `images`.
#[derive(Deserialize)]
struct RawIndex {
    images: Vec<ImageMetadata>,
}

impl MetadataIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an index document.
    ///
    /// Parsing is lenient: bytes that are not a well-formed index, such as the
    /// older tag-keyed layout, yield an empty index.
    ///
    /// # Examples
    ///
    /// ```
    /// use libmanifesto::index::MetadataIndex;
    ///
    /// let index = MetadataIndex::from_slice(br#"{"images":[{"image_digest":"sha256:aa","manifesto":[{"type":"scan","digest":"sha256:bb"}]}]}"#);
    /// assert_eq!(index.list("sha256:aa"), vec!["scan"]);
    ///
    /// assert!(MetadataIndex::from_slice(b"not json").is_empty());
    /// ```
    pub fn from_slice(bytes: &[u8]) -> Self {
        match serde_json::from_slice::<RawIndex>(bytes) {
            Ok(raw) => Self { images: raw.images },
            Err(e) => {
                warn!(error = %e, "unreadable metadata index, starting from an empty one");
                Self::new()
            }
        }
    }

    /// Serializes the index document.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| ManifestoError::validation_with_source("Failed to serialize index", e))
    }

    /// Returns true if no image has a record.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Returns the first entry of `metadata_type` for the image.
    pub fn get(&self, image_digest: &str, metadata_type: &str) -> Option<&MetadataEntry> {
        self.image(image_digest)?
            .entries
            .iter()
            .find(|entry| entry.metadata_type == metadata_type)
    }

    /// Lists the metadata types stored for the image, in insertion order.
    pub fn list(&self, image_digest: &str) -> Vec<String> {
        self.image(image_digest)
            .map(|image| {
                image
                    .entries
                    .iter()
                    .map(|entry| entry.metadata_type.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Records `digest` as the image's `metadata_type` blob.
    ///
    /// Replaces the first entry of that type, else appends to the image's
    /// record, else appends a new record.
    pub fn put(&mut self, image_digest: &str, metadata_type: &str, digest: &str) -> PutOutcome {
        let entry = MetadataEntry {
            metadata_type: metadata_type.to_string(),
            digest: digest.to_string(),
        };

        let Some(image) = self
            .images
            .iter_mut()
            .find(|image| image.image_digest == image_digest)
        else {
            self.images.push(ImageMetadata {
                image_digest: image_digest.to_string(),
                entries: vec![entry],
            });
            return PutOutcome::NewImage;
        };

        match image
            .entries
            .iter_mut()
            .find(|existing| existing.metadata_type == metadata_type)
        {
            Some(existing) => {
                *existing = entry;
                PutOutcome::Replaced
            }
            None => {
                image.entries.push(entry);
                PutOutcome::Added
            }
        }
    }

    fn image(&self, image_digest: &str) -> Option<&ImageMetadata> {
        self.images
            .iter()
            .find(|image| image.image_digest == image_digest)
    }
}
