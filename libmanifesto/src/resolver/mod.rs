//! Resolving image references to content digests.
//!
//! Looking up the digest an image name currently points at is left to an
//! [`ImageResolver`]. The library ships [`StaticResolver`]; the CLI plugs in a
//! resolver backed by the local container runtime.

use crate::error::{ManifestoError, Result};
use std::collections::HashMap;

#[cfg(test)]
mod tests;

/// Resolves a human-readable image reference to its content digest.
pub trait ImageResolver {
    /// Returns the `sha256:` digest of `reference`.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestoError::Resolution`] when the image cannot be found.
    fn resolve_digest(&self, reference: &str) -> Result<String>;
}

impl<R: ImageResolver + ?Sized> ImageResolver for Box<R> {
    fn resolve_digest(&self, reference: &str) -> Result<String> {
        (**self).resolve_digest(reference)
    }
}

/// Resolver answering from a fixed table.
///
/// # Examples
///
/// ```
/// use libmanifesto::resolver::{ImageResolver, StaticResolver};
///
/// let resolver = StaticResolver::new().with_image("acme/widget:v1", "sha256:abc");
/// assert_eq!(resolver.resolve_digest("acme/widget:v1").unwrap(), "sha256:abc");
/// assert!(resolver.resolve_digest("acme/widget:v2").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    digests: HashMap<String, String>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a reference/digest pair.
    pub fn with_image(mut self, reference: impl Into<String>, digest: impl Into<String>) -> Self {
        self.digests.insert(reference.into(), digest.into());
        self
    }
}

impl ImageResolver for StaticResolver {
    fn resolve_digest(&self, reference: &str) -> Result<String> {
        self.digests
            .get(reference)
            .cloned()
            .ok_or_else(|| ManifestoError::resolution(reference, "no digest known for this image"))
    }
}
