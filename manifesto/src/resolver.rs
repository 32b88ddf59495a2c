//! Image digest lookup through the local docker installation

use libmanifesto::config::ResolverSettings;
use libmanifesto::digest::Digest;
use libmanifesto::{ImageResolver, ManifestoError, Result};
use std::process::Command;
use std::str::FromStr;
use tracing::{debug, warn};

/// Resolves images by pulling them and reading their repo digests
#[derive(Debug, Clone)]
pub struct DockerResolver {
    program: String,
    pull: bool,
}

impl Default for DockerResolver {
    fn default() -> Self {
        Self {
            program: "docker".to_string(),
            pull: true,
        }
    }
}

impl DockerResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a resolver from the `resolver` configuration section
    pub fn from_settings(settings: &ResolverSettings) -> Self {
        let resolver = Self::new().with_program(settings.program.clone());
        if settings.pull {
            resolver
        } else {
            resolver.without_pull()
        }
    }

    /// Use another docker-compatible executable (e.g. `podman`)
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Skip `pull` and trust the local image store
    pub fn without_pull(mut self) -> Self {
        self.pull = false;
        self
    }
}

impl ImageResolver for DockerResolver {
    fn resolve_digest(&self, reference: &str) -> Result<String> {
        if self.pull {
            // A failed pull still leaves a usable local copy in many cases.
            match Command::new(&self.program).args(["pull", "-q", reference]).output() {
                Ok(output) if output.status.success() => debug!(reference, "pulled image"),
                Ok(output) => warn!(
                    reference,
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "image pull failed"
                ),
                Err(e) => warn!(reference, error = %e, "could not run image pull"),
            }
        }

        let output = Command::new(&self.program)
            .args(["inspect", "--format", "{{json .RepoDigests}}", reference])
            .output()
            .map_err(|e| ManifestoError::io(format!("Failed to run {}", self.program), e))?;

        if !output.status.success() {
            return Err(ManifestoError::resolution(
                reference,
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        digest_from_repo_digests(reference, &output.stdout)
    }
}

/// Picks the digest out of `inspect`'s JSON list of `repo@digest` entries.
///
/// The entry for the reference's own repository wins; otherwise the first one
/// is used.
pub fn digest_from_repo_digests(reference: &str, output: &[u8]) -> Result<String> {
    let entries: Vec<String> = serde_json::from_slice(output).map_err(|_| {
        ManifestoError::resolution(
            reference,
            format!("unexpected inspect output '{}'", String::from_utf8_lossy(output).trim()),
        )
    })?;

    let repository = repository_of(reference);
    let entry = entries
        .iter()
        .find(|entry| entry.split_once('@').is_some_and(|(repo, _)| repo == repository))
        .or_else(|| entries.first())
        .ok_or_else(|| ManifestoError::resolution(reference, "image has no repo digest"))?;

    let (_, digest) = entry
        .split_once('@')
        .ok_or_else(|| ManifestoError::resolution(reference, format!("digest not found in '{}'", entry)))?;

    Digest::from_str(digest).map(|d| d.to_string())
}

/// Strips the tag or digest from a reference.
fn repository_of(reference: &str) -> &str {
    let name = reference.split_once('@').map_or(reference, |(name, _)| name);
    match name.rsplit_once(':') {
        Some((repo, tag)) if !tag.contains('/') => repo,
        _ => name,
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
