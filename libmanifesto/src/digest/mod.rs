//! Content digests.
//!
//! Blobs are addressed by `sha256:` followed by 64 lowercase hex characters,
//! computed over the full in-memory payload.

use crate::error::{ManifestoError, Result};
use sha2::{Digest as Sha2Digest, Sha256};
use std::fmt;
use std::str::FromStr;


/// Algorithm prefix of every digest produced by this crate.
pub const SHA256_PREFIX: &str = "sha256:";

const SHA256_HEX_LEN: usize = 64;

/// Computes the `sha256:<hex>` digest of `data`.
///
/// # Examples
///
/// ```
/// use libmanifesto::digest::compute_digest;
///
/// let digest = compute_digest(b"");
/// assert_eq!(
///     digest,
///     "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// ```
pub fn compute_digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{}{:x}", SHA256_PREFIX, hasher.finalize())
}

/// A validated sha256 content digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Digest(String);

impl Digest {
    /// Digest of `data`.
    pub fn of(data: &[u8]) -> Self {
        Self(compute_digest(data))
    }

    /// The algorithm part, always `sha256`.
    pub fn algorithm(&self) -> &str {
        "sha256"
    }

    /// The hex-encoded hash without the algorithm prefix.
    pub fn hex(&self) -> &str {
        &self.0[SHA256_PREFIX.len()..]
    }

    /// Returns true if `data` hashes to this digest.
    pub fn matches(&self, data: &[u8]) -> bool {
        compute_digest(data) == self.0
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Digest {
    type Err = ManifestoError;

    fn from_str(s: &str) -> Result<Self> {
        let hex = s.strip_prefix(SHA256_PREFIX).ok_or_else(|| {
            ManifestoError::validation(format!("Invalid digest format: '{}' is not sha256", s))
        })?;

        let well_formed = hex.len() == SHA256_HEX_LEN
            && hex
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !well_formed {
            return Err(ManifestoError::validation(format!(
                "Invalid digest format: '{}' must be sha256 followed by 64 lowercase hex characters",
                s
            )));
        }

        Ok(Self(s.to_string()))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
