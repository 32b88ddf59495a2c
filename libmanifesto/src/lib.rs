//! Manifesto - image metadata stored alongside the image
//!
//! Manifesto attaches named, opaque metadata blobs (vulnerability scans,
//! contacts, approvals, ...) to a container image identified by its content
//! digest, and keeps them in the registry that hosts the image.
//!
//! # Quick Start
//!
//! ```no_run
//! use libmanifesto::Manifesto;
//! use libmanifesto::resolver::StaticResolver;
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let image = "localhost:5000/acme/widget:v1";
//!     let resolver = StaticResolver::new().with_image(
//!         image,
//!         "sha256:2c26b46b68ffc68ff99b453c1d30413413422d706483bfa0f98a5e886266e7ae",
//!     );
//!     let manifesto = Manifesto::builder().resolver(resolver).build()?;
//!
//!     // Attach a scan report to the image
//!     manifesto.put(image, "scan", Path::new("scan.json"))?;
//!
//!     // Read it back
//!     if let (Some(report), _) = manifesto.get(image, "scan")? {
//!         println!("{}", String::from_utf8_lossy(&report));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`reference`] parses image names into host, repository, tag and digest
//! - [`auth`] holds the challenge/token state machine
//! - [`client`] is the blocking HTTP transport driving that state machine
//! - [`registry`] uploads and downloads content-addressed blobs
//! - [`index`] is the per-repository document mapping image digests to blobs
//! - [`storage`] ties the above into [`storage::MetadataStorage`]
//!
//! Resolving a tag to the digest it currently designates is delegated to an
//! [`resolver::ImageResolver`] supplied by the caller.

#![warn(clippy::all)]

/// Returns the libmanifesto crate version.
///
/// # Examples
///
/// ```
/// let version = libmanifesto::version();
/// assert!(!version.is_empty());
/// ```
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// High-level public API (main entry point)
mod manifesto;
pub use manifesto::{Manifesto, ManifestoBuilder};

// Re-export commonly used types for convenience
pub use auth::Credentials;
pub use config::Config;
pub use digest::Digest;
pub use error::{ManifestoError, Result};
pub use index::MetadataIndex;
pub use reference::Reference;
pub use resolver::ImageResolver;
pub use storage::MetadataStorage;

pub mod auth;
pub mod client;
pub mod config;
pub mod digest;
pub mod error;
pub mod index;
pub mod oci;
pub mod reference;
pub mod registry;
pub mod resolver;
pub mod storage;
