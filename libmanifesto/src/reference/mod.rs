//! Image reference parsing.
//!
//! A reference names a registry host, a repository and a tag and/or digest:
//! `[host/]component[/component]*[:tag][@digest]`. Parsing never fails;
//! missing parts are filled with defaults.

use std::fmt;


/// Registry used when the reference does not name a host.
pub const DEFAULT_REGISTRY: &str = "registry-1.docker.io";

/// Tag used when the reference does not carry one.
pub const DEFAULT_TAG: &str = "latest";

/// Tag under which each repository's metadata index is published.
pub const INDEX_TAG: &str = "_manifesto";

/// A parsed image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Registry host, e.g. `quay.io` or `localhost:5000`
    pub registry_host: String,
    /// Repository path, prefixed with the host unless it is the default registry
    pub repo_path: String,
    /// Repository path without any host
    pub repo_path_no_host: String,
    /// Tag, `latest` when absent
    pub tag: String,
    /// Digest following `@`, if any
    pub digest: Option<String>,
}

impl Reference {
    /// Parses a reference string.
    ///
    /// # Examples
    ///
    /// ```
    /// use libmanifesto::reference::Reference;
    ///
    /// let reference = Reference::parse("quay.io/acme/widget:v2");
    /// assert_eq!(reference.registry_host, "quay.io");
    /// assert_eq!(reference.repo_path, "quay.io/acme/widget");
    /// assert_eq!(reference.repo_path_no_host, "acme/widget");
    /// assert_eq!(reference.tag, "v2");
    /// assert_eq!(reference.digest, None);
    /// ```
    pub fn parse(name: &str) -> Self {
        let (name, digest) = match name.split_once('@') {
            Some((name, digest)) => (name, Some(digest.to_string())),
            None => (name, None),
        };

        // More than two components means the first one is a host; the host may
        // contain ':' so it is split off before looking for the tag.
        let components: Vec<&str> = name.split('/').collect();
        let (registry_host, host_prefix, path) = if components.len() > 2 {
            let host = components[0];
            (host.to_string(), format!("{}/", host), components[1..].join("/"))
        } else {
            (DEFAULT_REGISTRY.to_string(), String::new(), name.to_string())
        };

        let (parent, last) = match path.rsplit_once('/') {
            Some((parent, last)) => (format!("{}/", parent), last),
            None => (String::new(), path.as_str()),
        };

        let (repo_name, tag) = match last.split_once(':') {
            Some((repo_name, tag)) => (repo_name, tag.to_string()),
            None => (last, DEFAULT_TAG.to_string()),
        };

        let repo_path_no_host = format!("{}{}", parent, repo_name);

        Self {
            registry_host,
            repo_path: format!("{}{}", host_prefix, repo_path_no_host),
            repo_path_no_host,
            tag,
            digest,
        }
    }

    /// Returns `repo_path:tag`, the name reported back to users.
    pub fn image_name(&self) -> String {
        format!("{}:{}", self.repo_path, self.tag)
    }

    /// Returns the digest if the reference carried one.
    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }

    /// Returns the reference of this repository's metadata index.
    ///
    /// # Examples
    ///
    /// ```
    /// use libmanifesto::reference::Reference;
    ///
    /// let index = Reference::parse("acme/widget@sha256:abc").index_reference();
    /// assert_eq!(index.image_name(), "acme/widget:_manifesto");
    /// assert!(index.digest().is_none());
    /// ```
    pub fn index_reference(&self) -> Self {
        Self {
            tag: INDEX_TAG.to_string(),
            digest: None,
            ..self.clone()
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.image_name())?;
        if let Some(digest) = &self.digest {
            write!(f, "@{}", digest)?;
        }
        Ok(())
    }
}

impl From<&str> for Reference {
    fn from(name: &str) -> Self {
        Self::parse(name)
    }
}
