//! Application configuration.
//!
//! This module manages configuration with sensible defaults, loading from a
//! YAML file and merging with environment variables.

use crate::error::{ManifestoError, Result};
use config::{Config as ConfigRs, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;


/// Name of the configuration file looked up in the working and home directories.
pub const CONFIG_FILE_NAME: &str = ".manifesto.yaml";

pub const ENV_USERNAME: &str = "REGISTRY_USERNAME";
pub const ENV_PASSWORD: &str = "REGISTRY_PASSWORD";
pub const ENV_STORAGE: &str = "MANIFESTO_STORAGE";
pub const ENV_VERBOSE: &str = "MANIFESTO_VERBOSE";
pub const ENV_INSECURE: &str = "MANIFESTO_INSECURE";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageBackend,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub network: Network,
    #[serde(default)]
    pub registry: RegistrySettings,
    #[serde(default)]
    pub resolver: ResolverSettings,
}

impl Config {
    /// Parses a `Config` from a YAML string.
    ///
    /// This function is primarily used for testing.
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let builder = ConfigRs::builder()
            // Add default values
            .add_source(ConfigRs::try_from(&Config::default())?)
            // Merge with YAML string
            .add_source(File::from_str(s, FileFormat::Yaml));

        Self::from_builder(builder)
    }

    /// Loads a `Config` from an optional file path.
    ///
    /// An explicit path must exist. Without one, the first of
    /// [`default_paths`] that exists is used; if none does, the defaults are
    /// returned.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ConfigRs::builder()
            // Add default values
            .add_source(ConfigRs::try_from(&Config::default())?);

        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ManifestoError::config(
                        "Configuration file not found".to_string(),
                        Some(p.display().to_string()),
                    ));
                }
                builder = builder.add_source(File::from(p).format(FileFormat::Yaml));
            }
            None => {
                if let Some(p) = default_paths().into_iter().find(|p| p.exists()) {
                    builder = builder.add_source(File::from(p).format(FileFormat::Yaml));
                }
            }
        }

        Self::from_builder(builder)
    }

    /// Overrides settings with values from the environment.
    ///
    /// `lookup` returns the value of a variable; pass
    /// `|key| std::env::var(key).ok()` for the process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(username) = lookup(ENV_USERNAME) {
            self.registry.username = Some(username);
        }
        if let Some(password) = lookup(ENV_PASSWORD) {
            self.registry.password = Some(password);
        }
        if let Some(storage) = lookup(ENV_STORAGE) {
            self.storage = storage.parse()?;
        }
        if let Some(verbose) = lookup(ENV_VERBOSE) {
            self.verbose = parse_flag(ENV_VERBOSE, &verbose)?;
        }
        if let Some(insecure) = lookup(ENV_INSECURE) {
            self.registry.insecure = parse_flag(ENV_INSECURE, &insecure)?;
        }
        Ok(())
    }

    /// Creates a `Config` from a `config::ConfigBuilder`.
    fn from_builder(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        builder
            .build()
            .and_then(|cfg| cfg.try_deserialize())
            .map_err(|e| {
                ManifestoError::config_with_source(
                    "Failed to deserialize configuration",
                    None,
                    e,
                )
            })
    }
}

/// Configuration files considered when none is given explicitly, in order.
pub fn default_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(CONFIG_FILE_NAME));
    }
    paths
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ManifestoError::config(
            format!("Invalid value '{}' for {}: expected true or false", other, key),
            None,
        )),
    }
}

/// Where metadata is kept.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// In the registry hosting the image
    #[default]
    Registry,
}

impl FromStr for StorageBackend {
    type Err = ManifestoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "registry" => Ok(Self::Registry),
            "grafeas" => Err(ManifestoError::config(
                "Storage backend 'grafeas' is not supported".to_string(),
                None,
            )),
            other => Err(ManifestoError::config(
                format!("Unknown storage backend '{}'", other),
                None,
            )),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registry => f.write_str("registry"),
        }
    }
}

/// Network settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Network {
    /// Per-request timeout in seconds
    #[serde(default = "default_network_timeout")]
    pub timeout: u64,
}

impl Default for Network {
    fn default() -> Self {
        Self {
            timeout: default_network_timeout(),
        }
    }
}

fn default_network_timeout() -> u64 {
    10
}

/// Registry access settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RegistrySettings {
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Talk plain HTTP to registries
    #[serde(default)]
    pub insecure: bool,
}

/// How the CLI looks up image digests through the local container runtime.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolverSettings {
    /// Docker-compatible executable (e.g. `podman`)
    #[serde(default = "default_resolver_program")]
    pub program: String,

    /// Pull the image before inspecting it
    #[serde(default = "default_true")]
    pub pull: bool,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            program: default_resolver_program(),
            pull: true,
        }
    }
}

fn default_resolver_program() -> String {
    "docker".to_string()
}

fn default_true() -> bool {
    true
}
