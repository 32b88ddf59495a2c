//! Application context that holds resolved configuration
//!
//! The context is built following the precedence order:
//! 1. Default values
//! 2. Config file values
//! 3. Environment variables
//! 4. CLI flags
//!
//! Once built, the context is passed as read-only throughout the application.

use crate::format::ColorChoice;
use libmanifesto::config::Config;
use libmanifesto::{Credentials, Result};
use std::env;
use std::path::PathBuf;

/// How much diagnostic output to produce
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum VerbosityLevel {
    /// Warnings and errors only
    #[default]
    Normal,
    /// `-v`: progress of each step
    Verbose,
    /// `-vv`: every registry request
    VeryVerbose,
    /// `-vvv`: everything, including dependencies
    Trace,
}

impl VerbosityLevel {
    /// Maps the number of `-v` flags to a level
    pub fn from_count(count: u8) -> Self {
        match count {
            0 => VerbosityLevel::Normal,
            1 => VerbosityLevel::Verbose,
            2 => VerbosityLevel::VeryVerbose,
            _ => VerbosityLevel::Trace,
        }
    }

    /// Default `tracing` filter directive for this level
    pub fn filter_directive(self) -> &'static str {
        match self {
            VerbosityLevel::Normal => "warn",
            VerbosityLevel::Verbose => "warn,libmanifesto=info,manifesto=info",
            VerbosityLevel::VeryVerbose => "warn,libmanifesto=debug,manifesto=debug",
            VerbosityLevel::Trace => "debug",
        }
    }
}

/// Global options given on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub username: Option<String>,
    pub password: Option<String>,
    pub storage: Option<String>,
    pub config_path: Option<PathBuf>,
    pub insecure: bool,
    pub no_pull: bool,
    pub verbose: u8,
    pub color: ColorChoice,
}

/// Application context with resolved configuration and runtime state
#[derive(Debug, Clone)]
pub struct AppContext {
    /// Resolved configuration
    pub config: Config,
    /// Resolved color choice
    pub color: ColorChoice,
    /// Resolved verbosity
    pub verbosity: VerbosityLevel,
}

impl AppContext {
    /// Build context with precedence: defaults > config file > env vars > CLI flags
    pub fn build(overrides: &CliOverrides) -> Result<Self> {
        Self::build_with_env(overrides, |key| env::var(key).ok())
    }

    /// Same as [`AppContext::build`], reading the environment through `lookup`
    pub fn build_with_env<F>(overrides: &CliOverrides, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // 1 + 2. Defaults merged with the config file, if any
        let mut config = Config::load(overrides.config_path.as_deref())?;

        // 3. Environment variable overrides
        config.apply_env(&lookup)?;

        // 4. CLI flag overrides (highest priority)
        if let Some(username) = &overrides.username {
            config.registry.username = Some(username.clone());
        }
        if let Some(password) = &overrides.password {
            config.registry.password = Some(password.clone());
        }
        if let Some(storage) = &overrides.storage {
            config.storage = storage.parse()?;
        }
        if overrides.insecure {
            config.registry.insecure = true;
        }
        if overrides.no_pull {
            config.resolver.pull = false;
        }

        let mut verbosity = VerbosityLevel::from_count(overrides.verbose);
        if config.verbose && verbosity == VerbosityLevel::Normal {
            verbosity = VerbosityLevel::Verbose;
        }

        Ok(Self {
            config,
            color: overrides.color,
            verbosity,
        })
    }

    /// Registry credentials, prompting for a missing password.
    ///
    /// The prompt only happens when a username is configured without a
    /// password.
    pub fn credentials(&self) -> std::result::Result<Credentials, String> {
        let registry = &self.config.registry;
        match (registry.username.as_deref(), registry.password.as_deref()) {
            (Some(username), None) if !username.is_empty() => {
                let password = rpassword::prompt_password(format!("Password for {}: ", username))
                    .map_err(|e| format!("Failed to read password: {}", e))?;
                Ok(Credentials::basic(username, password))
            }
            (username, password) => Ok(Credentials::from_parts(username, password)),
        }
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
