//! Error types for manifesto
//!
//! Every failure raised by the registry client, the metadata index and the
//! storage layer is expressed as a [`ManifestoError`]. Errors carry the
//! operation they belong to so callers can report them without extra context.

use thiserror::Error;


/// Main error type for manifesto operations
#[derive(Error, Debug)]
pub enum ManifestoError {
    /// The `WWW-Authenticate` header did not match the challenge grammar
    #[error("Invalid WWW-Authenticate header '{header}': {message}")]
    AuthChallengeParse { header: String, message: String },

    /// The token endpoint was unreachable or returned an unusable answer
    #[error("Failed to obtain registry token: {message}")]
    AuthToken {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Network-related errors (connection, timeout, DNS)
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A response status outside the set required by the operation
    #[error("Unexpected status {status} during {operation}")]
    UnexpectedStatus { operation: String, status: u16 },

    /// Validation errors (bad digest, malformed documents, digest mismatch)
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration errors (invalid config file, unknown backend)
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<String>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The image digest could not be resolved for a reference
    #[error("Image '{image}' not found: {message}")]
    Resolution { image: String, message: String },

    /// Local filesystem errors
    #[error("{message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for manifesto operations
pub type Result<T> = std::result::Result<T, ManifestoError>;

impl ManifestoError {
    /// Creates a new challenge parse error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libmanifesto::error::ManifestoError;
    ///
    /// let err = ManifestoError::auth_challenge("Bearer", "missing realm");
    /// assert!(matches!(err, ManifestoError::AuthChallengeParse { .. }));
    /// ```
    pub fn auth_challenge<H: Into<String>, S: Into<String>>(header: H, message: S) -> Self {
        Self::AuthChallengeParse {
            header: header.into(),
            message: message.into(),
        }
    }

    /// Creates a new token error.
    pub fn auth_token<S: Into<String>>(message: S) -> Self {
        Self::AuthToken {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new token error with a source error.
    pub fn auth_token_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::AuthToken {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new transport error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libmanifesto::error::ManifestoError;
    ///
    /// let err = ManifestoError::transport("connection refused");
    /// assert!(matches!(err, ManifestoError::Transport { .. }));
    /// ```
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new transport error with a source error.
    pub fn transport_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new unexpected status error naming the failed operation.
    ///
    /// # Examples
    ///
    /// ```
    /// use libmanifesto::error::ManifestoError;
    ///
    /// let err = ManifestoError::unexpected_status("complete blob upload", 400);
    /// assert_eq!(err.to_string(), "Unexpected status 400 during complete blob upload");
    /// ```
    pub fn unexpected_status<S: Into<String>>(operation: S, status: u16) -> Self {
        Self::UnexpectedStatus {
            operation: operation.into(),
            status,
        }
    }

    /// Creates a new validation error.
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new validation error with a source error.
    pub fn validation_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Validation {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(message: S, path: Option<S>) -> Self {
        Self::Config {
            message: message.into(),
            path: path.map(|p| p.into()),
            source: None,
        }
    }

    /// Creates a new configuration error with a source error.
    pub fn config_with_source<S, E>(message: S, path: Option<S>, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Config {
            message: message.into(),
            path: path.map(|p| p.into()),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new resolution error for an image reference.
    pub fn resolution<I: Into<String>, S: Into<String>>(image: I, message: S) -> Self {
        Self::Resolution {
            image: image.into(),
            message: message.into(),
        }
    }

    /// Wraps a filesystem error with a description of what was attempted.
    pub fn io<S: Into<String>>(message: S, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }
}

impl From<config::ConfigError> for ManifestoError {
    fn from(err: config::ConfigError) -> Self {
        Self::config_with_source("Failed to build configuration", None, err)
    }
}
