//! Authentication handling for registries.
//!
//! Registries answer unauthenticated or under-scoped requests with `401` and a
//! `WWW-Authenticate` challenge. The [`AuthNegotiator`] turns those challenges
//! into bearer tokens, caches the tokens by scope for the lifetime of one
//! client, and decides which `Authorization` header each attempt carries.
//!
//! The negotiator only holds state; the HTTP round trips are driven by
//! [`crate::client::Client`].

use crate::error::{ManifestoError, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use url::Url;


/// Credentials for registry authentication.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Credentials {
    /// No authentication (anonymous access)
    #[default]
    Anonymous,

    /// HTTP Basic authentication with username and password
    Basic {
        /// Username for authentication
        username: String,
        /// Password for authentication
        password: String,
    },
}

impl Credentials {
    /// Creates anonymous credentials.
    pub fn anonymous() -> Self {
        Self::Anonymous
    }

    /// Creates Basic authentication credentials.
    ///
    /// # Examples
    ///
    /// ```
    /// use libmanifesto::auth::Credentials;
    ///
    /// let creds = Credentials::basic("username", "password");
    /// assert!(creds.to_header_value().unwrap().starts_with("Basic "));
    /// ```
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Builds credentials from an optional username/password pair.
    ///
    /// An empty or missing username means anonymous access.
    pub fn from_parts(username: Option<&str>, password: Option<&str>) -> Self {
        match username {
            Some(user) if !user.is_empty() => Self::basic(user, password.unwrap_or_default()),
            _ => Self::Anonymous,
        }
    }

    /// Returns the Basic Authorization header value for these credentials.
    pub fn to_header_value(&self) -> Option<String> {
        match self {
            Self::Anonymous => None,
            Self::Basic { username, password } => {
                use base64::{Engine as _, engine::general_purpose};
                let credentials = format!("{}:{}", username, password);
                let encoded = general_purpose::STANDARD.encode(credentials);
                Some(format!("Basic {}", encoded))
            }
        }
    }
}

/// Information parsed from a WWW-Authenticate header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChallenge {
    /// The authentication scheme (e.g., "Bearer")
    pub scheme: String,

    /// The authentication realm; the token endpoint for Bearer challenges
    pub realm: String,

    /// Every parameter after the realm (service, scope, ...)
    pub params: BTreeMap<String, String>,
}

impl AuthChallenge {
    /// Parses a WWW-Authenticate header value of the form
    /// `scheme realm="realm"(,key="value")*`.
    ///
    /// # Examples
    ///
    /// ```
    /// use libmanifesto::auth::AuthChallenge;
    ///
    /// let header = r#"Bearer realm="https://auth.example.com/token",service="registry""#;
    /// let challenge = AuthChallenge::parse(header).unwrap();
    /// assert_eq!(challenge.scheme, "Bearer");
    /// assert_eq!(challenge.params["service"], "registry");
    /// ```
    pub fn parse(header: &str) -> Result<Self> {
        let malformed = |message: &str| ManifestoError::auth_challenge(header, message);

        let (scheme, rest) = header
            .trim()
            .split_once(' ')
            .ok_or_else(|| malformed("expected '<scheme> realm=\"...\"'"))?;

        if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(malformed("invalid scheme"));
        }

        let rest = rest
            .trim_start()
            .strip_prefix("realm=\"")
            .ok_or_else(|| malformed("missing realm"))?;
        let (realm, mut rest) = rest
            .split_once('"')
            .ok_or_else(|| malformed("unterminated realm"))?;
        if realm.is_empty() {
            return Err(malformed("empty realm"));
        }

        let mut params = BTreeMap::new();
        while !rest.trim().is_empty() {
            let param = rest
                .strip_prefix(',')
                .ok_or_else(|| malformed("parameters must be comma separated"))?;
            let (key, value_and_rest) = param
                .split_once("=\"")
                .ok_or_else(|| malformed("parameter without quoted value"))?;
            let (value, remaining) = value_and_rest
                .split_once('"')
                .ok_or_else(|| malformed("unterminated parameter value"))?;

            let key = key.trim();
            if key.is_empty() {
                return Err(malformed("empty parameter name"));
            }
            params.insert(key.to_string(), value.to_string());
            rest = remaining;
        }

        Ok(Self {
            scheme: scheme.to_string(),
            realm: realm.to_string(),
            params,
        })
    }

    /// The `scope` parameter, if present.
    pub fn scope(&self) -> Option<&str> {
        self.params.get("scope").map(String::as_str)
    }

    /// Returns true for challenges answered with a token endpoint.
    pub fn is_bearer(&self) -> bool {
        self.scheme.eq_ignore_ascii_case("bearer")
    }

    /// Builds the token endpoint URL: the realm with every challenge
    /// parameter appended to its query string.
    pub fn token_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.realm).map_err(|e| {
            ManifestoError::auth_token_with_source(
                format!("realm '{}' is not a valid URL", self.realm),
                e,
            )
        })?;
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in &self.params {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

/// Body returned by a token endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

impl TokenResponse {
    /// Parses a token endpoint body, rejecting empty tokens.
    pub fn from_slice(body: &[u8]) -> Result<String> {
        let response: TokenResponse = serde_json::from_slice(body).map_err(|e| {
            ManifestoError::auth_token_with_source("malformed token response", e)
        })?;
        if response.token.is_empty() {
            return Err(ManifestoError::auth_token("token response carried an empty token"));
        }
        Ok(response.token)
    }
}

/// Bearer tokens keyed by scope. Last write wins; never persisted.
#[derive(Debug, Clone, Default)]
pub struct TokenCache {
    tokens: HashMap<String, String>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, scope: &str) -> Option<&str> {
        self.tokens.get(scope).map(String::as_str)
    }

    pub fn insert(&mut self, scope: impl Into<String>, token: impl Into<String>) {
        self.tokens.insert(scope.into(), token.into());
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Authentication mode of one client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// Requests go out without an Authorization header
    NoAuth,
    /// Basic credentials are sent with every request
    Basic,
    /// A token is cached for `scope` and sent with every request
    BearerCached { scope: String },
    /// A new token for `scope` is being acquired
    BearerRefreshing { scope: String },
}

/// Scope-aware challenge/token state machine for one client instance.
///
/// Not synchronized: one negotiator serves strictly sequential calls.
#[derive(Debug, Clone)]
pub struct AuthNegotiator {
    credentials: Credentials,
    state: AuthState,
    tokens: TokenCache,
}

impl AuthNegotiator {
    /// Creates a negotiator; configured Basic credentials start in `Basic`.
    pub fn new(credentials: Credentials) -> Self {
        let state = match credentials {
            Credentials::Anonymous => AuthState::NoAuth,
            Credentials::Basic { .. } => AuthState::Basic,
        };
        Self {
            credentials,
            state,
            tokens: TokenCache::new(),
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn tokens(&self) -> &TokenCache {
        &self.tokens
    }

    /// Authorization header for the first attempt of a call.
    pub fn authorization(&self) -> Option<String> {
        match &self.state {
            AuthState::NoAuth | AuthState::BearerRefreshing { .. } => None,
            AuthState::Basic => self.credentials.to_header_value(),
            AuthState::BearerCached { scope } => self.tokens.get(scope).map(bearer),
        }
    }

    /// Authorization header for a retry with a token already cached for the
    /// challenge's scope. Returns `None` when no such token exists or when it
    /// is the one the rejected attempt already carried: the skip only avoids
    /// re-sending a request identical to the one just rejected, and the call
    /// moves on to a fresh token.
    pub fn cached_retry(&self, challenge: &AuthChallenge, sent: Option<&str>) -> Option<String> {
        let header = self.tokens.get(challenge.scope().unwrap_or_default()).map(bearer)?;
        if sent == Some(header.as_str()) {
            return None;
        }
        Some(header)
    }

    /// Records that a cached token satisfied the challenge's scope.
    pub fn confirm_cached(&mut self, challenge: &AuthChallenge) {
        self.state = AuthState::BearerCached {
            scope: challenge.scope().unwrap_or_default().to_string(),
        };
    }

    /// Enters `BearerRefreshing` and returns the state to restore on failure.
    pub fn begin_refresh(&mut self, challenge: &AuthChallenge) -> AuthState {
        let refreshing = AuthState::BearerRefreshing {
            scope: challenge.scope().unwrap_or_default().to_string(),
        };
        std::mem::replace(&mut self.state, refreshing)
    }

    /// Leaves `BearerRefreshing` without touching the token cache.
    pub fn abort_refresh(&mut self, previous: AuthState) {
        self.state = previous;
    }

    /// Stores a freshly issued token under the challenge's scope and returns
    /// the Authorization header for the final retry.
    pub fn complete_refresh(&mut self, challenge: &AuthChallenge, token: String) -> String {
        let scope = challenge.scope().unwrap_or_default().to_string();
        let header = bearer(&token);
        self.tokens.insert(scope.clone(), token);
        self.state = AuthState::BearerCached { scope };
        header
    }
}

fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}
