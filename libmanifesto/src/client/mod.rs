//! HTTP transport for registry communication.
//!
//! This module provides a thin blocking client built on reqwest. Every call
//! goes through [`Client::call`], which applies the fixed request timeout,
//! identifies the client, reads the response body to the end, and runs the
//! authentication handshake described in [`crate::auth`]. No other retries
//! are performed: 5xx answers are returned to the caller and network failures
//! surface immediately as [`ManifestoError::Transport`].

use crate::auth::{AuthChallenge, AuthNegotiator, AuthState, Credentials, TokenResponse};
use crate::error::{ManifestoError, Result};
use reqwest::blocking::Client as ReqwestClient;
use reqwest::header::{
    ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, USER_AGENT, WWW_AUTHENTICATE,
};
use reqwest::{Method, StatusCode};
use std::time::Duration;
use tracing::debug;
use url::Url;

#[cfg(test)]
mod tests;

/// Value of the `User-Agent` header sent with every request.
pub const CLIENT_USER_AGENT: &str = concat!("manifesto/", env!("CARGO_PKG_VERSION"));

/// Configuration for the HTTP client.
///
/// # Examples
///
/// ```
/// use libmanifesto::client::ClientConfig;
///
/// let config = ClientConfig::new().with_timeout(60).with_insecure(true);
/// assert_eq!(config.timeout_seconds, 60);
/// assert!(config.insecure);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Request timeout in seconds (default: 10)
    pub timeout_seconds: u64,
    /// Use plain HTTP for registry URLs given without a scheme
    pub insecure: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
            insecure: false,
        }
    }
}

impl ClientConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the request timeout in seconds.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Selects plain HTTP for scheme-less registry URLs.
    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }
}

/// A fully read registry response.
///
/// The body is buffered before the response is handed out, so the underlying
/// connection is always drained and can be reused.
#[derive(Debug, Clone)]
pub struct RegistryResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl RegistryResponse {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns a header value if present and valid UTF-8.
    pub fn header(&self, name: impl reqwest::header::AsHeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body
    }
}

/// One request as it is replayed across authentication attempts.
#[derive(Clone, Copy)]
struct Outgoing<'a> {
    method: &'a Method,
    url: &'a Url,
    body: &'a [u8],
    content_type: &'a str,
    accept: Option<&'a str>,
}

/// Blocking HTTP client for one registry.
///
/// Holds the token cache for its lifetime; calls take `&mut self` and are
/// strictly sequential.
#[derive(Debug)]
pub struct Client {
    /// The underlying HTTP client
    http_client: ReqwestClient,
    /// Base registry URL (e.g., "https://registry.example.com")
    registry_url: String,
    /// Authentication state and cached tokens
    auth: AuthNegotiator,
    /// Request timeout, kept for error messages
    timeout_seconds: u64,
}

impl Client {
    /// Creates a new client for the specified registry URL with default configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use libmanifesto::client::Client;
    ///
    /// let client = Client::new("quay.io", None).unwrap();
    /// assert_eq!(client.registry_url(), "https://quay.io");
    /// ```
    pub fn new(registry_url: &str, credentials: Option<Credentials>) -> Result<Self> {
        Self::with_config(registry_url, ClientConfig::default(), credentials)
    }

    /// Creates a new client for the specified registry URL with custom configuration.
    pub fn with_config(
        registry_url: &str,
        config: ClientConfig,
        credentials: Option<Credentials>,
    ) -> Result<Self> {
        let normalized_url = Self::normalize_url(registry_url, config.insecure)?;

        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ManifestoError::transport_with_source("Failed to create HTTP client", e))?;

        Ok(Self {
            http_client,
            registry_url: normalized_url,
            auth: AuthNegotiator::new(credentials.unwrap_or_default()),
            timeout_seconds: config.timeout_seconds,
        })
    }

    /// Normalizes a registry URL by ensuring it has a scheme and removing trailing slashes.
    fn normalize_url(url: &str, insecure: bool) -> Result<String> {
        let url = url.trim();

        if url.is_empty() {
            return Err(ManifestoError::validation("Registry URL cannot be empty"));
        }

        let url = if !url.starts_with("http://") && !url.starts_with("https://") {
            let scheme = if insecure { "http" } else { "https" };
            format!("{}://{}", scheme, url)
        } else {
            url.to_string()
        };

        let url = url.trim_end_matches('/');

        Url::parse(url).map_err(|e| {
            ManifestoError::validation_with_source(format!("Invalid registry URL '{}'", url), e)
        })?;

        Ok(url.to_string())
    }

    /// Returns the base registry URL.
    pub fn registry_url(&self) -> &str {
        &self.registry_url
    }

    /// Returns the current authentication state.
    pub fn auth_state(&self) -> &AuthState {
        self.auth.state()
    }

    /// Resolves a path or URL against the registry base URL.
    ///
    /// Paths starting with `/` are appended to the base URL; anything else is
    /// treated as an absolute URL. Relative references without a leading `/`
    /// (as some registries return in `Location`) are joined to the base.
    pub fn resolve_url(&self, path: &str) -> Result<Url> {
        if path.starts_with('/') {
            return Url::parse(&format!("{}{}", self.registry_url, path)).map_err(|e| {
                ManifestoError::validation_with_source(format!("Invalid request path '{}'", path), e)
            });
        }

        match Url::parse(path) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = Url::parse(&format!("{}/", self.registry_url)).map_err(|e| {
                    ManifestoError::validation_with_source("Invalid registry URL", e)
                })?;
                base.join(path).map_err(|e| {
                    ManifestoError::validation_with_source(format!("Invalid request path '{}'", path), e)
                })
            }
            Err(e) => Err(ManifestoError::validation_with_source(
                format!("Invalid request URL '{}'", path),
                e,
            )),
        }
    }

    /// Issues a GET request with an empty body.
    pub fn get(&mut self, path: &str) -> Result<RegistryResponse> {
        self.call(Method::GET, path, &[], "")
    }

    /// Issues a GET request advertising the media types it accepts.
    pub fn get_accepting(&mut self, path: &str, accept: &str) -> Result<RegistryResponse> {
        self.execute(Method::GET, path, &[], "", Some(accept))
    }

    /// Issues a request, answering authentication challenges.
    ///
    /// A `401` is answered at most twice: once with a token already cached
    /// for the challenge's scope, then once with a freshly issued token. The
    /// result of the last attempt is returned as-is, whatever its status.
    ///
    /// # Errors
    ///
    /// - [`ManifestoError::Transport`] on connection failures and timeouts
    /// - [`ManifestoError::AuthChallengeParse`] when a 401 carries a malformed challenge
    /// - [`ManifestoError::AuthToken`] when the token endpoint fails
    pub fn call(
        &mut self,
        method: Method,
        path: &str,
        body: &[u8],
        content_type: &str,
    ) -> Result<RegistryResponse> {
        self.execute(method, path, body, content_type, None)
    }

    fn execute(
        &mut self,
        method: Method,
        path: &str,
        body: &[u8],
        content_type: &str,
        accept: Option<&str>,
    ) -> Result<RegistryResponse> {
        let url = self.resolve_url(path)?;
        let request = Outgoing {
            method: &method,
            url: &url,
            body,
            content_type,
            accept,
        };

        let authorization = self.auth.authorization();
        let response = self.send(&request, authorization.as_deref())?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let header = response.header(WWW_AUTHENTICATE).unwrap_or_default();
        let challenge = AuthChallenge::parse(header)?;
        debug!(scheme = %challenge.scheme, scope = ?challenge.scope(), "registry issued auth challenge");

        if !challenge.is_bearer() {
            // Basic challenges have no token endpoint; credentials, if any,
            // were already sent.
            return Ok(response);
        }

        if let Some(cached) = self.auth.cached_retry(&challenge, authorization.as_deref()) {
            debug!(scope = ?challenge.scope(), "retrying with cached token");
            let response = self.send(&request, Some(&cached))?;
            if response.status() != StatusCode::UNAUTHORIZED {
                self.auth.confirm_cached(&challenge);
                return Ok(response);
            }
        }

        let previous = self.auth.begin_refresh(&challenge);
        let token = match self.fetch_token(&challenge) {
            Ok(token) => token,
            Err(e) => {
                self.auth.abort_refresh(previous);
                return Err(e);
            }
        };
        let authorization = self.auth.complete_refresh(&challenge, token);

        self.send(&request, Some(&authorization))
    }

    /// Requests a token from the challenge's realm using Basic credentials.
    fn fetch_token(&self, challenge: &AuthChallenge) -> Result<String> {
        let url = challenge.token_url()?;
        debug!(realm = %challenge.realm, "requesting registry token");

        let mut request = self
            .http_client
            .get(url.clone())
            .header(USER_AGENT, CLIENT_USER_AGENT);
        if let Some(basic) = self.auth.credentials().to_header_value() {
            request = request.header(AUTHORIZATION, basic);
        }

        let response = request.send().map_err(|e| {
            ManifestoError::auth_token_with_source(format!("token endpoint {} unreachable", url), e)
        })?;
        let status = response.status();
        let body = response.bytes().map_err(|e| {
            ManifestoError::auth_token_with_source("failed to read token response", e)
        })?;

        if status != StatusCode::OK {
            return Err(ManifestoError::auth_token(format!(
                "token request to {} returned status {}",
                challenge.realm,
                status.as_u16()
            )));
        }

        TokenResponse::from_slice(&body)
    }

    /// Sends a single request and buffers the whole response.
    fn send(&self, outgoing: &Outgoing<'_>, authorization: Option<&str>) -> Result<RegistryResponse> {
        let Outgoing {
            method,
            url,
            body,
            content_type,
            accept,
        } = *outgoing;
        debug!(%method, %url, bytes = body.len(), "sending registry request");

        let mut request = self
            .http_client
            .request(method.clone(), url.clone())
            .header(USER_AGENT, CLIENT_USER_AGENT);
        if !content_type.is_empty() {
            request = request.header(CONTENT_TYPE, content_type);
        }
        if let Some(accept) = accept {
            request = request.header(ACCEPT, accept);
        }
        if let Some(value) = authorization {
            request = request.header(AUTHORIZATION, value);
        }
        if *method != Method::GET && *method != Method::HEAD {
            request = request.body(body.to_vec());
        }

        let response = request
            .send()
            .map_err(|e| self.translate_reqwest_error(e, method, url))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .map_err(|e| self.translate_reqwest_error(e, method, url))?
            .to_vec();

        debug!(status = status.as_u16(), bytes = body.len(), "registry responded");
        Ok(RegistryResponse {
            status,
            headers,
            body,
        })
    }

    /// Translates a reqwest error into a transport error.
    fn translate_reqwest_error(&self, error: reqwest::Error, method: &Method, url: &Url) -> ManifestoError {
        let message = if error.is_timeout() {
            format!(
                "{} {} timed out after {} seconds",
                method, url, self.timeout_seconds
            )
        } else if error.is_connect() {
            format!("Failed to connect to registry at {}", self.registry_url)
        } else {
            format!("{} {} failed", method, url)
        };
        ManifestoError::transport_with_source(message, error)
    }
}
