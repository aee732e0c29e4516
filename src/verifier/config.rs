// src/verifier/config.rs

use crate::error::ByuJwtError;
use jsonwebtoken::Algorithm;
use std::time::Duration;
use url::Url;

/// The host used when neither a host nor a discovery URL is configured.
pub const DEFAULT_HOST: &str = "https://api.byu.edu";

/// Path appended to a host to reach its discovery document.
pub const WELL_KNOWN_PATH: &str = "/.well-known/openid-configuration";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Selects how verification keys are resolved from the key-set document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KeyMode {
    /// Every usable entry of the key set is a candidate. Accepted algorithms
    /// come from the discovery document.
    #[default]
    KeySet,
    /// Only the certificate at `keys[0].x5c[0]` is used. Accepted algorithms
    /// come from [`ValidationDetails::fallback_algorithms`].
    Primary,
}

/// Settings applied when checking a token's signature and time claims.
#[derive(Clone, Debug)]
pub struct ValidationDetails {
    /// Tolerance for clock skew when checking `exp`. Defaults to zero.
    pub leeway: Duration,
    /// Algorithms accepted in [`KeyMode::Primary`]. Defaults to `RS256`.
    pub fallback_algorithms: Vec<Algorithm>,
}

impl Default for ValidationDetails {
    fn default() -> Self {
        Self {
            leeway: Duration::ZERO,
            fallback_algorithms: vec![Algorithm::RS256],
        }
    }
}

/// The main configuration for a [`Verifier`](crate::verifier::Verifier).
///
/// Construct it with [`ConfigBuilder`].
#[derive(Clone, Debug)]
pub struct Config {
    /// Full URL of the discovery document.
    pub discovery_url: Url,
    /// Transport used for the discovery and key-set requests.
    pub http_client: reqwest::Client,
    /// Whether discovery documents and keys are cached for the life of the verifier.
    pub cache_enabled: bool,
    /// How verification keys are resolved.
    pub key_mode: KeyMode,
    /// The specific validation parameters to apply to the token.
    pub validation: ValidationDetails,
}

/// A builder for creating a `Config` instance.
#[derive(Default)]
pub struct ConfigBuilder {
    host: Option<String>,
    discovery_url: Option<Url>,
    http_client: Option<reqwest::Client>,
    timeout: Option<Duration>,
    cache_disabled: bool,
    key_mode: KeyMode,
    validation: ValidationDetails,
}

impl ConfigBuilder {
    /// Creates a new `ConfigBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the host whose discovery document is used, e.g. `https://api-sandbox.byu.edu`.
    ///
    /// Trailing slashes are ignored. Mutually exclusive with [`Self::discovery_url`].
    pub fn host(mut self, host: &str) -> Result<Self, ByuJwtError> {
        if self.discovery_url.is_some() {
            return Err(ByuJwtError::AmbiguousConfiguration(
                "Cannot set a host when a discovery URL is already configured.".to_string(),
            ));
        }
        let host = host.trim_end_matches('/');
        Url::parse(host).map_err(|e| ByuJwtError::InvalidUrl(e.to_string()))?;
        self.host = Some(host.to_string());
        Ok(self)
    }

    /// Sets the full discovery document URL, bypassing the well-known path.
    pub fn discovery_url(mut self, url: &str) -> Result<Self, ByuJwtError> {
        if self.host.is_some() {
            return Err(ByuJwtError::AmbiguousConfiguration(
                "Cannot set a discovery URL when a host is already configured.".to_string(),
            ));
        }
        let parsed_url = Url::parse(url).map_err(|e| ByuJwtError::InvalidUrl(e.to_string()))?;
        self.discovery_url = Some(parsed_url);
        Ok(self)
    }

    /// Injects the HTTP client used for every request.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the per-request timeout of the default client. Defaults to 10 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Enables or disables the in-process cache. Enabled by default.
    pub fn cache(mut self, enabled: bool) -> Self {
        self.cache_disabled = !enabled;
        self
    }

    pub fn key_mode(mut self, mode: KeyMode) -> Self {
        self.key_mode = mode;
        self
    }

    /// Sets the algorithms accepted in [`KeyMode::Primary`].
    pub fn fallback_algorithms(mut self, algorithms: Vec<Algorithm>) -> Self {
        self.validation.fallback_algorithms = algorithms;
        self
    }

    /// Sets the clock skew tolerance for `exp`.
    pub fn leeway(mut self, leeway: Duration) -> Self {
        self.validation.leeway = leeway;
        self
    }

    /// Consumes the builder and returns a `Config` object.
    ///
    /// # Errors
    ///
    /// Returns an error if the discovery URL cannot be formed or the default
    /// HTTP client cannot be built.
    pub fn build(self) -> Result<Config, ByuJwtError> {
        let discovery_url = match self.discovery_url {
            Some(url) => url,
            None => {
                let host = self.host.as_deref().unwrap_or(DEFAULT_HOST);
                Url::parse(&format!("{host}{WELL_KNOWN_PATH}"))
                    .map_err(|e| ByuJwtError::InvalidUrl(e.to_string()))?
            }
        };

        let http_client = match self.http_client {
            Some(client) => client,
            None => reqwest::Client::builder()
                .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
                .build()?,
        };

        Ok(Config {
            discovery_url,
            http_client,
            cache_enabled: !self.cache_disabled,
            key_mode: self.key_mode,
            validation: self.validation,
        })
    }
}
