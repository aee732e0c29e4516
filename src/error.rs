// src/error.rs

use base64::DecodeError;
use jsonwebtoken::errors::ErrorKind;
use thiserror::Error;

/// The primary error type for the `byu-jwt` library.
///
/// The first six variants are the failures a caller of
/// [`Verifier::decode`](crate::verifier::Verifier::decode) has to tell apart.
/// The remaining variants are the underlying causes recorded while fetching
/// and parsing the discovery document and key set, plus construction errors.
#[derive(Debug, Error)]
pub enum ByuJwtError {
    /// The discovery document could not be fetched or parsed.
    #[error("Discovery document unavailable at {url}: {source}")]
    DiscoveryUnavailable {
        url: String,
        #[source]
        source: Box<ByuJwtError>,
    },

    /// No usable verification key could be resolved.
    #[error("No usable verification key: {reason}")]
    KeyUnavailable {
        reason: String,
        #[source]
        source: Option<Box<ByuJwtError>>,
    },

    /// The token failed structural, signature, algorithm or expiry checks.
    #[error("JWT validation error: {0}")]
    JwtValidation(#[from] jsonwebtoken::errors::Error),

    /// The token carries no `iss` claim.
    #[error("No issuer in JWT")]
    NoIssuer,

    /// The token's `iss` claim does not match the discovery document.
    #[error("JWT issuer does not match well-known: expected {expected}, found {actual}")]
    BadIssuer { expected: String, actual: String },

    /// The token carries no `exp` claim.
    #[error("No expiration in JWT")]
    NoExpiration,

    /// An error occurred during an HTTP request.
    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// A response body was not the expected JSON.
    #[error("Invalid JSON document: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A provided URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Mutually exclusive configuration options were both set.
    #[error("Ambiguous configuration: {0}")]
    AmbiguousConfiguration(String),

    /// A certificate or JWK is malformed.
    #[error("Invalid key format: {0}")]
    InvalidKeyFormat(String),

    /// An error occurred while decoding a base64 encoded string.
    #[error("Base64 decoding error: {0}")]
    Base64DecodeError(#[from] DecodeError),
}

impl ByuJwtError {
    pub(crate) fn discovery_unavailable(url: &str, cause: ByuJwtError) -> Self {
        Self::DiscoveryUnavailable {
            url: url.to_string(),
            source: Box::new(cause),
        }
    }

    pub(crate) fn key_unavailable(reason: impl Into<String>, cause: Option<ByuJwtError>) -> Self {
        Self::KeyUnavailable {
            reason: reason.into(),
            source: cause.map(Box::new),
        }
    }

    /// Returns the `jsonwebtoken` error kind when this is a decode failure.
    pub fn jwt_error_kind(&self) -> Option<&ErrorKind> {
        match self {
            Self::JwtValidation(e) => Some(e.kind()),
            _ => None,
        }
    }

    /// `true` when the token was rejected because `exp` is in the past.
    pub fn is_expired(&self) -> bool {
        matches!(self.jwt_error_kind(), Some(ErrorKind::ExpiredSignature))
    }

    /// `true` when the token's algorithm is not on the accepted list for the key.
    pub fn is_algorithm_not_allowed(&self) -> bool {
        matches!(
            self.jwt_error_kind(),
            Some(ErrorKind::InvalidAlgorithm | ErrorKind::MissingAlgorithm)
        )
    }
}
