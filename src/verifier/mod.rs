// src/verifier/mod.rs

pub mod client;
pub mod config;
pub mod keys;
pub mod model;

use crate::claims::{self, ClaimMap, ClaimValue, DecodedJwt};
use crate::error::ByuJwtError;
use client::ProviderClient;
use config::{Config, KeyMode};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use keys::{KeySet, PublicKey};
use model::DiscoveryDocument;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Verifies BYU signed JWTs against the keys published by one provider.
///
/// Create it once per provider and reuse it: discovery documents and keys
/// are cached on the instance. Clones share the caches and the last-error slot.
#[derive(Clone)]
pub struct Verifier {
    config: Config,
    client: ProviderClient,
    last_error: Arc<Mutex<Option<Arc<ByuJwtError>>>>,
}

impl Verifier {
    /// Creates a new `Verifier` with the given configuration.
    pub fn new(config: Config) -> Self {
        let client = ProviderClient::new(&config);
        Self {
            config,
            client,
            last_error: Arc::new(Mutex::new(None)),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the provider's discovery document.
    ///
    /// Transport and parse failures yield `None`; the cause is available from
    /// [`Self::last_error`].
    pub async fn get_well_known(&self) -> Option<Arc<DiscoveryDocument>> {
        self.client.discovery_document().await.map_err(|e| self.record(e)).ok()
    }

    /// Returns the public key of the leading certificate of the first key-set entry.
    pub async fn get_public_key(&self) -> Option<Arc<PublicKey>> {
        self.client.primary_key().await.map_err(|e| self.record(e)).ok()
    }

    /// Returns every usable key of the provider's key set. Empty on failure.
    pub async fn get_public_keys(&self) -> Arc<KeySet> {
        match self.client.key_set().await {
            Ok(keys) => keys,
            Err(e) => {
                self.record(e);
                Arc::new(KeySet::default())
            }
        }
    }

    /// Checks whether `token` is a valid JWT from this provider.
    ///
    /// Never fails: any decode failure yields `false` and is kept for
    /// inspection through [`Self::last_error`].
    pub async fn validate_jwt(&self, token: &str) -> bool {
        match self.decode(token).await {
            Ok(_) => true,
            Err(e) => {
                self.record(e);
                false
            }
        }
    }

    /// Verifies `token` and returns its claims in structured form.
    ///
    /// The signature is tried against each candidate key in turn, accepting
    /// only algorithms the provider advertises (or the fallback list in
    /// [`KeyMode::Primary`]). A verified token must also carry an `iss` equal
    /// to the discovery document's issuer and an `exp` claim.
    ///
    /// # Errors
    ///
    /// * [`ByuJwtError::KeyUnavailable`] when no candidate key could be resolved.
    /// * [`ByuJwtError::JwtValidation`] from the last key tried, for malformed,
    ///   badly signed, expired, not-yet-valid or disallowed-algorithm tokens.
    /// * [`ByuJwtError::NoIssuer`], [`ByuJwtError::BadIssuer`] and
    ///   [`ByuJwtError::NoExpiration`] for missing or mismatched claims.
    #[instrument(skip(self, token))]
    pub async fn decode(&self, token: &str) -> Result<DecodedJwt, ByuJwtError> {
        let document = self
            .client
            .discovery_document()
            .await
            .map_err(|e| ByuJwtError::key_unavailable("no discovery document", Some(e)))?;

        let (candidates, offered) = match self.config.key_mode {
            KeyMode::KeySet => {
                let keys = self.client.key_set().await?;
                (keys, supported_algorithms(&document))
            }
            KeyMode::Primary => {
                let key = self.client.primary_key().await?;
                let keys = Arc::new(KeySet::from_keys(vec![(*key).clone()]));
                (keys, self.config.validation.fallback_algorithms.clone())
            }
        };

        // The header is only a hint for ordering; a malformed token still runs
        // through the loop so the failure comes from the decode itself.
        let kid = decode_header(token).ok().and_then(|header| header.kid);

        let mut outcome = Err(ByuJwtError::key_unavailable("no candidate keys", None));
        for key in candidates.candidates(kid.as_deref()) {
            outcome = self.try_key(token, key, &offered);
            if outcome.is_ok() {
                break;
            }
        }
        let claims = outcome?;

        check_issued_at(&claims, self.config.validation.leeway.as_secs())?;
        check_claims(&claims, &document)?;
        Ok(claims::normalize(&claims))
    }

    /// The most recent failure recorded by this verifier or its clones.
    pub fn last_error(&self) -> Option<Arc<ByuJwtError>> {
        self.last_error.lock().clone()
    }

    /// Drops cached discovery documents and keys, and the last error.
    pub fn clear_cache(&self) {
        self.client.clear();
        *self.last_error.lock() = None;
    }

    fn try_key(&self, token: &str, key: &PublicKey, offered: &[Algorithm]) -> Result<ClaimMap, ByuJwtError> {
        let accepted = key.accepted_algorithms(offered);
        let Some(first) = accepted.first().copied() else {
            debug!("Key '{}' accepts none of the offered algorithms", key.id());
            return Err(jsonwebtoken::errors::Error::from(ErrorKind::InvalidAlgorithm).into());
        };

        let mut validation = Validation::new(first);
        validation.algorithms = accepted;
        validation.leeway = self.config.validation.leeway.as_secs();
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.validate_aud = false;
        // `iss` and `exp` presence are checked after decoding so that each
        // gets its own error.
        validation.required_spec_claims = HashSet::new();

        match decode::<ClaimMap>(token, key.decoding_key(), &validation) {
            Ok(data) => {
                debug!("Token verified with key '{}'", key.id());
                Ok(data.claims)
            }
            Err(e) => {
                debug!("Key '{}' rejected the token: {}", key.id(), e);
                Err(e.into())
            }
        }
    }

    // The only place fetch and decode failures are logged.
    fn record(&self, error: ByuJwtError) {
        warn!("{}", error);
        *self.last_error.lock() = Some(Arc::new(error));
    }
}

fn supported_algorithms(document: &DiscoveryDocument) -> Vec<Algorithm> {
    document
        .id_token_signing_alg_values_supported
        .iter()
        .filter_map(|name| match Algorithm::from_str(name) {
            Ok(alg) => Some(alg),
            Err(_) => {
                debug!("Ignoring unsupported signing algorithm '{}'", name);
                None
            }
        })
        .collect()
}

/// Rejects a token issued in the future, beyond `leeway` seconds.
fn check_issued_at(claims: &ClaimMap, leeway: u64) -> Result<(), ByuJwtError> {
    let Some(issued_at) = claims.get("iat").and_then(ClaimValue::as_i64) else {
        return Ok(());
    };
    let now = jsonwebtoken::get_current_timestamp();
    if issued_at > 0 && issued_at as u64 > now.saturating_add(leeway) {
        return Err(jsonwebtoken::errors::Error::from(ErrorKind::ImmatureSignature).into());
    }
    Ok(())
}

fn check_claims(claims: &ClaimMap, document: &DiscoveryDocument) -> Result<(), ByuJwtError> {
    let issuer = claims
        .get("iss")
        .filter(|iss| !iss.is_blank())
        .ok_or(ByuJwtError::NoIssuer)?;
    if issuer.as_str() != Some(document.issuer.as_str()) {
        return Err(ByuJwtError::BadIssuer {
            expected: document.issuer.clone(),
            actual: issuer.to_string(),
        });
    }

    // A past `exp` was already rejected by the decode; only absence is left.
    if claims.get("exp").map_or(true, ClaimValue::is_blank) {
        return Err(ByuJwtError::NoExpiration);
    }
    Ok(())
}

/// Reads the `iss` claim from a token's payload without verifying it.
///
/// Useful for routing a token to the right verifier before verification.
pub fn get_issuer(token: &str) -> Option<String> {
    let payload = decode_raw_payload(token)?;
    payload.get("iss")?.as_str().map(str::to_string)
}

fn decode_raw_payload(token: &str) -> Option<ClaimMap> {
    let payload_segment = token.split('.').nth(1)?;
    let decoded_payload_bytes = base64_url::decode(payload_segment).ok()?;
    serde_json::from_slice(&decoded_payload_bytes).ok()
}
