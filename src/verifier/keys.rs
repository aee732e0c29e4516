// src/verifier/keys.rs

use crate::error::ByuJwtError;
use base64::engine::{general_purpose::STANDARD, Engine};
use jsonwebtoken::jwk::{AlgorithmParameters, Jwk};
use jsonwebtoken::{Algorithm, DecodingKey};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// The key family an algorithm belongs to. A key only verifies signatures
/// made with algorithms of its own family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyFamily {
    Hmac,
    Rsa,
    Ec,
    Ed,
}

impl KeyFamily {
    pub fn of(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Self::Hmac,
            Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512 => Self::Rsa,
            Algorithm::ES256 | Algorithm::ES384 => Self::Ec,
            Algorithm::EdDSA => Self::Ed,
        }
    }
}

/// A public key resolved from the provider's key set.
#[derive(Clone)]
pub struct PublicKey {
    id: String,
    family: KeyFamily,
    algorithm: Option<Algorithm>,
    decoding_key: DecodingKey,
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("id", &self.id)
            .field("family", &self.family)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl PublicKey {
    /// Reads the public key embedded in a base64 DER X.509 certificate, the
    /// format used by the `x5c` member of a key-set entry.
    pub fn from_certificate(id: impl Into<String>, certificate: &str) -> Result<Self, ByuJwtError> {
        let der = STANDARD.decode(certificate.trim())?;
        if der.is_empty() {
            return Err(ByuJwtError::InvalidKeyFormat("certificate is empty".to_string()));
        }
        let pem = certificate_pem(&der);

        let (family, decoding_key) = match DecodingKey::from_rsa_pem(pem.as_bytes()) {
            Ok(key) => (KeyFamily::Rsa, key),
            Err(rsa_error) => match DecodingKey::from_ec_pem(pem.as_bytes()) {
                Ok(key) => (KeyFamily::Ec, key),
                Err(_) => {
                    return Err(ByuJwtError::InvalidKeyFormat(format!(
                        "Failed to read a public key from the certificate: {rsa_error}"
                    )))
                }
            },
        };

        Ok(Self {
            id: id.into(),
            family,
            algorithm: None,
            decoding_key,
        })
    }

    /// Parses one entry of a JWK set.
    ///
    /// Entries without an identifier are named after their position. An entry
    /// whose key parameters cannot be read falls back to its `x5c` chain.
    pub fn from_jwk_value(index: usize, entry: &Value) -> Result<Self, ByuJwtError> {
        let id = entry
            .get("kid")
            .and_then(Value::as_str)
            .map_or_else(|| index.to_string(), str::to_string);
        let algorithm = entry
            .get("alg")
            .and_then(Value::as_str)
            .and_then(|alg| Algorithm::from_str(alg).ok());

        let parsed = serde_json::from_value::<Jwk>(entry.clone())
            .map_err(ByuJwtError::from)
            .and_then(|jwk| {
                let family = match &jwk.algorithm {
                    AlgorithmParameters::RSA(_) => KeyFamily::Rsa,
                    AlgorithmParameters::EllipticCurve(_) => KeyFamily::Ec,
                    AlgorithmParameters::OctetKeyPair(_) => KeyFamily::Ed,
                    AlgorithmParameters::OctetKey(_) => KeyFamily::Hmac,
                };
                let key = DecodingKey::from_jwk(&jwk)
                    .map_err(|e| ByuJwtError::InvalidKeyFormat(format!("JWK '{id}': {e}")))?;
                Ok((family, key))
            });

        match parsed {
            Ok((family, decoding_key)) => Ok(Self {
                id,
                family,
                algorithm,
                decoding_key,
            }),
            Err(jwk_error) => {
                let certificate = entry
                    .get("x5c")
                    .and_then(|chain| chain.get(0))
                    .and_then(Value::as_str);
                match certificate {
                    Some(certificate) => {
                        debug!("JWK '{}' has no usable parameters, reading its x5c certificate", id);
                        let key = Self::from_certificate(id, certificate)?;
                        Ok(Self { algorithm, ..key })
                    }
                    None => Err(jwk_error),
                }
            }
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn family(&self) -> KeyFamily {
        self.family
    }

    /// The algorithm the key set pins this key to, if any.
    pub fn algorithm(&self) -> Option<Algorithm> {
        self.algorithm
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }

    /// Filters `offered` down to the algorithms this key can verify.
    pub fn accepted_algorithms(&self, offered: &[Algorithm]) -> Vec<Algorithm> {
        offered
            .iter()
            .copied()
            .filter(|alg| KeyFamily::of(*alg) == self.family)
            .filter(|alg| self.algorithm.map_or(true, |pinned| pinned == *alg))
            .collect()
    }
}

/// The usable keys of a key-set document, in document order.
#[derive(Clone, Debug, Default)]
pub struct KeySet {
    keys: Vec<PublicKey>,
}

impl KeySet {
    /// Builds a key set from the `keys` array of a JWK set.
    ///
    /// Entries that fail to parse are dropped. The set is rejected only when no
    /// entry is usable, carrying the last entry failure as its cause.
    pub fn from_jwk_entries(entries: &[Value]) -> Result<Self, ByuJwtError> {
        let mut keys = Vec::with_capacity(entries.len());
        let mut last_failure = None;

        for (index, entry) in entries.iter().enumerate() {
            match PublicKey::from_jwk_value(index, entry) {
                Ok(key) => keys.push(key),
                Err(e) => {
                    warn!("Dropping key-set entry {}: {}", index, e);
                    last_failure = Some(e);
                }
            }
        }

        if keys.is_empty() {
            return Err(ByuJwtError::key_unavailable("key set has no usable entries", last_failure));
        }
        Ok(Self { keys })
    }

    pub(crate) fn from_keys(keys: Vec<PublicKey>) -> Self {
        Self { keys }
    }

    pub fn get(&self, id: &str) -> Option<&PublicKey> {
        self.keys.iter().find(|key| key.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PublicKey> {
        self.keys.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(PublicKey::id)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keys in the order they should be tried: the key named by `kid` first,
    /// then the rest in document order.
    pub fn candidates(&self, kid: Option<&str>) -> Vec<&PublicKey> {
        let mut ordered: Vec<&PublicKey> = self.keys.iter().collect();
        if let Some(kid) = kid {
            ordered.sort_by_key(|key| key.id != kid);
        }
        ordered
    }
}

// jsonwebtoken's PEM reader accepts CERTIFICATE blocks and pulls the
// subject public key out of them.
fn certificate_pem(der: &[u8]) -> String {
    let body = STANDARD.encode(der);
    let mut pem = String::with_capacity(body.len() + body.len() / 64 + 64);
    pem.push_str("-----BEGIN CERTIFICATE-----\n");
    for (i, c) in body.chars().enumerate() {
        if i > 0 && i % 64 == 0 {
            pem.push('\n');
        }
        pem.push(c);
    }
    pem.push_str("\n-----END CERTIFICATE-----\n");
    pem
}
