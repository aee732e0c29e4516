// src/verifier/model.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Represents the data structure of a provider's discovery document.
/// Found at the `.well-known/openid-configuration` endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DiscoveryDocument {
    /// The value tokens must carry in their `iss` claim.
    pub issuer: String,
    #[serde(default)]
    pub jwks_uri: Option<String>,
    /// Algorithm names accepted for signature verification, in provider order.
    #[serde(default)]
    pub id_token_signing_alg_values_supported: Vec<String>,
    /// Every other member of the document, kept for callers that need it.
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_json::Value>,
}

impl DiscoveryDocument {
    /// The key-set URI, if the document names a non-empty one.
    pub fn jwks_uri(&self) -> Option<&str> {
        self.jwks_uri.as_deref().filter(|uri| !uri.trim().is_empty())
    }
}

/// The subset of a key-set document read in single-key mode.
#[derive(Debug, Deserialize)]
pub(crate) struct CertificateKeySet {
    #[serde(default)]
    pub keys: Vec<CertificateKey>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CertificateKey {
    #[serde(default)]
    pub kid: Option<String>,
    /// The X.509 certificate chain, leaf first, as standard base64 DER.
    #[serde(default)]
    pub x5c: Vec<String>,
}

/// A key-set document whose entries are parsed one at a time, so that a
/// single malformed entry does not discard the whole set.
#[derive(Debug, Deserialize)]
pub(crate) struct JsonWebKeySet {
    pub keys: Vec<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn discovery_document_keeps_unknown_members() {
        let doc: DiscoveryDocument = serde_json::from_value(json!({
            "issuer": "https://api.byu.edu",
            "jwks_uri": "https://api.byu.edu/.well-known/byucerts",
            "id_token_signing_alg_values_supported": ["RS256"],
            "token_endpoint": "https://api.byu.edu/token"
        }))
        .unwrap();

        assert_eq!(doc.issuer, "https://api.byu.edu");
        assert_eq!(doc.jwks_uri(), Some("https://api.byu.edu/.well-known/byucerts"));
        assert_eq!(doc.id_token_signing_alg_values_supported, vec!["RS256".to_string()]);
        assert_eq!(doc.other["token_endpoint"], json!("https://api.byu.edu/token"));
    }

    #[test]
    fn blank_jwks_uri_counts_as_missing() {
        let doc: DiscoveryDocument =
            serde_json::from_value(json!({ "issuer": "https://api.byu.edu", "jwks_uri": "" })).unwrap();
        assert_eq!(doc.jwks_uri(), None);
        assert!(doc.id_token_signing_alg_values_supported.is_empty());
    }
}
