#![allow(dead_code)]

use byu_jwt::prelude::*;
use jsonwebtoken::{encode, EncodingKey, Header};
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::{pkcs8::DecodePrivateKey, RsaPrivateKey};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ISSUER: &str = "https://api.byu.edu";
pub const DISCOVERY_PATH: &str = "/.well-known/openid-configuration";
pub const JWKS_PATH: &str = "/.well-known/byucerts";

pub const PRIMARY_KEY_PEM: &str = include_str!("../fixtures/primary_key.pem");
pub const SECONDARY_KEY_PEM: &str = include_str!("../fixtures/secondary_key.pem");
// Self-signed certificate for PRIMARY_KEY_PEM.
pub const PRIMARY_CERT_PEM: &str = include_str!("../fixtures/primary_cert.pem");

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// The body of the fixture certificate, as carried in an `x5c` chain.
pub fn primary_x5c() -> String {
    PRIMARY_CERT_PEM
        .lines()
        .filter(|line| !line.starts_with("-----"))
        .collect()
}

fn private_key(pem: &str) -> RsaPrivateKey {
    RsaPrivateKey::from_pkcs8_pem(pem).unwrap()
}

/// A public JWK for one of the fixture keys.
pub fn rsa_jwk(pem: &str, kid: &str) -> Value {
    let public_key = private_key(pem).to_public_key();
    json!({
        "kty": "RSA",
        "kid": kid,
        "alg": "RS256",
        "use": "sig",
        "n": base64_url::encode(&public_key.n().to_bytes_be()),
        "e": base64_url::encode(&public_key.e().to_bytes_be()),
    })
}

/// Signs `claims` with RS256 using one of the fixture keys.
pub fn sign_rs256(pem: &str, kid: Option<&str>, claims: &Value) -> String {
    // Go through PKCS#1 DER; jsonwebtoken reads that reliably.
    let pkcs1_der = private_key(pem).to_pkcs1_der().unwrap();
    let encoding_key = EncodingKey::from_rsa_der(pkcs1_der.as_bytes());
    let mut header = Header::new(Algorithm::RS256);
    header.kid = kid.map(str::to_string);
    encode(&header, claims, &encoding_key).unwrap()
}

pub fn sign_hs256(secret: &[u8], claims: &Value) -> String {
    encode(&Header::new(Algorithm::HS256), claims, &EncodingKey::from_secret(secret)).unwrap()
}

/// A client-credentials style claims set that passes every check.
pub fn valid_claims() -> Value {
    json!({
        "iss": ISSUER,
        "exp": now() + 3600,
        "http://byu.edu/claims/client_byu_id": "649019965",
        "http://byu.edu/claims/client_net_id": "adddrop",
        "http://byu.edu/claims/client_person_id": "377228062",
        "http://byu.edu/claims/client_claim_source": "CLIENT_SUBSCRIBER",
        "http://wso2.org/claims/apicontext": "/echo/v1",
        "http://wso2.org/claims/applicationid": "2085",
        "http://wso2.org/claims/client_id": "5gzLjMUcx7qut3MuSf9xr8GV2BAa",
    })
}

pub fn discovery_document(server: &MockServer, algorithms: &[&str]) -> Value {
    json!({
        "issuer": ISSUER,
        "jwks_uri": format!("{}{}", server.uri(), JWKS_PATH),
        "id_token_signing_alg_values_supported": algorithms,
        "token_endpoint": format!("{}/token", server.uri()),
    })
}

pub async fn mount_json(server: &MockServer, route: &str, body: Value, expected_calls: Option<u64>) {
    let mock = Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body));
    match expected_calls {
        Some(n) => mock.expect(n).mount(server).await,
        None => mock.mount(server).await,
    }
}

/// Serves an RS256 discovery document and the given key set.
pub async fn mount_provider(server: &MockServer, jwks: Value) {
    mount_json(server, DISCOVERY_PATH, discovery_document(server, &["RS256"]), None).await;
    mount_json(server, JWKS_PATH, jwks, None).await;
}

pub fn config_for(server: &MockServer) -> ConfigBuilder {
    ConfigBuilder::new().host(&server.uri()).unwrap()
}

pub fn verifier_for(server: &MockServer) -> Verifier {
    init_tracing();
    Verifier::new(config_for(server).build().unwrap())
}

/// Formatted log output collected in memory.
#[derive(Clone, Default)]
pub struct CapturedLogs(std::sync::Arc<parking_lot::Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }

    /// Lines logged at `WARN` or `ERROR`.
    pub fn problems(&self) -> Vec<String> {
        self.contents()
            .lines()
            .filter(|line| line.contains("WARN") || line.contains("ERROR"))
            .map(str::to_string)
            .collect()
    }

    /// Installs a subscriber writing into these logs for the current thread.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(self.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
