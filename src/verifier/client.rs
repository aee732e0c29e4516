// src/verifier/client.rs

use super::config::Config;
use super::keys::{KeySet, PublicKey};
use super::model::{CertificateKeySet, DiscoveryDocument, JsonWebKeySet};
use crate::error::ByuJwtError;
use moka::future::Cache;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, instrument};

// One discovery host per client, so a handful of entries is plenty.
const CACHE_CAPACITY: u64 = 16;

/// Fetches and caches the discovery document and keys of one provider.
///
/// Every cache is keyed by the discovery URL and lives as long as the client.
#[derive(Clone)]
pub struct ProviderClient {
    // The client is internally ref-counted to allow for cheap cloning.
    inner: Arc<Inner>,
}

struct Inner {
    http_client: reqwest::Client,
    discovery_url: String,
    cache_enabled: bool,
    documents: Cache<String, Arc<DiscoveryDocument>>,
    primary_keys: Cache<String, Arc<PublicKey>>,
    key_sets: Cache<String, Arc<KeySet>>,
}

impl ProviderClient {
    pub fn new(config: &Config) -> Self {
        Self {
            inner: Arc::new(Inner {
                http_client: config.http_client.clone(),
                discovery_url: config.discovery_url.to_string(),
                cache_enabled: config.cache_enabled,
                documents: Cache::new(CACHE_CAPACITY),
                primary_keys: Cache::new(CACHE_CAPACITY),
                key_sets: Cache::new(CACHE_CAPACITY),
            }),
        }
    }

    pub fn discovery_url(&self) -> &str {
        &self.inner.discovery_url
    }

    /// Returns the provider's discovery document, from cache when possible.
    #[instrument(skip(self))]
    pub async fn discovery_document(&self) -> Result<Arc<DiscoveryDocument>, ByuJwtError> {
        let url = self.discovery_url();
        if let Some(document) = self.cached(&self.inner.documents).await {
            debug!("Discovery document cache hit for {}", url);
            return Ok(document);
        }

        debug!("Fetching discovery document from {}", url);
        let document: DiscoveryDocument = self
            .fetch_json(url)
            .await
            .map_err(|e| ByuJwtError::discovery_unavailable(url, e))?;

        let document = Arc::new(document);
        self.store(&self.inner.documents, document.clone()).await;
        Ok(document)
    }

    /// Resolves the leading certificate of the first key-set entry.
    #[instrument(skip(self))]
    pub async fn primary_key(&self) -> Result<Arc<PublicKey>, ByuJwtError> {
        if let Some(key) = self.cached(&self.inner.primary_keys).await {
            debug!("Primary key cache hit");
            return Ok(key);
        }

        let jwks_uri = self.jwks_uri().await?;
        let key_set: CertificateKeySet = self
            .fetch_json(&jwks_uri)
            .await
            .map_err(|e| ByuJwtError::key_unavailable(format!("key set at {jwks_uri} is unavailable"), Some(e)))?;

        let first = key_set.keys.first();
        let certificate = first
            .and_then(|key| key.x5c.first())
            .ok_or_else(|| ByuJwtError::key_unavailable("key set has no x5c certificate in its first entry", None))?;
        let id = first.and_then(|key| key.kid.clone()).unwrap_or_else(|| "0".to_string());

        let key = PublicKey::from_certificate(id, certificate)
            .map_err(|e| ByuJwtError::key_unavailable("primary certificate could not be read", Some(e)))?;

        let key = Arc::new(key);
        self.store(&self.inner.primary_keys, key.clone()).await;
        Ok(key)
    }

    /// Resolves every usable key of the key set.
    #[instrument(skip(self))]
    pub async fn key_set(&self) -> Result<Arc<KeySet>, ByuJwtError> {
        if let Some(keys) = self.cached(&self.inner.key_sets).await {
            debug!("Key set cache hit ({} keys)", keys.len());
            return Ok(keys);
        }

        let jwks_uri = self.jwks_uri().await?;
        let jwks: JsonWebKeySet = self
            .fetch_json(&jwks_uri)
            .await
            .map_err(|e| ByuJwtError::key_unavailable(format!("key set at {jwks_uri} is unavailable"), Some(e)))?;

        let keys = Arc::new(KeySet::from_jwk_entries(&jwks.keys)?);
        debug!("Resolved {} keys from {}", keys.len(), jwks_uri);
        self.store(&self.inner.key_sets, keys.clone()).await;
        Ok(keys)
    }

    /// Drops every cached document and key.
    pub fn clear(&self) {
        self.inner.documents.invalidate_all();
        self.inner.primary_keys.invalidate_all();
        self.inner.key_sets.invalidate_all();
    }

    async fn jwks_uri(&self) -> Result<String, ByuJwtError> {
        let document = self
            .discovery_document()
            .await
            .map_err(|e| ByuJwtError::key_unavailable("no discovery document", Some(e)))?;
        document
            .jwks_uri()
            .map(str::to_string)
            .ok_or_else(|| ByuJwtError::key_unavailable("discovery document has no jwks_uri", None))
    }

    /// A single GET whose body must be JSON of type `T`. Non-2xx statuses
    /// count as transport failures.
    async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ByuJwtError> {
        let body = self
            .inner
            .http_client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn cached<V>(&self, cache: &Cache<String, Arc<V>>) -> Option<Arc<V>>
    where
        V: Send + Sync + 'static,
    {
        if !self.inner.cache_enabled {
            return None;
        }
        cache.get(&self.inner.discovery_url).await
    }

    async fn store<V>(&self, cache: &Cache<String, Arc<V>>, value: Arc<V>)
    where
        V: Send + Sync + 'static,
    {
        if self.inner.cache_enabled {
            cache.insert(self.inner.discovery_url.clone(), value).await;
        }
    }
}
