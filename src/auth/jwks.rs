//! Signing key resolution from a remote JWKS document
//!
//! The key set is fetched from the issuer's well-known endpoint. Keys can be
//! reused for a bounded time, cached per key id; a key id that is not cached
//! forces a refresh so rotated keys are picked up on first sight.
//!
//! Refreshes are serialized so concurrent requests missing the same key share
//! one fetch. A miss shortly after a refresh fails without fetching again, so
//! tokens carrying made-up key ids cannot drive traffic to the issuer. Cache entries are whole keys inserted after a successful fetch,
//! so a reader never sees a half-populated set.

use async_trait::async_trait;
use dashmap::DashMap;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::auth::{AuthError, AuthErrorKind};

/// Failure to obtain a key set
#[derive(Debug, thiserror::Error)]
pub enum KeySourceError {
    #[error("key set request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("key set unavailable: {0}")]
    Unavailable(String),
}

/// Somewhere a JWKS document can be fetched from
#[async_trait]
pub trait KeySource: Send + Sync {
    async fn fetch_keys(&self) -> Result<JwkSet, KeySourceError>;
}

/// Fetches the key set over HTTP
#[derive(Debug, Clone)]
pub struct HttpKeySource {
    client: reqwest::Client,
    url: String,
}

impl HttpKeySource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, KeySourceError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl KeySource for HttpKeySource {
    async fn fetch_keys(&self) -> Result<JwkSet, KeySourceError> {
        let jwks = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json::<JwkSet>()
            .await?;
        Ok(jwks)
    }
}

#[derive(Debug, Clone)]
struct CachedKey {
    jwk: Jwk,
    expires_at: Instant,
}

/// Resolves a key id to a signing key, optionally through a TTL cache
pub struct KeyResolver {
    source: Arc<dyn KeySource>,
    ttl: Duration,
    min_refresh: Duration,
    keys: DashMap<String, CachedKey>,
    /// Held while refreshing; records when the last refresh succeeded
    last_refresh: Mutex<Option<Instant>>,
}

impl KeyResolver {
    /// A zero `ttl` disables caching: every resolution fetches the key set.
    pub fn new(source: Arc<dyn KeySource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            min_refresh: Duration::ZERO,
            keys: DashMap::new(),
            last_refresh: Mutex::new(None),
        }
    }

    /// Refuse to refetch on a key id miss until `interval` has passed since
    /// the last refresh. Never longer than the TTL, so expired keys are
    /// always refetched.
    pub fn with_min_refresh(mut self, interval: Duration) -> Self {
        self.min_refresh = interval;
        self
    }

    pub fn caching(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Find the key whose `kid` matches.
    pub async fn resolve(&self, kid: &str) -> Result<Jwk, AuthError> {
        if !self.caching() {
            let jwks = self.fetch().await?;
            return find_key(&jwks, kid).cloned().ok_or_else(|| key_not_found(kid));
        }

        if let Some(jwk) = self.cached(kid) {
            return Ok(jwk);
        }

        let mut last_refresh = self.last_refresh.lock().await;

        // Another request may have refreshed while we waited
        if let Some(jwk) = self.cached(kid) {
            return Ok(jwk);
        }

        if let Some(at) = *last_refresh {
            if at.elapsed() < self.min_refresh.min(self.ttl) {
                debug!(kid, "Unknown key id, refresh suppressed");
                return Err(key_not_found(kid));
            }
        }

        let jwks = self.fetch().await?;
        *last_refresh = Some(Instant::now());
        self.store(&jwks);

        find_key(&jwks, kid).cloned().ok_or_else(|| key_not_found(kid))
    }

    /// Number of keys currently cached
    pub fn cached_len(&self) -> usize {
        self.keys.len()
    }

    fn cached(&self, kid: &str) -> Option<Jwk> {
        let entry = self.keys.get(kid)?;
        if entry.expires_at > Instant::now() {
            Some(entry.jwk.clone())
        } else {
            None
        }
    }

    async fn fetch(&self) -> Result<JwkSet, AuthError> {
        debug!("Fetching signing key set");
        self.source.fetch_keys().await.map_err(|e| {
            warn!(error = %e, "Signing key set fetch failed");
            AuthError::new(AuthErrorKind::KeySetUnavailable).with_detail(e.to_string())
        })
    }

    fn store(&self, jwks: &JwkSet) {
        let expires_at = Instant::now() + self.ttl;
        let mut fresh = Vec::with_capacity(jwks.keys.len());

        for jwk in &jwks.keys {
            if let Some(kid) = jwk.common.key_id.as_ref() {
                self.keys.insert(
                    kid.clone(),
                    CachedKey {
                        jwk: jwk.clone(),
                        expires_at,
                    },
                );
                fresh.push(kid.as_str());
            }
        }

        // Keys that left the published set are rotated out
        self.keys.retain(|kid, _| fresh.contains(&kid.as_str()));

        info!(keys = fresh.len(), "Signing key set refreshed");
    }
}

fn find_key<'a>(jwks: &'a JwkSet, kid: &str) -> Option<&'a Jwk> {
    jwks.keys
        .iter()
        .find(|key| key.common.key_id.as_deref() == Some(kid))
}

fn key_not_found(kid: &str) -> AuthError {
    AuthError::new(AuthErrorKind::KeyNotFound).with_detail(format!("no key with kid {kid:?}"))
}
