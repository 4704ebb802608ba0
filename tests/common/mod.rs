//! Shared fixtures for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use clap::Parser;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use coffeeshop::auth::{KeySource, KeySourceError, TokenAuthorizer};
use coffeeshop::store::{DrinkStore, MemoryDrinkStore};
use coffeeshop::{AppState, Args};

pub const DOMAIN: &str = "tenant.example.com";
pub const ISSUER: &str = "https://tenant.example.com/";
pub const AUDIENCE: &str = "drinks";
pub const KID: &str = "test-key";

/// Private half of the key published in [`jwk_set`]
pub const SIGNING_KEY: &str = include_str!("../fixtures/signing_key.pem");
/// A key the issuer never published
pub const ROGUE_KEY: &str = include_str!("../fixtures/rogue_key.pem");

const SIGNING_KEY_N: &str = "sjykr80Afvx7492mt0vDPsB5UF3CRJJa0YpSEXKB9X2SNCH3md6x7d1hkc7EUC-WFVVhG84CcnnF2WkOjiCumaqyi9wn6wjEAeY5n-Kd2IhruEJslvFbl3qCafyt-bVo-TErxpQRqE9guOlA3sanOcJKK4HrpxjZAODYfybLRnRYqUFFqeRDxQRSjUFuzjcLoVya-RUtnqmkRNy6HbIZDLLZdrA9gmlXtFidiQA22seDQJMCzrTZBo6b6ASKj3gTmq1HlBt1dUyy3hXhP5KRmf36fXRPss7GGnZOQuee2O5yp1bScl7NfsKOzKQLjt1dPzaq2X8XvgLofmY4nm42vQ";

/// The published key set as JSON
pub fn jwks_json() -> Value {
    json!({
        "keys": [{
            "kty": "RSA",
            "alg": "RS256",
            "use": "sig",
            "kid": KID,
            "n": SIGNING_KEY_N,
            "e": "AQAB"
        }]
    })
}

pub fn jwk_set() -> JwkSet {
    serde_json::from_value(jwks_json()).unwrap()
}

/// Serves a fixed key set, or fails every fetch
pub struct StaticKeySource {
    jwks: Option<JwkSet>,
    fetches: AtomicUsize,
}

impl StaticKeySource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            jwks: Some(jwk_set()),
            fetches: AtomicUsize::new(0),
        })
    }

    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self {
            jwks: None,
            fetches: AtomicUsize::new(0),
        })
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeySource for StaticKeySource {
    async fn fetch_keys(&self) -> Result<JwkSet, KeySourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.jwks
            .clone()
            .ok_or_else(|| KeySourceError::Unavailable("issuer unreachable".into()))
    }
}

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Valid claims for the test tenant carrying `permissions`
pub fn claims_with(permissions: &[&str]) -> Value {
    json!({
        "iss": ISSUER,
        "aud": AUDIENCE,
        "sub": "auth0|barista",
        "iat": now(),
        "exp": now() + 3600,
        "permissions": permissions,
    })
}

/// Sign `claims` as RS256 with key id `kid`
pub fn mint(kid: &str, pem: &str, claims: &Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let key = EncodingKey::from_rsa_pem(pem.as_bytes()).unwrap();
    encode(&header, claims, &key).unwrap()
}

/// A valid token granting `permissions`
pub fn token(permissions: &[&str]) -> String {
    mint(KID, SIGNING_KEY, &claims_with(permissions))
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Configuration for the test tenant; `extra` flags are appended
pub fn test_args(extra: &[&str]) -> Args {
    let mut argv = vec![
        "coffeeshop",
        "--auth0-domain",
        DOMAIN,
        "--api-audience",
        AUDIENCE,
    ];
    argv.extend_from_slice(extra);
    Args::try_parse_from(argv).unwrap()
}

pub fn authorizer(source: Arc<dyn KeySource>) -> TokenAuthorizer {
    TokenAuthorizer::new(test_args(&[]).auth_settings(), source)
}

/// App state over a seeded in-memory store and the static key set
pub async fn test_state(extra: &[&str]) -> Arc<AppState> {
    let args = test_args(extra);
    let authorizer = Arc::new(TokenAuthorizer::new(
        args.auth_settings(),
        StaticKeySource::new(),
    ));
    let store = Arc::new(MemoryDrinkStore::new());
    store.reset_with_seed().await.unwrap();
    Arc::new(AppState::new(args, authorizer, store))
}
