//! Configuration for Coffee Shop
//!
//! CLI arguments and environment variable handling using clap.

use clap::{Parser, ValueEnum};
use jsonwebtoken::Algorithm;
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;
use uuid::Uuid;

use crate::auth::AuthSettings;

/// Coffee Shop - drink menu API
#[derive(Parser, Debug, Clone)]
#[command(name = "coffeeshop")]
#[command(about = "Drink menu API with permission-gated bearer tokens")]
pub struct Args {
    /// Unique node identifier for this instance
    #[arg(long, env = "NODE_ID", default_value_t = Uuid::new_v4())]
    pub node_id: Uuid,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:5000")]
    pub listen: SocketAddr,

    /// Token issuer domain (e.g. "tenant.us.auth0.com")
    #[arg(long, env = "AUTH0_DOMAIN")]
    pub auth0_domain: String,

    /// Expected `aud` claim
    #[arg(long, env = "API_AUDIENCE")]
    pub api_audience: String,

    /// Expected `iss` claim (defaults to https://{domain}/)
    #[arg(long, env = "AUTH0_ISSUER")]
    pub auth0_issuer: Option<String>,

    /// Key set URL (defaults to https://{domain}/.well-known/jwks.json)
    #[arg(long, env = "JWKS_URL")]
    pub jwks_url: Option<String>,

    /// How long fetched signing keys are reused, 0 fetches on every request
    #[arg(long, env = "JWKS_CACHE_TTL_SECS", default_value = "300")]
    pub jwks_cache_ttl_secs: u64,

    /// Least seconds between key set refreshes caused by an unknown key id
    #[arg(long, env = "JWKS_MIN_REFRESH_SECS", default_value = "30")]
    pub jwks_min_refresh_secs: u64,

    /// Key set fetch timeout in milliseconds
    #[arg(long, env = "JWKS_TIMEOUT_MS", default_value = "5000")]
    pub jwks_timeout_ms: u64,

    /// Allowed clock skew when checking `exp`
    #[arg(long, env = "TOKEN_LEEWAY_SECS", default_value = "0")]
    pub token_leeway_secs: u64,

    /// Drink storage backend
    #[arg(long, env = "STORE_BACKEND", value_enum, default_value_t = StoreBackend::Memory)]
    pub store_backend: StoreBackend,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "coffeeshop")]
    pub mongodb_db: String,

    /// Drop all drinks and seed the sample menu on startup
    #[arg(long, env = "RESET_DB", default_value = "false")]
    pub reset_db: bool,

    /// Maximum accepted request body size in bytes
    #[arg(long, env = "MAX_BODY_BYTES", default_value = "65536")]
    pub max_body_bytes: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Where drinks are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreBackend {
    Memory,
    Mongo,
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Memory => write!(f, "memory"),
            StoreBackend::Mongo => write!(f, "mongo"),
        }
    }
}

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

impl Args {
    /// Domain with any scheme and trailing slash removed
    fn bare_domain(&self) -> &str {
        let domain = self.auth0_domain.trim();
        let domain = domain
            .strip_prefix("https://")
            .or_else(|| domain.strip_prefix("http://"))
            .unwrap_or(domain);
        domain.trim_end_matches('/')
    }

    /// Effective issuer (falls back to https://{domain}/)
    pub fn issuer(&self) -> String {
        self.auth0_issuer
            .clone()
            .unwrap_or_else(|| format!("https://{}/", self.bare_domain()))
    }

    /// Effective key set URL (falls back to the domain's well-known JWKS)
    pub fn jwks_url(&self) -> String {
        self.jwks_url
            .clone()
            .unwrap_or_else(|| format!("https://{}/.well-known/jwks.json", self.bare_domain()))
    }

    /// Settings handed to the token authorizer
    pub fn auth_settings(&self) -> AuthSettings {
        AuthSettings {
            issuer: self.issuer(),
            audience: self.api_audience.clone(),
            algorithms: vec![Algorithm::RS256],
            leeway_secs: self.token_leeway_secs,
            key_cache_ttl: Duration::from_secs(self.jwks_cache_ttl_secs),
            key_refresh_interval: Duration::from_secs(self.jwks_min_refresh_secs),
        }
    }

    /// Timeout for a single key set fetch
    pub fn jwks_timeout(&self) -> Duration {
        Duration::from_millis(self.jwks_timeout_ms)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.bare_domain().is_empty() {
            return Err("AUTH0_DOMAIN must not be empty".to_string());
        }

        if self.api_audience.trim().is_empty() {
            return Err("API_AUDIENCE must not be empty".to_string());
        }

        if self.jwks_timeout_ms == 0 {
            return Err("JWKS_TIMEOUT_MS must be greater than zero".to_string());
        }

        if self.max_body_bytes == 0 {
            return Err("MAX_BODY_BYTES must be greater than zero".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec![
            "coffeeshop",
            "--auth0-domain",
            "tenant.example.com",
            "--api-audience",
            "drinks",
        ];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_derived_urls() {
        let args = parse(&[]);
        assert_eq!(args.issuer(), "https://tenant.example.com/");
        assert_eq!(
            args.jwks_url(),
            "https://tenant.example.com/.well-known/jwks.json"
        );
    }

    #[test]
    fn test_domain_with_scheme_and_slash() {
        let mut args = parse(&[]);
        args.auth0_domain = "https://tenant.example.com/".into();
        assert_eq!(args.issuer(), "https://tenant.example.com/");
    }

    #[test]
    fn test_explicit_overrides() {
        let args = parse(&[
            "--auth0-issuer",
            "http://127.0.0.1:9000/",
            "--jwks-url",
            "http://127.0.0.1:9000/keys",
        ]);
        assert_eq!(args.issuer(), "http://127.0.0.1:9000/");
        assert_eq!(args.jwks_url(), "http://127.0.0.1:9000/keys");
    }

    #[test]
    fn test_auth_settings() {
        let args = parse(&["--jwks-cache-ttl-secs", "0", "--token-leeway-secs", "5"]);
        let settings = args.auth_settings();
        assert_eq!(settings.audience, "drinks");
        assert_eq!(settings.algorithms, vec![Algorithm::RS256]);
        assert_eq!(settings.leeway_secs, 5);
        assert!(settings.key_cache_ttl.is_zero());
        assert_eq!(settings.key_refresh_interval, Duration::from_secs(30));
    }

    #[test]
    fn test_validation() {
        assert!(parse(&[]).validate().is_ok());

        let mut args = parse(&[]);
        args.api_audience = " ".into();
        assert!(args.validate().is_err());

        let args = parse(&["--max-body-bytes", "0"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_store_backend_parse() {
        let args = parse(&["--store-backend", "mongo"]);
        assert_eq!(args.store_backend, StoreBackend::Mongo);
        assert_eq!(args.store_backend.to_string(), "mongo");
    }
}
