//! Bearer token parsing and verification
//!
//! Tokens are RS256 JWTs issued by the configured tenant. The unverified
//! header is read only to pick the signing key; nothing else from it is
//! trusted until the signature checks out.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::jwk::Jwk;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

use crate::auth::{AuthError, AuthErrorKind};

/// Verification settings shared by every request
#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// Expected `iss`
    pub issuer: String,
    /// Expected `aud`
    pub audience: String,
    /// Algorithms a token header may declare
    pub algorithms: Vec<Algorithm>,
    /// Clock skew tolerated on `exp`
    pub leeway_secs: u64,
    /// Signing key reuse window, zero disables caching
    pub key_cache_ttl: Duration,
    /// Least time between refreshes forced by an unknown key id
    pub key_refresh_interval: Duration,
}

/// `aud` may be a single string or a list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Audience::One(aud) => aud == audience,
            Audience::Many(auds) => auds.iter().any(|aud| aud == audience),
        }
    }
}

/// Claims of a verified token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub aud: Audience,
    pub exp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
    /// `None` when absent or not an array of strings
    #[serde(
        default,
        deserialize_with = "permissions_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub permissions: Option<Vec<String>>,
    /// Everything else the issuer put in the token
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions
            .as_ref()
            .is_some_and(|perms| perms.iter().any(|p| p == permission))
    }
}

fn permissions_or_none<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| serde_json::from_value::<Vec<String>>(value).ok()))
}

/// The parts of the unverified token header used for key selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenHeader {
    pub alg: Algorithm,
    pub kid: String,
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
///
/// The scheme must be exactly `Bearer` and the value must split into exactly
/// two whitespace-separated parts.
pub fn extract_bearer_token(auth_header: Option<&str>) -> Result<&str, AuthError> {
    let header = auth_header.ok_or_else(|| AuthError::new(AuthErrorKind::MissingHeader))?;

    let mut parts = header.split_whitespace();
    let (scheme, token) = match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) => (scheme, token),
        (None, _, _) => {
            return Err(AuthError::new(AuthErrorKind::InvalidHeaderFormat)
                .with_detail("empty authorization header"))
        }
        (Some(_), None, _) => {
            return Err(
                AuthError::new(AuthErrorKind::InvalidHeaderFormat).with_detail("token not found")
            )
        }
        (Some(_), Some(_), Some(_)) => {
            return Err(AuthError::new(AuthErrorKind::InvalidHeaderFormat)
                .with_detail("too many header parts"))
        }
    };

    if scheme != "Bearer" {
        return Err(AuthError::new(AuthErrorKind::InvalidHeaderFormat)
            .with_detail(format!("unsupported scheme {scheme:?}")));
    }

    Ok(token)
}

/// Read `alg` and `kid` from the token without verifying anything.
pub fn decode_unverified_header(
    token: &str,
    allowed: &[Algorithm],
) -> Result<TokenHeader, AuthError> {
    let header = decode_header(token).map_err(|e| {
        AuthError::new(AuthErrorKind::MalformedToken).with_detail(format!("header: {e}"))
    })?;

    if !allowed.contains(&header.alg) {
        return Err(AuthError::new(AuthErrorKind::MalformedToken)
            .with_detail(format!("algorithm {:?} not allowed", header.alg)));
    }

    let kid = header
        .kid
        .filter(|kid| !kid.is_empty())
        .ok_or_else(|| AuthError::new(AuthErrorKind::MalformedToken).with_detail("missing kid"))?;

    Ok(TokenHeader {
        alg: header.alg,
        kid,
    })
}

/// Verify signature, issuer, audience and expiry against a resolved key.
pub fn verify_token(
    token: &str,
    header: &TokenHeader,
    jwk: &Jwk,
    settings: &AuthSettings,
) -> Result<Claims, AuthError> {
    let key = DecodingKey::from_jwk(jwk).map_err(|e| {
        AuthError::new(AuthErrorKind::InvalidSignature).with_detail(format!("unusable jwk: {e}"))
    })?;

    let mut validation = Validation::new(header.alg);
    validation.set_issuer(&[settings.issuer.as_str()]);
    validation.set_audience(&[settings.audience.as_str()]);
    validation.set_required_spec_claims(&["exp", "iss", "aud"]);
    validation.leeway = settings.leeway_secs;

    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(classify)
}

/// Map a jsonwebtoken failure onto the authorization taxonomy
pub fn classify(err: jsonwebtoken::errors::Error) -> AuthError {
    let kind = match err.kind() {
        ErrorKind::ExpiredSignature => AuthErrorKind::ExpiredToken,
        ErrorKind::InvalidIssuer
        | ErrorKind::InvalidAudience
        | ErrorKind::InvalidSubject
        | ErrorKind::ImmatureSignature
        | ErrorKind::MissingRequiredClaim(_)
        | ErrorKind::Json(_) => AuthErrorKind::InvalidClaims,
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidRsaKey(_)
        | ErrorKind::InvalidEcdsaKey
        | ErrorKind::InvalidKeyFormat
        | ErrorKind::Crypto(_) => AuthErrorKind::InvalidSignature,
        _ => AuthErrorKind::MalformedToken,
    };
    AuthError::new(kind).with_detail(err.to_string())
}
