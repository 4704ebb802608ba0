//! Authorization failures
//!
//! Every failure has a fixed kind, status code and message. Failures are
//! terminal for the request; nothing in the authorizer retries.

use hyper::StatusCode;
use serde::Serialize;
use std::fmt;

/// Why an authorization attempt was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthErrorKind {
    /// No `Authorization` header on the request
    MissingHeader,
    /// Header present but not `Bearer <token>`
    InvalidHeaderFormat,
    /// Token header could not be decoded, lacks a key id, or names a disallowed algorithm
    MalformedToken,
    /// No key in the key set carries the token's key id
    KeyNotFound,
    /// Signature does not verify against the resolved key
    InvalidSignature,
    /// `exp` is in the past
    ExpiredToken,
    /// Issuer, audience or another standard claim is wrong or missing
    InvalidClaims,
    /// Token has no usable `permissions` claim
    NoPermissionsClaim,
    /// `permissions` does not grant the route's capability
    PermissionNotFound,
    /// The key set source could not be reached or returned garbage
    KeySetUnavailable,
}

impl AuthErrorKind {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingHeader
            | Self::InvalidHeaderFormat
            | Self::MalformedToken
            | Self::KeyNotFound
            | Self::InvalidSignature
            | Self::ExpiredToken
            | Self::InvalidClaims => StatusCode::UNAUTHORIZED,
            Self::NoPermissionsClaim => StatusCode::BAD_REQUEST,
            Self::PermissionNotFound => StatusCode::FORBIDDEN,
            Self::KeySetUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::MissingHeader => "Authorization header is expected.",
            Self::InvalidHeaderFormat => "Authorization header must be bearer token.",
            Self::MalformedToken => "Authorization malformed.",
            Self::KeyNotFound => "Unable to find the appropriate key.",
            Self::InvalidSignature => "Unable to verify token signature.",
            Self::ExpiredToken => "Token expired.",
            Self::InvalidClaims => "Incorrect claims. Please, check the audience and issuer.",
            Self::NoPermissionsClaim => "Permissions not included in JWT.",
            Self::PermissionNotFound => "Permission not found.",
            Self::KeySetUnavailable => "Unable to fetch signing keys.",
        }
    }
}

impl fmt::Display for AuthErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MissingHeader => "missing_header",
            Self::InvalidHeaderFormat => "invalid_header_format",
            Self::MalformedToken => "malformed_token",
            Self::KeyNotFound => "key_not_found",
            Self::InvalidSignature => "invalid_signature",
            Self::ExpiredToken => "expired_token",
            Self::InvalidClaims => "invalid_claims",
            Self::NoPermissionsClaim => "no_permissions_claim",
            Self::PermissionNotFound => "permission_not_found",
            Self::KeySetUnavailable => "key_set_unavailable",
        };
        f.write_str(name)
    }
}

/// A refused authorization: kind, caller-facing description and status
///
/// `detail` is for logs only and never leaves the process.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {description}")]
pub struct AuthError {
    kind: AuthErrorKind,
    description: &'static str,
    status: StatusCode,
    detail: Option<String>,
}

impl AuthError {
    pub fn new(kind: AuthErrorKind) -> Self {
        Self {
            kind,
            description: kind.message(),
            status: kind.status_code(),
            detail: None,
        }
    }

    /// Attach an internal explanation for logging
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn kind(&self) -> AuthErrorKind {
        self.kind
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

impl From<AuthErrorKind> for AuthError {
    fn from(kind: AuthErrorKind) -> Self {
        Self::new(kind)
    }
}
