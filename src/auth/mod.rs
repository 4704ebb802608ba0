//! Authentication and authorization for Coffee Shop
//!
//! Provides:
//! - Bearer token extraction and JWT verification against the issuer's JWKS
//! - Signing key resolution with an optional per-key TTL cache
//! - Route capabilities and the permission check
//! - The error taxonomy surfaced to callers

pub mod authorizer;
pub mod error;
pub mod jwks;
pub mod jwt;
pub mod permissions;

pub use authorizer::TokenAuthorizer;
pub use error::{AuthError, AuthErrorKind};
pub use jwks::{HttpKeySource, KeyResolver, KeySource, KeySourceError};
pub use jwt::{extract_bearer_token, Audience, AuthSettings, Claims, TokenHeader};
pub use permissions::{
    check_permissions, DELETE_DRINKS, GET_DRINKS_DETAIL, PATCH_DRINKS, POST_DRINKS,
};
