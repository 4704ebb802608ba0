//! Token authorizer
//!
//! Turns an `Authorization` header and a required capability into verified
//! claims or a terminal [`AuthError`]. Stateless per call apart from the
//! optional signing key cache.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::auth::jwt::{decode_unverified_header, extract_bearer_token, verify_token};
use crate::auth::{check_permissions, AuthError, AuthSettings, Claims, KeyResolver, KeySource};

pub struct TokenAuthorizer {
    settings: AuthSettings,
    keys: KeyResolver,
}

impl TokenAuthorizer {
    pub fn new(settings: AuthSettings, source: Arc<dyn KeySource>) -> Self {
        let keys = KeyResolver::new(source, settings.key_cache_ttl)
            .with_min_refresh(settings.key_refresh_interval);
        Self { settings, keys }
    }

    /// Authorize a request for `required_permission`.
    ///
    /// May suspend on the key set fetch. Callers must not hold exclusive
    /// resources across this call.
    pub async fn authorize(
        &self,
        auth_header: Option<&str>,
        required_permission: &str,
    ) -> Result<Claims, AuthError> {
        let result = self.authorize_inner(auth_header, required_permission).await;

        match &result {
            Ok(claims) => debug!(
                sub = claims.sub.as_deref().unwrap_or("-"),
                permission = required_permission,
                "Request authorized"
            ),
            Err(err) => warn!(
                kind = %err.kind(),
                status = err.status_code().as_u16(),
                detail = err.detail().unwrap_or("-"),
                permission = required_permission,
                "Authorization refused"
            ),
        }

        result
    }

    async fn authorize_inner(
        &self,
        auth_header: Option<&str>,
        required_permission: &str,
    ) -> Result<Claims, AuthError> {
        let token = extract_bearer_token(auth_header)?;
        let header = decode_unverified_header(token, &self.settings.algorithms)?;
        let jwk = self.keys.resolve(&header.kid).await?;
        let claims = verify_token(token, &header, &jwk, &self.settings)?;
        check_permissions(required_permission, &claims)?;
        Ok(claims)
    }
}
