//! Route capabilities and the permission check
//!
//! Capabilities are the strings the issuer puts in a token's `permissions`
//! claim. Each protected route names exactly one.

use crate::auth::{AuthError, AuthErrorKind, Claims};

/// Read drinks with full recipes
pub const GET_DRINKS_DETAIL: &str = "get:drinks-detail";
/// Create drinks
pub const POST_DRINKS: &str = "post:drinks";
/// Modify drinks
pub const PATCH_DRINKS: &str = "patch:drinks";
/// Remove drinks
pub const DELETE_DRINKS: &str = "delete:drinks";

/// Require `permission` to be granted by the token's `permissions` claim.
pub fn check_permissions(permission: &str, claims: &Claims) -> Result<(), AuthError> {
    if claims.permissions.is_none() {
        return Err(AuthError::new(AuthErrorKind::NoPermissionsClaim));
    }

    if claims.has_permission(permission) {
        Ok(())
    } else {
        Err(AuthError::new(AuthErrorKind::PermissionNotFound)
            .with_detail(format!("{permission} not granted")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Audience;

    fn claims(permissions: Option<Vec<&str>>) -> Claims {
        Claims {
            iss: "https://tenant.example.com/".into(),
            aud: Audience::One("drinks".into()),
            exp: 0,
            sub: Some("auth0|manager".into()),
            iat: None,
            permissions: permissions.map(|p| p.into_iter().map(String::from).collect()),
            extra: Default::default(),
        }
    }

    #[test]
    fn test_granted_permission() {
        let claims = claims(Some(vec![GET_DRINKS_DETAIL, POST_DRINKS]));
        assert!(check_permissions(POST_DRINKS, &claims).is_ok());
    }

    #[test]
    fn test_missing_permissions_claim() {
        let err = check_permissions(POST_DRINKS, &claims(None)).unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::NoPermissionsClaim);
        assert_eq!(err.status_code(), hyper::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_permission_not_granted() {
        let claims = claims(Some(vec![GET_DRINKS_DETAIL]));
        let err = check_permissions(DELETE_DRINKS, &claims).unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::PermissionNotFound);
        assert_eq!(err.status_code(), hyper::StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_empty_permissions_grants_nothing() {
        let err = check_permissions(PATCH_DRINKS, &claims(Some(vec![]))).unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::PermissionNotFound);
    }

    #[test]
    fn test_match_is_exact() {
        let claims = claims(Some(vec!["post:drinks "]));
        assert!(check_permissions(POST_DRINKS, &claims).is_err());
    }
}
