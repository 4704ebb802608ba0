//! Token authorizer against a static key set

mod common;

use hyper::StatusCode;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;
use tokio_test::assert_ok;

use coffeeshop::auth::{AuthErrorKind, DELETE_DRINKS, GET_DRINKS_DETAIL, PATCH_DRINKS, POST_DRINKS};
use common::*;

async fn refuse(header: Option<&str>, permission: &str) -> (AuthErrorKind, StatusCode) {
    let authorizer = authorizer(StaticKeySource::new());
    let err = authorizer.authorize(header, permission).await.unwrap_err();
    (err.kind(), err.status_code())
}

#[tokio::test]
async fn test_valid_token_returns_claims() {
    let authorizer = authorizer(StaticKeySource::new());
    let header = bearer(&token(&[GET_DRINKS_DETAIL, POST_DRINKS]));

    let claims = assert_ok!(authorizer.authorize(Some(header.as_str()), POST_DRINKS).await);
    assert!(claims.has_permission(POST_DRINKS));
    assert_eq!(claims.iss, ISSUER);
    assert!(claims.aud.contains(AUDIENCE));
    assert_eq!(claims.sub.as_deref(), Some("auth0|barista"));
}

#[tokio::test]
async fn test_audience_list_is_accepted() {
    let mut claims = claims_with(&[DELETE_DRINKS]);
    claims["aud"] = json!([AUDIENCE, "https://tenant.example.com/userinfo"]);
    let header = bearer(&mint(KID, SIGNING_KEY, &claims));

    let authorizer = authorizer(StaticKeySource::new());
    assert_ok!(authorizer.authorize(Some(header.as_str()), DELETE_DRINKS).await);
}

#[tokio::test]
async fn test_missing_header() {
    assert_eq!(
        refuse(None, GET_DRINKS_DETAIL).await,
        (AuthErrorKind::MissingHeader, StatusCode::UNAUTHORIZED)
    );
}

#[tokio::test]
async fn test_bad_header_shapes() {
    let token = token(&[GET_DRINKS_DETAIL]);
    let headers = [
        format!("Basic {token}"),
        format!("bearer {token}"),
        "Bearer".to_string(),
        format!("Bearer {token} extra"),
        String::new(),
    ];

    for header in headers {
        assert_eq!(
            refuse(Some(header.as_str()), GET_DRINKS_DETAIL).await,
            (AuthErrorKind::InvalidHeaderFormat, StatusCode::UNAUTHORIZED),
            "{header:?}"
        );
    }
}

#[tokio::test]
async fn test_malformed_token() {
    assert_eq!(
        refuse(Some("Bearer not-a-jwt"), GET_DRINKS_DETAIL).await,
        (AuthErrorKind::MalformedToken, StatusCode::UNAUTHORIZED)
    );
}

#[tokio::test]
async fn test_disallowed_algorithm_is_malformed() {
    let mut header = Header::new(jsonwebtoken::Algorithm::HS256);
    header.kid = Some(KID.to_string());
    let token = encode(
        &header,
        &claims_with(&[GET_DRINKS_DETAIL]),
        &EncodingKey::from_secret(b"shared-secret"),
    )
    .unwrap();

    assert_eq!(
        refuse(Some(bearer(&token).as_str()), GET_DRINKS_DETAIL).await,
        (AuthErrorKind::MalformedToken, StatusCode::UNAUTHORIZED)
    );
}

#[tokio::test]
async fn test_unknown_kid() {
    let token = mint("retired-key", SIGNING_KEY, &claims_with(&[GET_DRINKS_DETAIL]));
    assert_eq!(
        refuse(Some(bearer(&token).as_str()), GET_DRINKS_DETAIL).await,
        (AuthErrorKind::KeyNotFound, StatusCode::UNAUTHORIZED)
    );
}

#[tokio::test]
async fn test_signed_by_unpublished_key() {
    let token = mint(KID, ROGUE_KEY, &claims_with(&[GET_DRINKS_DETAIL]));
    assert_eq!(
        refuse(Some(bearer(&token).as_str()), GET_DRINKS_DETAIL).await,
        (AuthErrorKind::InvalidSignature, StatusCode::UNAUTHORIZED)
    );
}

#[tokio::test]
async fn test_tampered_payload() {
    let granted = token(&[GET_DRINKS_DETAIL]);
    let escalated = token(&[GET_DRINKS_DETAIL, DELETE_DRINKS]);

    // Header and signature of one token around the payload of another
    let granted: Vec<&str> = granted.split('.').collect();
    let escalated: Vec<&str> = escalated.split('.').collect();
    let forged = format!("{}.{}.{}", granted[0], escalated[1], granted[2]);

    assert_eq!(
        refuse(Some(bearer(&forged).as_str()), DELETE_DRINKS).await,
        (AuthErrorKind::InvalidSignature, StatusCode::UNAUTHORIZED)
    );
}

#[tokio::test]
async fn test_expired_token() {
    let mut claims = claims_with(&[GET_DRINKS_DETAIL]);
    claims["iat"] = json!(now() - 7200);
    claims["exp"] = json!(now() - 3600);
    let token = mint(KID, SIGNING_KEY, &claims);

    assert_eq!(
        refuse(Some(bearer(&token).as_str()), GET_DRINKS_DETAIL).await,
        (AuthErrorKind::ExpiredToken, StatusCode::UNAUTHORIZED)
    );
}

#[tokio::test]
async fn test_wrong_audience_or_issuer() {
    let mut wrong_aud = claims_with(&[GET_DRINKS_DETAIL]);
    wrong_aud["aud"] = json!("another-api");
    let mut wrong_iss = claims_with(&[GET_DRINKS_DETAIL]);
    wrong_iss["iss"] = json!("https://evil.example.com/");

    for claims in [wrong_aud, wrong_iss] {
        let token = mint(KID, SIGNING_KEY, &claims);
        assert_eq!(
            refuse(Some(bearer(&token).as_str()), GET_DRINKS_DETAIL).await,
            (AuthErrorKind::InvalidClaims, StatusCode::UNAUTHORIZED)
        );
    }
}

#[tokio::test]
async fn test_no_permissions_claim() {
    let mut claims = claims_with(&[]);
    claims.as_object_mut().unwrap().remove("permissions");
    let token = mint(KID, SIGNING_KEY, &claims);

    assert_eq!(
        refuse(Some(bearer(&token).as_str()), PATCH_DRINKS).await,
        (AuthErrorKind::NoPermissionsClaim, StatusCode::BAD_REQUEST)
    );
}

#[tokio::test]
async fn test_permissions_claim_of_wrong_type() {
    let mut claims = claims_with(&[]);
    claims["permissions"] = json!("patch:drinks");
    let token = mint(KID, SIGNING_KEY, &claims);

    assert_eq!(
        refuse(Some(bearer(&token).as_str()), PATCH_DRINKS).await,
        (AuthErrorKind::NoPermissionsClaim, StatusCode::BAD_REQUEST)
    );
}

#[tokio::test]
async fn test_permission_not_granted() {
    let header = bearer(&token(&[GET_DRINKS_DETAIL]));
    assert_eq!(
        refuse(Some(header.as_str()), PATCH_DRINKS).await,
        (AuthErrorKind::PermissionNotFound, StatusCode::FORBIDDEN)
    );
}

#[tokio::test]
async fn test_key_set_unavailable() {
    let authorizer = authorizer(StaticKeySource::unavailable());
    let header = bearer(&token(&[GET_DRINKS_DETAIL]));

    let err = authorizer
        .authorize(Some(header.as_str()), GET_DRINKS_DETAIL)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), AuthErrorKind::KeySetUnavailable);
    assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(err.description(), "Unable to fetch signing keys.");
}

#[tokio::test]
async fn test_signing_key_is_cached_between_requests() {
    let source = StaticKeySource::new();
    let authorizer = authorizer(source.clone());
    let header = bearer(&token(&[GET_DRINKS_DETAIL]));

    for _ in 0..3 {
        assert_ok!(authorizer.authorize(Some(header.as_str()), GET_DRINKS_DETAIL).await);
    }
    assert_eq!(source.fetches(), 1);
}

#[tokio::test]
async fn test_cache_disabled_fetches_per_request() {
    let source = StaticKeySource::new();
    let settings = test_args(&["--jwks-cache-ttl-secs", "0"]).auth_settings();
    let authorizer = coffeeshop::auth::TokenAuthorizer::new(settings, source.clone());
    let header = bearer(&token(&[GET_DRINKS_DETAIL]));

    for _ in 0..3 {
        assert_ok!(authorizer.authorize(Some(header.as_str()), GET_DRINKS_DETAIL).await);
    }
    assert_eq!(source.fetches(), 3);
}

#[tokio::test]
async fn test_unknown_key_ids_do_not_refetch_key_set() {
    let source = StaticKeySource::new();
    let authorizer = authorizer(source.clone());

    for n in 0..50 {
        let token = mint(&format!("forged-{n}"), SIGNING_KEY, &claims_with(&[DELETE_DRINKS]));
        let err = authorizer
            .authorize(Some(bearer(&token).as_str()), DELETE_DRINKS)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::KeyNotFound);
    }
    assert_eq!(source.fetches(), 1);

    // The published key keeps working from the cache
    let header = bearer(&token(&[DELETE_DRINKS]));
    assert_ok!(authorizer.authorize(Some(header.as_str()), DELETE_DRINKS).await);
    assert_eq!(source.fetches(), 1);
}
