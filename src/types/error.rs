//! Error types for Coffee Shop
//!
//! Every variant maps to a status code and renders as the JSON envelope
//! `{success: false, error: <status>, message: <text>}`.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::auth::AuthError;
use crate::model::ModelError;
use crate::store::StoreError;

/// Body of every error response
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: u16,
    pub message: &'static str,
}

/// Main error type for Coffee Shop operations
#[derive(Debug, thiserror::Error)]
pub enum CoffeeShopError {
    #[error("Authorization error: {0}")]
    Auth(#[from] AuthError),

    #[error("Not found")]
    NotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Request body exceeds {0} bytes")]
    PayloadTooLarge(usize),

    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoffeeShopError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Auth(err) => err.status_code(),
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Database(_) | Self::Config(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Caller-facing message. Internal detail stays in the logs.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::Auth(err) => err.description(),
            Self::NotFound => "resource not found",
            Self::MethodNotAllowed => "method not allowed",
            Self::BadRequest(_) => "bad request",
            Self::PayloadTooLarge(_) => "payload too large",
            Self::Unprocessable(_) => "unprocessable",
            Self::Database(_) | Self::Config(_) | Self::Internal(_) => "internal server error",
        }
    }

    /// Render the error envelope
    pub fn into_response(self) -> Response<Full<Bytes>> {
        let status = self.status_code();
        let envelope = ErrorEnvelope {
            success: false,
            error: status.as_u16(),
            message: self.public_message(),
        };
        let body = serde_json::to_string(&envelope)
            .unwrap_or_else(|_| r#"{"success":false}"#.to_string());

        Response::builder()
            .status(status)
            .header("Content-Type", "application/json")
            .body(Full::new(Bytes::from(body)))
            .unwrap()
    }
}

impl From<std::io::Error> for CoffeeShopError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<hyper::Error> for CoffeeShopError {
    fn from(err: hyper::Error) -> Self {
        Self::Internal(format!("HTTP error: {}", err))
    }
}

impl From<serde_json::Error> for CoffeeShopError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadRequest(format!("JSON error: {}", err))
    }
}

impl From<mongodb::error::Error> for CoffeeShopError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<ModelError> for CoffeeShopError {
    fn from(err: ModelError) -> Self {
        Self::Unprocessable(err.to_string())
    }
}

impl From<StoreError> for CoffeeShopError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => Self::NotFound,
            StoreError::Conflict(msg) | StoreError::Invalid(msg) => Self::Unprocessable(msg),
            StoreError::Backend(msg) => Self::Database(msg),
        }
    }
}

/// Result type alias for Coffee Shop operations
pub type Result<T> = std::result::Result<T, CoffeeShopError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthErrorKind;
    use http_body_util::BodyExt;

    async fn body_json(response: Response<Full<Bytes>>) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_auth_error_envelope() {
        let err = CoffeeShopError::from(AuthError::new(AuthErrorKind::MissingHeader));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({
                "success": false,
                "error": 401,
                "message": "Authorization header is expected."
            })
        );
    }

    #[tokio::test]
    async fn test_internal_detail_not_exposed() {
        let response = CoffeeShopError::Database("connection refused".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["message"], "internal server error");
    }

    #[test]
    fn test_store_error_mapping() {
        assert_eq!(
            CoffeeShopError::from(StoreError::NotFound(3)).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            CoffeeShopError::from(StoreError::Conflict("title taken".into())).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            CoffeeShopError::from(StoreError::Backend("down".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_route_errors() {
        assert_eq!(CoffeeShopError::NotFound.public_message(), "resource not found");
        assert_eq!(
            CoffeeShopError::MethodNotAllowed.status_code(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            CoffeeShopError::BadRequest("missing title".into()).public_message(),
            "bad request"
        );
    }
}
