//! Upstream authorizer emulation for the local server.

use axum::{
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::auth::JwtAuthorizer;

/// Rejection returned before dispatch when a bearer token is present but invalid.
#[derive(Debug, Serialize)]
pub struct AuthError {
    pub error: String,
    pub code: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, Json(self)).into_response()
    }
}

/// Resolve authorizer claims from `Authorization: Bearer <token>`.
///
/// No header means an anonymous request (`Ok(None)`); the dispatch layer
/// decides whether that is acceptable.
pub fn authorize(
    headers: &HeaderMap,
    authorizer: &JwtAuthorizer,
) -> Result<Option<Map<String, Value>>, AuthError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let token = value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| AuthError {
            error: "Malformed authorization header".to_string(),
            code: "MALFORMED_AUTHORIZATION".to_string(),
        })?;

    let claims = authorizer.validate_token(token).map_err(|e| {
        tracing::warn!(error = %e, "Rejected bearer token");
        AuthError {
            error: "Invalid or expired token".to_string(),
            code: "INVALID_TOKEN".to_string(),
        }
    })?;

    Ok(Some(claims))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn authorizer() -> JwtAuthorizer {
        JwtAuthorizer::new("middleware-secret", "proxyrr".to_string(), 1)
    }

    #[test]
    fn test_missing_header_is_anonymous() {
        let result = authorize(&HeaderMap::new(), &authorizer()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_valid_token_yields_claims() {
        let authorizer = authorizer();
        let token = authorizer.generate_token("user-1", "alice").unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );

        let claims = authorize(&headers, &authorizer).unwrap().unwrap();
        assert_eq!(claims["sub"], "user-1");
    }

    #[test]
    fn test_invalid_token_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer not-a-jwt"));

        let err = authorize(&headers, &authorizer()).unwrap_err();
        assert_eq!(err.code, "INVALID_TOKEN");
    }

    #[test]
    fn test_non_bearer_scheme_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));

        let err = authorize(&headers, &authorizer()).unwrap_err();
        assert_eq!(err.code, "MALFORMED_AUTHORIZATION");
    }
}
