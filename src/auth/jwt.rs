//! JWT bearer tokens for the local server's emulated authorizer.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ProxyError;

/// Claims issued in development tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID).
    pub sub: String,
    /// Username, under the claim name the dispatch layer reads.
    #[serde(rename = "cognito:username")]
    pub username: String,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
    /// Issued at time (Unix timestamp).
    pub iat: i64,
    pub iss: String,
}

/// Issues and verifies HS256 tokens, standing in for the platform's authorizer.
#[derive(Clone)]
pub struct JwtAuthorizer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    /// Token validity duration in hours.
    token_duration_hours: i64,
}

impl JwtAuthorizer {
    pub fn new(secret: &str, issuer: String, token_duration_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            token_duration_hours,
        }
    }

    /// Generate a token for a user.
    pub fn generate_token(&self, user_id: &str, username: &str) -> Result<String, ProxyError> {
        let now = Utc::now();
        let exp = now + Duration::hours(self.token_duration_hours);

        let claims = TokenClaims {
            sub: user_id.to_string(),
            username: username.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ProxyError::new(500, "TokenError", format!("Failed to generate token: {e}")))
    }

    /// Validate a token and return every claim it carries.
    pub fn validate_token(&self, token: &str) -> Result<Map<String, Value>, ProxyError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);

        let token_data: TokenData<Map<String, Value>> =
            decode(token, &self.decoding_key, &validation).map_err(|e| {
                tracing::debug!(error = %e, "JWT validation failed");
                ProxyError::unauthorized(format!("Invalid token: {e}"))
            })?;

        Ok(token_data.claims)
    }
}

impl std::fmt::Debug for JwtAuthorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtAuthorizer")
            .field("issuer", &self.issuer)
            .field("token_duration_hours", &self.token_duration_hours)
            .finish_non_exhaustive()
    }
}
