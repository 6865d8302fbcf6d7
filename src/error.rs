//! Error types for proxyrr.
//!
//! Handlers report failures as tagged values. Everything converges on
//! [`DispatchError`], which carries the status code and error type used
//! to build the error envelope.

use thiserror::Error;

/// Domain error raised by a handler with an explicit status code, type and message.
///
/// The fields are copied verbatim into the error envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProxyError {
    /// HTTP status code of the response.
    pub code: u16,
    /// Error type reported in the envelope's `type` field.
    pub error_type: String,
    /// Human-readable message.
    pub message: String,
}

impl ProxyError {
    pub fn new(code: u16, error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            error_type: error_type.into(),
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, "BadRequest", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(401, "Unauthorized", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(403, "Forbidden", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(404, "NotFound", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(409, "Conflict", message)
    }
}

/// Error returned from [`RequestHandler::execute`](crate::handler::RequestHandler::execute).
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Domain error with an explicit code, type and message.
    #[error(transparent)]
    Proxy(#[from] ProxyError),

    #[error("Execute method must be overridden by handler '{0}'")]
    NotOverridden(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Anything else a handler wants to bubble up.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Everything that can stop a request from completing normally.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Resource prefix '{prefix}' not found in path '{path}'")]
    ResourceNotFound { prefix: String, path: String },

    /// Handler requires authentication but no authorizer claims reached the request.
    #[error("Authorization not configured")]
    AuthorizationNotConfigured,

    /// Params do not satisfy the handler's schema.
    #[error("{0}")]
    Validation(String),

    /// The handler's schema is itself malformed.
    #[error("{0}")]
    InvalidSchema(String),

    #[error(transparent)]
    Handler(#[from] HandlerError),
}

impl DispatchError {
    /// HTTP status code used for the error envelope.
    pub fn status_code(&self) -> u16 {
        match self {
            DispatchError::Validation(_) => 400,
            DispatchError::Handler(HandlerError::Proxy(err)) => err.code,
            DispatchError::ResourceNotFound { .. }
            | DispatchError::AuthorizationNotConfigured
            | DispatchError::InvalidSchema(_)
            | DispatchError::Handler(_) => 500,
        }
    }

    /// Value of the envelope's `type` field.
    ///
    /// Only domain errors carry a type; everything else reports an empty one.
    pub fn error_type(&self) -> &str {
        match self {
            DispatchError::Handler(HandlerError::Proxy(err)) => err.error_type.as_str(),
            _ => "",
        }
    }
}

/// Failure while loading declared environment variables at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvironmentError {
    #[error("FATAL: Environment variable '{0}' not set")]
    MissingRequired(String),
}

/// Result type alias for handler execution.
pub type HandlerResult<T> = Result<T, HandlerError>;

/// Result type alias for the dispatch pipeline.
pub type DispatchResult<T> = Result<T, DispatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_base_error() {
        let err = ProxyError::new(500, "BaseError", "Test message");
        assert_eq!(err.code, 500);
        assert_eq!(err.error_type, "BaseError");
        assert_eq!(err.message, "Test message");
        assert_eq!(err.to_string(), "Test message");
    }

    #[test]
    fn test_proxy_error_passes_through_dispatch() {
        let err = DispatchError::from(HandlerError::from(ProxyError::conflict("taken")));
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.error_type(), "Conflict");
        assert_eq!(err.to_string(), "taken");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(DispatchError::AuthorizationNotConfigured.status_code(), 500);
        assert_eq!(DispatchError::Validation("bad".into()).status_code(), 400);
        assert_eq!(DispatchError::InvalidSchema("bad".into()).status_code(), 500);

        let other = DispatchError::from(HandlerError::from(anyhow::anyhow!("boom")));
        assert_eq!(other.status_code(), 500);
        assert_eq!(other.to_string(), "boom");
    }

    #[test]
    fn test_only_domain_errors_carry_a_type() {
        let untyped = [
            DispatchError::AuthorizationNotConfigured,
            DispatchError::Validation("\"name\" is a required property".into()),
            DispatchError::InvalidSchema("bad schema".into()),
            DispatchError::from(HandlerError::from(anyhow::anyhow!("boom"))),
            DispatchError::from(HandlerError::NotOverridden("bare".into())),
        ];
        for err in &untyped {
            assert_eq!(err.error_type(), "", "{err:?}");
        }
    }

    #[test]
    fn test_missing_prefix_matches_exception_status() {
        let err = DispatchError::ResourceNotFound {
            prefix: "/api/".into(),
            path: "/users".into(),
        };
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.error_type(), "");
    }

    #[test]
    fn test_missing_variable_message() {
        let err = EnvironmentError::MissingRequired("TABLE_NAME".to_string());
        assert_eq!(
            err.to_string(),
            "FATAL: Environment variable 'TABLE_NAME' not set"
        );
    }
}
