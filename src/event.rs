//! Inbound proxy event types.
//!
//! Only the fields the dispatch layer reads are modelled; everything else
//! the platform sends is ignored during deserialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Claim carrying the authenticated username.
pub const USERNAME_CLAIM: &str = "cognito:username";

/// HTTP methods the dispatcher knows how to route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    /// Any verb other than GET or POST.
    Unsupported,
}

impl HttpMethod {
    /// Map a raw HTTP verb. Matching is exact: `get` is not `GET`.
    pub fn from_verb(verb: &str) -> Self {
        match verb {
            "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            _ => HttpMethod::Unsupported,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
            HttpMethod::Unsupported => write!(f, "UNSUPPORTED"),
        }
    }
}

/// Claims attached by the upstream authorizer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Authorizer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claims: Option<Map<String, Value>>,
}

/// The `requestContext` block of a proxy event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRequestContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorizer: Option<Authorizer>,
}

/// A single inbound HTTP-like event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyEvent {
    /// Full request path, e.g. `/prod/api/users`.
    pub path: String,
    /// Raw HTTP verb.
    pub http_method: String,
    /// Raw request body (JSON for POST).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Query parameters. The platform sends `null` when there are none.
    #[serde(default)]
    pub query_string_parameters: Value,
    #[serde(default)]
    pub request_context: EventRequestContext,
}

impl ProxyEvent {
    pub fn new(http_method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            http_method: http_method.into(),
            body: None,
            query_string_parameters: Value::Null,
            request_context: EventRequestContext::default(),
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_query(mut self, query: Value) -> Self {
        self.query_string_parameters = query;
        self
    }

    /// Attach authorizer claims, as the upstream authentication layer would.
    pub fn with_claims(mut self, claims: Map<String, Value>) -> Self {
        self.request_context.authorizer = Some(Authorizer {
            claims: Some(claims),
        });
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_context.request_id = Some(request_id.into());
        self
    }
}

/// Invocation metadata supplied by the hosting platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Platform request id, echoed as `Reference` in exception responses.
    pub request_id: String,
    pub start_time: DateTime<Utc>,
}

impl Invocation {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            start_time: Utc::now(),
        }
    }

    /// Use the event's own request id, or generate one.
    pub fn for_event(event: &ProxyEvent) -> Self {
        let request_id = event
            .request_context
            .request_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        Self::new(request_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_from_verb() {
        assert_eq!(HttpMethod::from_verb("GET"), HttpMethod::Get);
        assert_eq!(HttpMethod::from_verb("POST"), HttpMethod::Post);
        assert_eq!(HttpMethod::from_verb("DELETE"), HttpMethod::Unsupported);
        assert_eq!(HttpMethod::from_verb("get"), HttpMethod::Unsupported);
        assert_eq!(HttpMethod::Post.to_string(), "POST");
    }

    #[test]
    fn test_deserialize_platform_event() {
        let raw = serde_json::json!({
            "path": "/prod/api/users",
            "httpMethod": "GET",
            "body": null,
            "queryStringParameters": {"limit": "10"},
            "headers": {"Host": "example.com"},
            "requestContext": {
                "requestId": "req-1",
                "stage": "prod",
                "authorizer": {
                    "claims": {"cognito:username": "alice"}
                }
            }
        });

        let event: ProxyEvent = serde_json::from_value(raw).unwrap();
        assert_eq!(event.path, "/prod/api/users");
        assert_eq!(event.http_method, "GET");
        assert!(event.body.is_none());
        assert_eq!(event.query_string_parameters["limit"], "10");
        assert_eq!(event.request_context.request_id.as_deref(), Some("req-1"));

        let claims = event
            .request_context
            .authorizer
            .and_then(|a| a.claims)
            .unwrap();
        assert_eq!(claims[USERNAME_CLAIM], "alice");
    }

    #[test]
    fn test_minimal_event() {
        let raw = serde_json::json!({"path": "/api/health", "httpMethod": "GET"});
        let event: ProxyEvent = serde_json::from_value(raw).unwrap();
        assert!(event.query_string_parameters.is_null());
        assert!(event.request_context.authorizer.is_none());
    }

    #[test]
    fn test_invocation_uses_event_request_id() {
        let event = ProxyEvent::new("GET", "/api/x").with_request_id("abc");
        assert_eq!(Invocation::for_event(&event).request_id, "abc");

        let generated = Invocation::for_event(&ProxyEvent::new("GET", "/api/x"));
        assert!(!generated.request_id.is_empty());
    }
}
