//! Per-request context: wraps one proxy event and accumulates its response.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::environment::EnvironmentVars;
use crate::error::{DispatchError, DispatchResult, HandlerResult};
use crate::event::{HttpMethod, Invocation, ProxyEvent, USERNAME_CLAIM};
use crate::response::ProxyResponse;

/// Prefix that precedes the resource in every routed path.
pub const DEFAULT_API_PREFIX: &str = "/api/";

/// State of a single request as it moves through the dispatch pipeline.
#[derive(Debug)]
pub struct RequestContext {
    event: ProxyEvent,
    invocation: Invocation,
    api_prefix: String,
    environment: Arc<EnvironmentVars>,
    params: Value,
    response: ProxyResponse,
}

impl RequestContext {
    /// Build a context for `event`, parsing its params up front.
    pub fn new(event: ProxyEvent, invocation: Invocation) -> Self {
        let params = parse_params(&event);

        Self {
            event,
            invocation,
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            environment: Arc::default(),
            params,
            response: ProxyResponse::default(),
        }
    }

    pub fn with_api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = prefix.into();
        self
    }

    pub fn with_environment(mut self, environment: Arc<EnvironmentVars>) -> Self {
        self.environment = environment;
        self
    }

    /// The raw inbound event.
    pub fn event(&self) -> &ProxyEvent {
        &self.event
    }

    /// Everything after the API prefix, excluding query string and fragment.
    pub fn resource(&self) -> DispatchResult<&str> {
        let path = self.event.path.as_str();
        let path = path.split(&['?', '#'][..]).next().unwrap_or(path);

        path.find(self.api_prefix.as_str())
            .map(|start| &path[start + self.api_prefix.len()..])
            .filter(|resource| !resource.is_empty())
            .ok_or_else(|| DispatchError::ResourceNotFound {
                prefix: self.api_prefix.clone(),
                path: self.event.path.clone(),
            })
    }

    pub fn method(&self) -> HttpMethod {
        HttpMethod::from_verb(&self.event.http_method)
    }

    /// Parsed JSON body (POST) or query parameters (GET).
    pub fn params(&self) -> &Value {
        &self.params
    }

    /// Look up a string param.
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }

    fn claims(&self) -> Option<&Map<String, Value>> {
        self.event
            .request_context
            .authorizer
            .as_ref()
            .and_then(|authorizer| authorizer.claims.as_ref())
    }

    /// Whether the upstream authorizer attached claims to this request.
    ///
    /// The claims themselves are trusted, not verified.
    pub fn is_authenticated(&self) -> bool {
        self.claims().is_some()
    }

    /// Username claim of the authenticated caller.
    pub fn authenticated_sub(&self) -> Option<&str> {
        self.claims()?.get(USERNAME_CLAIM)?.as_str()
    }

    /// Value of a declared environment variable.
    pub fn environ(&self, key: &str) -> Option<&str> {
        self.environment.get(key)
    }

    pub fn request_id(&self) -> &str {
        &self.invocation.request_id
    }

    /// Time since the invocation started.
    pub fn elapsed(&self) -> chrono::Duration {
        chrono::Utc::now() - self.invocation.start_time
    }

    pub fn response(&self) -> &ProxyResponse {
        &self.response
    }

    pub fn into_response(self) -> ProxyResponse {
        self.response
    }

    /// Set a 200 success envelope wrapping `data`.
    pub fn success_response<T: Serialize>(&mut self, data: T) -> HandlerResult<()> {
        let data = serde_json::to_value(data)?;
        self.response = ProxyResponse::success(data);
        Ok(())
    }

    /// Set an error envelope.
    pub fn error_response(&mut self, status_code: u16, message: &str, error_type: &str) {
        tracing::error!(
            request_id = %self.invocation.request_id,
            status_code,
            error_type,
            "{message}"
        );
        self.response = ProxyResponse::error(status_code, message, error_type);
    }

    /// Set the error envelope describing `err`.
    pub fn dispatch_error_response(&mut self, err: &DispatchError) {
        self.error_response(err.status_code(), &err.to_string(), err.error_type());
    }

    /// Set the 500 envelope used for failures outside any handler.
    pub fn exception_response(&mut self, message: &str, reference: &str) {
        tracing::error!(reference, "{message}");
        self.response = ProxyResponse::exception(message, reference);
    }
}

fn empty_params() -> Value {
    Value::Object(Map::new())
}

fn parse_params(event: &ProxyEvent) -> Value {
    match HttpMethod::from_verb(&event.http_method) {
        HttpMethod::Post => match event.body.as_deref() {
            Some(body) if !body.is_empty() => serde_json::from_str(body).unwrap_or_else(|e| {
                tracing::info!(error = %e, "No request body detected");
                empty_params()
            }),
            _ => empty_params(),
        },
        HttpMethod::Get => match &event.query_string_parameters {
            params @ Value::Object(_) => params.clone(),
            _ => empty_params(),
        },
        HttpMethod::Unsupported => empty_params(),
    }
}
