//! Routing table keyed by (resource, method) and the dispatch entry point.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::context::{RequestContext, DEFAULT_API_PREFIX};
use crate::environment::EnvironmentVars;
use crate::event::{HttpMethod, Invocation, ProxyEvent};
use crate::handler::RequestHandler;
use crate::response::ProxyResponse;

type HandlerKey = (String, HttpMethod);

/// Maps (resource, method) pairs to registered handlers.
///
/// Populate it at startup, then share it read-only behind an `Arc`.
pub struct RequestMapper {
    handlers: HashMap<HandlerKey, Arc<dyn RequestHandler>>,
    api_prefix: String,
    environment: Arc<EnvironmentVars>,
}

impl RequestMapper {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            environment: Arc::default(),
        }
    }

    /// Prefix that precedes the resource in request paths.
    pub fn with_api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = prefix.into();
        self
    }

    /// Environment variables exposed to handlers through `ctx.environ`.
    pub fn with_environment(mut self, environment: EnvironmentVars) -> Self {
        self.environment = Arc::new(environment);
        self
    }

    /// Register `handler` under its (resource, method).
    ///
    /// The first registration for a key wins; later ones are logged and
    /// dropped. Returns whether the handler was registered.
    pub fn add_request_handler<H>(&mut self, handler: H) -> bool
    where
        H: RequestHandler + 'static,
    {
        self.add_shared_handler(Arc::new(handler))
    }

    /// Same as [`add_request_handler`](Self::add_request_handler) for an already shared handler.
    pub fn add_shared_handler(&mut self, handler: Arc<dyn RequestHandler>) -> bool {
        let descriptor = handler.descriptor();
        let key = (descriptor.resource.clone(), descriptor.method);

        if let Some(existing) = self.handlers.get(&key) {
            tracing::warn!(
                handler = %descriptor.name,
                resource = %descriptor.resource,
                method = %descriptor.method,
                registered = %existing.descriptor().name,
                "Cannot register duplicate handler"
            );
            return false;
        }

        tracing::info!(
            handler = %descriptor.name,
            resource = %descriptor.resource,
            method = %descriptor.method,
            "Registering handler"
        );
        self.handlers.insert(key, handler);
        true
    }

    /// Exact-match lookup.
    pub fn get_handler(&self, resource: &str, method: HttpMethod) -> Option<Arc<dyn RequestHandler>> {
        self.handlers
            .get(&(resource.to_string(), method))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run one event through the full pipeline and return the finalized response.
    ///
    /// Unrouted requests get the default 404 envelope. A path without the API
    /// prefix, or a handler that panics, gets the exception envelope
    /// referencing the request id.
    pub fn dispatch(&self, event: ProxyEvent, invocation: Invocation) -> ProxyResponse {
        let mut ctx = RequestContext::new(event, invocation)
            .with_api_prefix(self.api_prefix.clone())
            .with_environment(Arc::clone(&self.environment));

        let method = ctx.method();
        let route = ctx
            .resource()
            .map(|resource| (resource.to_string(), self.get_handler(resource, method)));

        match route {
            Ok((resource, Some(handler))) => {
                tracing::debug!(
                    request_id = %ctx.request_id(),
                    handler = %handler.descriptor().name,
                    resource = %resource,
                    method = %method,
                    "Dispatching request"
                );
                let outcome =
                    panic::catch_unwind(AssertUnwindSafe(|| handler.process_request(&mut ctx)));
                if let Err(payload) = outcome {
                    let message = panic_message(payload.as_ref());
                    tracing::error!(
                        request_id = %ctx.request_id(),
                        handler = %handler.descriptor().name,
                        error = %message,
                        "Handler panicked"
                    );
                    let reference = ctx.request_id().to_string();
                    ctx.exception_response(&message, &reference);
                }
            }
            Ok((resource, None)) => {
                tracing::info!(
                    request_id = %ctx.request_id(),
                    resource = %resource,
                    method = %method,
                    "No handler registered"
                );
            }
            Err(err) => {
                let reference = ctx.request_id().to_string();
                ctx.exception_response(&err.to_string(), &reference);
            }
        }

        tracing::info!(
            request_id = %ctx.request_id(),
            status_code = ctx.response().status_code,
            elapsed_ms = ctx.elapsed().num_milliseconds(),
            "Request complete"
        );

        ctx.into_response()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Handler panicked".to_string()
    }
}

impl Default for RequestMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RequestMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut routes: Vec<String> = self
            .handlers
            .iter()
            .map(|((resource, method), handler)| {
                format!("{method} {resource} -> {}", handler.descriptor().name)
            })
            .collect();
        routes.sort();

        f.debug_struct("RequestMapper")
            .field("api_prefix", &self.api_prefix)
            .field("routes", &routes)
            .finish()
    }
}
