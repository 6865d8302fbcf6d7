//! Built-in handlers served by the local server.

use serde_json::json;

use crate::context::RequestContext;
use crate::error::{HandlerResult, ProxyError};
use crate::event::HttpMethod;
use crate::handler::{HandlerDescriptor, RequestHandler};
use crate::mapper::RequestMapper;

/// Longest message `echo` will accept.
pub const MAX_ECHO_LENGTH: usize = 280;

/// Register every built-in handler with `mapper`.
pub fn register_builtin(mapper: &mut RequestMapper) {
    mapper.add_request_handler(HealthHandler::new());
    mapper.add_request_handler(WhoAmIHandler::new());
    mapper.add_request_handler(EchoHandler::new());
}

/// Liveness check.
///
/// GET /api/health
pub struct HealthHandler {
    descriptor: HandlerDescriptor,
}

impl HealthHandler {
    pub fn new() -> Self {
        Self {
            descriptor: HandlerDescriptor::new("health", "health", HttpMethod::Get).public(),
        }
    }
}

impl Default for HealthHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestHandler for HealthHandler {
    fn descriptor(&self) -> &HandlerDescriptor {
        &self.descriptor
    }

    fn execute(&self, ctx: &mut RequestContext) -> HandlerResult<()> {
        ctx.success_response(json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }))
    }
}

/// Identity of the caller as seen through the authorizer claims.
///
/// GET /api/whoami
pub struct WhoAmIHandler {
    descriptor: HandlerDescriptor,
}

impl WhoAmIHandler {
    pub fn new() -> Self {
        Self {
            descriptor: HandlerDescriptor::new("whoami", "whoami", HttpMethod::Get),
        }
    }
}

impl Default for WhoAmIHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestHandler for WhoAmIHandler {
    fn descriptor(&self) -> &HandlerDescriptor {
        &self.descriptor
    }

    fn execute(&self, ctx: &mut RequestContext) -> HandlerResult<()> {
        let username = ctx
            .authenticated_sub()
            .ok_or_else(|| ProxyError::forbidden("Token carries no username claim"))?
            .to_string();

        let request_id = ctx.request_id().to_string();
        ctx.success_response(json!({
            "username": username,
            "request_id": request_id,
        }))
    }
}

/// Echo a message back to the caller.
///
/// POST /api/echo
pub struct EchoHandler {
    descriptor: HandlerDescriptor,
}

impl EchoHandler {
    pub fn new() -> Self {
        let schema = json!({
            "type": "object",
            "properties": {
                "message": {"type": "string", "minLength": 1}
            },
            "required": ["message"]
        });

        Self {
            descriptor: HandlerDescriptor::new("echo", "echo", HttpMethod::Post).with_schema(schema),
        }
    }
}

impl Default for EchoHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestHandler for EchoHandler {
    fn descriptor(&self) -> &HandlerDescriptor {
        &self.descriptor
    }

    fn execute(&self, ctx: &mut RequestContext) -> HandlerResult<()> {
        let message = ctx.param_str("message").unwrap_or_default().to_string();

        if message.chars().count() > MAX_ECHO_LENGTH {
            return Err(ProxyError::new(
                413,
                "MessageTooLong",
                format!("Message exceeds {MAX_ECHO_LENGTH} characters"),
            )
            .into());
        }

        let from = ctx.authenticated_sub().map(String::from);
        ctx.success_response(json!({
            "message": message,
            "from": from,
        }))
    }
}
