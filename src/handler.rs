//! Handler contract: routing descriptor plus the standard request lifecycle.

use serde_json::Value;

use crate::context::RequestContext;
use crate::error::{DispatchError, DispatchResult, HandlerError, HandlerResult};
use crate::event::HttpMethod;
use crate::validation::ValidationSchema;

/// Immutable routing and policy data for a handler.
#[derive(Debug)]
pub struct HandlerDescriptor {
    pub name: String,
    /// Path segment after the API prefix, e.g. `users`.
    pub resource: String,
    pub method: HttpMethod,
    /// Reject requests without authorizer claims. Defaults to `true`.
    pub auth_required: bool,
    pub validation_schema: Option<ValidationSchema>,
}

impl HandlerDescriptor {
    pub fn new(name: impl Into<String>, resource: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            name: name.into(),
            resource: resource.into(),
            method,
            auth_required: true,
            validation_schema: None,
        }
    }

    /// Allow unauthenticated callers.
    pub fn public(mut self) -> Self {
        self.auth_required = false;
        self
    }

    /// Validate params against `schema` before executing.
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.validation_schema = Some(ValidationSchema::new(schema));
        self
    }
}

/// A request handler registered with the [`RequestMapper`](crate::mapper::RequestMapper).
///
/// Implementors provide a descriptor and override [`execute`](Self::execute);
/// [`process_request`](Self::process_request) runs the auth check and schema
/// validation around it and turns any failure into an error envelope.
pub trait RequestHandler: Send + Sync {
    fn descriptor(&self) -> &HandlerDescriptor;

    /// Handle the request, typically finishing with `ctx.success_response(..)`.
    fn execute(&self, ctx: &mut RequestContext) -> HandlerResult<()> {
        let _ = ctx;
        Err(HandlerError::NotOverridden(self.descriptor().name.clone()))
    }

    /// Run the full lifecycle: authenticate, validate, execute.
    ///
    /// Never fails; every error ends up in `ctx`'s response.
    fn process_request(&self, ctx: &mut RequestContext) {
        if let Err(err) = run_lifecycle(self, ctx) {
            ctx.dispatch_error_response(&err);
        }
    }
}

fn run_lifecycle<H>(handler: &H, ctx: &mut RequestContext) -> DispatchResult<()>
where
    H: RequestHandler + ?Sized,
{
    let descriptor = handler.descriptor();

    if descriptor.auth_required && !ctx.is_authenticated() {
        return Err(DispatchError::AuthorizationNotConfigured);
    }

    if let Some(schema) = &descriptor.validation_schema {
        schema.validate(ctx.params())?;
    }

    handler.execute(ctx)?;
    Ok(())
}
