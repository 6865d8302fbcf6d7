//! proxyrr - request dispatch for serverless HTTP functions.
//!
//! A proxy event is wrapped in a [`RequestContext`], resolved to a
//! [`RequestHandler`] by the [`RequestMapper`] on (resource, method), and run
//! through the handler's lifecycle: authenticate, validate params against an
//! optional JSON schema, execute, respond. Every outcome is normalized into a
//! fixed JSON envelope.
//!
//! ```
//! use proxyrr::{
//!     HandlerDescriptor, HandlerResult, HttpMethod, Invocation, ProxyEvent, RequestContext,
//!     RequestHandler, RequestMapper,
//! };
//!
//! struct ListUsers {
//!     descriptor: HandlerDescriptor,
//! }
//!
//! impl RequestHandler for ListUsers {
//!     fn descriptor(&self) -> &HandlerDescriptor {
//!         &self.descriptor
//!     }
//!
//!     fn execute(&self, ctx: &mut RequestContext) -> HandlerResult<()> {
//!         ctx.success_response(vec!["alice", "bob"])
//!     }
//! }
//!
//! let mut mapper = RequestMapper::new();
//! mapper.add_request_handler(ListUsers {
//!     descriptor: HandlerDescriptor::new("list-users", "users", HttpMethod::Get).public(),
//! });
//!
//! let event = ProxyEvent::new("GET", "/prod/api/users");
//! let response = mapper.dispatch(event, Invocation::new("request-id"));
//! assert_eq!(response.status_code, 200);
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod context;
pub mod environment;
pub mod error;
pub mod event;
pub mod handler;
pub mod logging;
pub mod mapper;
pub mod response;
pub mod validation;

pub use context::RequestContext;
pub use environment::{EnvironmentVars, VariableSpec};
pub use error::{DispatchError, HandlerError, HandlerResult, ProxyError};
pub use event::{HttpMethod, Invocation, ProxyEvent};
pub use handler::{HandlerDescriptor, RequestHandler};
pub use mapper::RequestMapper;
pub use response::ProxyResponse;
