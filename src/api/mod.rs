//! Local HTTP server for running handlers outside the serverless platform.
//!
//! Every request is converted into a proxy event and dispatched through the
//! [`RequestMapper`](crate::mapper::RequestMapper).

pub mod handlers;
mod routes;

pub use routes::{build_router, to_proxy_event, ServerState};
