//! Authentication for the local development server.
//!
//! The dispatch layer only reads authorizer claims. Locally, bearer JWTs
//! are verified here and turned into those claims, the way the platform's
//! authorizer would.

mod jwt;
mod middleware;

pub use jwt::*;
pub use middleware::*;
