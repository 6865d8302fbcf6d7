//! Local server: turns HTTP requests into proxy events and dispatches them.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::{Query, State},
    http::{header::CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use serde_json::{Map, Value};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::auth::{authorize, JwtAuthorizer};
use crate::event::{Invocation, ProxyEvent};
use crate::mapper::RequestMapper;
use crate::response::ProxyResponse;

/// State shared by every request on the local server.
#[derive(Clone)]
pub struct ServerState {
    /// Routing table, read-only once the server starts.
    pub mapper: Arc<RequestMapper>,
    pub authorizer: JwtAuthorizer,
}

/// Build the router. Every path is forwarded to the mapper.
pub fn build_router(state: ServerState) -> Router {
    Router::new()
        .fallback(invoke)
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

async fn invoke(
    State(state): State<ServerState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let claims = match authorize(&headers, &state.authorizer) {
        Ok(claims) => claims,
        Err(rejection) => return rejection.into_response(),
    };

    let event = to_proxy_event(&method, &uri, claims, &body);
    let invocation = Invocation::for_event(&event);
    let reference = invocation.request_id.clone();

    // Handlers are synchronous and may block.
    let mapper = Arc::clone(&state.mapper);
    match tokio::task::spawn_blocking(move || mapper.dispatch(event, invocation)).await {
        Ok(response) => response.into_response(),
        Err(e) => {
            tracing::error!(error = %e, request_id = %reference, "Handler task failed");
            ProxyResponse::exception(&e.to_string(), &reference).into_response()
        }
    }
}

/// Shape an HTTP request the way the platform presents it to a function.
pub fn to_proxy_event(
    method: &Method,
    uri: &Uri,
    claims: Option<Map<String, Value>>,
    body: &[u8],
) -> ProxyEvent {
    let mut event = ProxyEvent::new(method.as_str(), uri.path())
        .with_request_id(uuid::Uuid::new_v4().to_string());

    if uri.query().is_some() {
        let query = Query::<HashMap<String, String>>::try_from_uri(uri)
            .map(|Query(params)| params)
            .unwrap_or_else(|e| {
                tracing::debug!(error = %e, "Ignoring unparseable query string");
                HashMap::new()
            });

        let query: Map<String, Value> = query
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect();
        event = event.with_query(Value::Object(query));
    }

    if !body.is_empty() {
        event = event.with_body(String::from_utf8_lossy(body).into_owned());
    }

    if let Some(claims) = claims {
        event = event.with_claims(claims);
    }

    event
}

impl IntoResponse for ProxyResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = status;

        let headers = response.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in &self.headers {
            match (HeaderName::try_from(name.as_str()), HeaderValue::try_from(value.as_str())) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => tracing::warn!(header = %name, "Dropping invalid response header"),
            }
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{header::AUTHORIZATION, Request};
    use tower::ServiceExt;

    use super::*;
    use crate::api::handlers::register_builtin;
    use crate::context::RequestContext;
    use crate::error::HandlerResult;
    use crate::event::HttpMethod;
    use crate::handler::{HandlerDescriptor, RequestHandler};
    use crate::response::CORS_HEADER;

    struct ExplodingHandler {
        descriptor: HandlerDescriptor,
    }

    impl RequestHandler for ExplodingHandler {
        fn descriptor(&self) -> &HandlerDescriptor {
            &self.descriptor
        }

        fn execute(&self, _ctx: &mut RequestContext) -> HandlerResult<()> {
            panic!("ledger unavailable");
        }
    }

    fn state() -> ServerState {
        let mut mapper = RequestMapper::new();
        register_builtin(&mut mapper);

        ServerState {
            mapper: Arc::new(mapper),
            authorizer: JwtAuthorizer::new("server-secret", "proxyrr".to_string(), 1),
        }
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_to_proxy_event() {
        let uri: Uri = "/dev/api/users?limit=5&sort=name".parse().unwrap();
        let event = to_proxy_event(&Method::GET, &uri, None, b"");

        assert_eq!(event.path, "/dev/api/users");
        assert_eq!(event.http_method, "GET");
        assert_eq!(event.query_string_parameters["limit"], "5");
        assert_eq!(event.query_string_parameters["sort"], "name");
        assert!(event.body.is_none());
        assert!(event.request_context.request_id.is_some());
        assert!(event.request_context.authorizer.is_none());
    }

    #[test]
    fn test_to_proxy_event_without_query() {
        let uri: Uri = "/api/echo".parse().unwrap();
        let event = to_proxy_event(&Method::POST, &uri, Some(Map::new()), br#"{"message":"hi"}"#);

        assert!(event.query_string_parameters.is_null());
        assert_eq!(event.body.as_deref(), Some(r#"{"message":"hi"}"#));
        assert!(event.request_context.authorizer.is_some());
    }

    #[tokio::test]
    async fn test_health_over_http() {
        let router = build_router(state());
        let request = Request::get("/api/health").body(Body::empty()).unwrap();

        let (status, headers, body) = send(router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[CORS_HEADER], "*");
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert_eq!(body["status"], "success");
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let router = build_router(state());
        let request = Request::get("/api/nothing-here").body(Body::empty()).unwrap();

        let (status, _, body) = send(router, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Request not supported");
    }

    #[tokio::test]
    async fn test_echo_with_bearer_token() {
        let state = state();
        let token = state.authorizer.generate_token("user-1", "alice").unwrap();
        let router = build_router(state);

        let request = Request::post("/api/echo")
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::from(r#"{"message":"hello"}"#))
            .unwrap();

        let (status, _, body) = send(router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["from"], "alice");
        assert_eq!(body["data"]["message"], "hello");
    }

    #[tokio::test]
    async fn test_protected_route_without_token() {
        let router = build_router(state());
        let request = Request::post("/api/echo")
            .body(Body::from(r#"{"message":"hello"}"#))
            .unwrap();

        let (status, _, body) = send(router, request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Authorization not configured");
    }

    #[tokio::test]
    async fn test_invalid_token_rejected_before_dispatch() {
        let router = build_router(state());
        let request = Request::get("/api/whoami")
            .header(AUTHORIZATION, "Bearer garbage")
            .body(Body::empty())
            .unwrap();

        let (status, _, body) = send(router, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "INVALID_TOKEN");
    }

    #[tokio::test]
    async fn test_handler_panic_is_exception() {
        let mut mapper = RequestMapper::new();
        register_builtin(&mut mapper);
        mapper.add_request_handler(ExplodingHandler {
            descriptor: HandlerDescriptor::new("ledger", "ledger", HttpMethod::Get).public(),
        });
        let router = build_router(ServerState {
            mapper: Arc::new(mapper),
            authorizer: JwtAuthorizer::new("server-secret", "proxyrr".to_string(), 1),
        });

        let request = Request::get("/api/ledger").body(Body::empty()).unwrap();
        let (status, headers, body) = send(router, request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(headers[CORS_HEADER], "*");
        assert!(body["Reference"].is_string());
        assert_eq!(body["Error"], "ledger unavailable");
    }

    #[tokio::test]
    async fn test_path_outside_prefix_is_exception() {
        let router = build_router(state());
        let request = Request::get("/health").body(Body::empty()).unwrap();

        let (status, _, body) = send(router, request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["Reference"].is_string());
    }
}
