//! proxyrr local server.
//!
//! Serves the registered handlers over plain HTTP, emulating the serverless
//! platform's proxy integration and authorizer.

use std::sync::Arc;

use tokio::net::TcpListener;

use proxyrr::api::{build_router, handlers::register_builtin, ServerState};
use proxyrr::auth::JwtAuthorizer;
use proxyrr::config::Settings;
use proxyrr::{logging, EnvironmentVars, RequestMapper};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if present)
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Note: No .env file loaded ({e})");
    }

    logging::init();

    tracing::info!("Starting proxyrr v{}", env!("CARGO_PKG_VERSION"));

    let settings = Settings::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    tracing::info!(
        host = %settings.server.host,
        port = %settings.server.port,
        api_prefix = %settings.dispatch.api_prefix,
        "Configuration loaded"
    );

    let environment = EnvironmentVars::load(&settings.environment)?;
    tracing::info!(
        declared = settings.environment.len(),
        loaded = environment.len(),
        "Environment loaded"
    );

    let mut mapper = RequestMapper::new()
        .with_api_prefix(settings.dispatch.api_prefix.clone())
        .with_environment(environment);
    register_builtin(&mut mapper);

    let authorizer = JwtAuthorizer::new(
        &settings.auth.jwt_secret,
        settings.auth.jwt_issuer.clone(),
        settings.auth.token_duration_hours,
    );

    let state = ServerState {
        mapper: Arc::new(mapper),
        authorizer,
    };
    tracing::debug!(mapper = ?state.mapper, "Routing table ready");

    let app = build_router(state);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
