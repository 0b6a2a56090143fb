//! HTTP API gateway for Project Companion.
//!
//! Exposes the `/api/ai` routes behind HS256 JWT validation, plus an
//! unauthenticated `/health` probe. Project data comes from the upstream
//! submission service using the caller's own token; answers and summaries
//! come from the assistant.
//!
//! Built on Axum.

pub mod auth;
pub mod error;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::response::Json;
use axum::routing::{MethodRouter, get};
use axum::{Router, middleware};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use companion_assistant::{Assistant, PdfExtractor};
use companion_config::AppConfig;
use companion_core::{ProjectSource, Provider, VolatileCache};
use companion_submissions::SubmissionClient;

pub use auth::{AuthError, JwtValidator, UserInfo};
pub use error::ApiError;

/// Everything a request handler needs, built once at startup.
pub struct AppState {
    pub projects: Arc<dyn ProjectSource>,
    pub assistant: Assistant,
    pub cache: Arc<dyn VolatileCache>,
    pub jwt: JwtValidator,
}

pub type SharedState = Arc<AppState>;

/// Build the router.
///
/// Layers applied:
/// - JWT validation on every `/api/ai` route
/// - CORS for the configured origins
/// - Request body size limit (1 MB)
/// - HTTP trace logging
///
/// Every route answers with and without a trailing slash
/// (`/api/ai/projects/{id}/ask/` is what existing clients call).
pub fn build_router(state: SharedState, allowed_origins: &[String]) -> Router {
    let api = Router::new();
    let api = route_with_slash(api, "/test", get(routes::test_connection));
    let api = route_with_slash(api, "/projects", get(routes::list_projects));
    let api = route_with_slash(api, "/projects/{id}", get(routes::get_project));
    let api = route_with_slash(api, "/projects/{id}/summary", get(routes::summarize_project));
    let api = route_with_slash(api, "/projects/{id}/ask", get(routes::ask_question));
    let api = route_with_slash(api, "/cache-test", get(routes::cache_test));
    let api = api
        .layer(middleware::from_fn_with_state(state.clone(), auth::require_jwt))
        .with_state(state);

    route_with_slash(Router::new(), "/health", get(health_handler))
        .nest("/api/ai", api)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
}

fn route_with_slash<S>(router: Router<S>, path: &str, handler: MethodRouter<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .route(path, handler.clone())
        .route(&format!("{path}/"), handler)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(3600))
}

/// Start the gateway HTTP server.
///
/// Builds the cache, store, provider, extractor and upstream client once
/// and shares them through [`AppState`].
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;

    let missing = config.missing_for_serve();
    if !missing.is_empty() {
        return Err(format!("missing required settings: {}", missing.join(", ")).into());
    }

    let secret = config
        .auth
        .jwt_secret
        .as_deref()
        .ok_or("auth.jwt_secret is required")?;

    let cache = companion_cache::build_from_config(&config.cache).await;
    let store = companion_store::build_from_config(&config.store).await?;
    let provider = companion_providers::build_from_config(&config.provider)?;
    let projects = Arc::new(SubmissionClient::from_config(&config.submissions)?);

    let assistant = Assistant::new(
        cache.clone(),
        store.clone(),
        provider.clone(),
        Arc::new(PdfExtractor::new()),
        &config.assistant,
    );

    let state = Arc::new(AppState {
        projects,
        assistant,
        cache: cache.clone(),
        jwt: JwtValidator::new(secret, config.auth.leeway_secs),
    });

    let app = build_router(state, &config.gateway.allowed_origins);

    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    info!(
        addr = %addr,
        cache = cache.name(),
        store = store.name(),
        provider = provider.name(),
        model = provider.model(),
        "Gateway starting"
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
