//! Site Content CMS Server Library
//!
//! Serves one JSON content document per site: public reads for client
//! websites, token-gated writes for the admin panel.

pub mod auth;
pub mod config;
pub mod ctx;
pub mod error;
pub mod handlers;
pub mod router;
pub mod store;

use axum::{http::HeaderValue, routing::get, Json, Router};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

pub use config::{AppState, CmsServerConfig};
pub use error::{Error, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build the full application router with CORS and request tracing
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.allowed_origins);

    router::router()
        .route("/health", get(health_check))
        .route("/", get(root))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {}", o);
                None
            }
        })
        .collect();
    CorsLayer::permissive().allow_origin(AllowOrigin::list(origins))
}

/// Install the global tracing subscriber (`RUST_LOG`, default `info`)
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_err()
    {
        // Already set, ignore
    }
}

pub async fn run() -> anyhow::Result<()> {
    init_tracing();

    info!("=== Site Content CMS Server v{} ===", VERSION);

    let config = CmsServerConfig::from_env()?;
    info!("Storage directory: {:?}", config.sites_dir);
    if config.admin_password.is_none() {
        info!("CMS_ADMIN_PASSWORD not set; site provisioning over HTTP is disabled");
    }

    let addr = config.bind_addr;
    let state = AppState::new(config).await?;
    let app = app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("CMS server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok", "version": VERSION }))
}

async fn root() -> Json<Value> {
    Json(json!({ "service": "Site Content CMS", "version": VERSION }))
}
