//! API Router
//!
//! Public reads under `/api/sites`, login under `/api/auth`,
//! token-gated writes under `/api/admin`.

use crate::config::AppState;
use crate::handlers;
use axum::{
    routing::{get, post, put},
    Router,
};

pub fn router() -> Router<AppState> {
    Router::new()
        // Public routes
        .route("/api/sites", get(handlers::list_sites))
        .route("/api/sites/{site_id}", get(handlers::get_site))
        .route("/api/sites/{site_id}/{section}", get(handlers::get_section))
        // Auth routes
        .route("/api/auth/login", post(handlers::login))
        // Admin routes
        .route("/api/admin/sites", post(handlers::create_site))
        .route("/api/admin/{site_id}", put(handlers::put_site))
        .route("/api/admin/{site_id}/{section}", put(handlers::put_section))
}
