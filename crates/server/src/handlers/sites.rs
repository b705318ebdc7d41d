//! Public read handlers
//!
//! Client websites fetch their content here. No credentials, no side effects.

use crate::config::AppState;
use crate::error::{Error, Result};
use crate::store::SiteSummary;
use axum::{
    extract::{Path, State},
    Json,
};
use cms_common::{Section, SectionValue, SiteContent};
use tracing::info;

/// GET /api/sites
pub async fn list_sites(State(state): State<AppState>) -> Json<Vec<SiteSummary>> {
    info!("GET /api/sites");
    Json(state.store.list().await)
}

/// GET /api/sites/{site_id}
pub async fn get_site(
    Path(site_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<SiteContent>> {
    info!("GET /api/sites/{}", site_id);
    Ok(Json(state.store.get(&site_id).await?))
}

/// GET /api/sites/{site_id}/{section}
pub async fn get_section(
    Path((site_id, section)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<SectionValue>> {
    info!("GET /api/sites/{}/{}", site_id, section);
    let section: Section = section.parse().map_err(|_| Error::NotFound)?;
    Ok(Json(state.store.get_section(&site_id, section).await?))
}
