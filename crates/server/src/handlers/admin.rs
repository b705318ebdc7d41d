//! Admin write handlers
//!
//! Every write replaces state wholesale: a full document or one section.
//! Token is checked first (401), then the site (404), then the payload (400).

use crate::config::AppState;
use crate::ctx::{AdminCtx, SiteCtx};
use crate::error::{Error, Result};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use cms_common::{Section, SectionValue, SiteContent};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const RESERVED_SITE_ID: &str = "sites";

#[derive(Debug, Serialize, Deserialize)]
pub struct SaveResponse {
    pub status: String,
    pub site_id: String,
}

impl SaveResponse {
    fn saved(site_id: &str) -> Json<Self> {
        Json(Self {
            status: "saved".to_string(),
            site_id: site_id.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateSiteRequest {
    pub site_id: String,
    pub business_name: String,
    pub password: String,
}

async fn require_site(state: &AppState, site_id: &str) -> Result<()> {
    if state.store.contains(site_id).await {
        Ok(())
    } else {
        Err(Error::NotFound)
    }
}

/// PUT /api/admin/{site_id}
pub async fn put_site(
    ctx: SiteCtx,
    State(state): State<AppState>,
    payload: std::result::Result<Json<SiteContent>, JsonRejection>,
) -> Result<Json<SaveResponse>> {
    let site_id = ctx.site_id();
    info!("PUT /api/admin/{}", site_id);

    require_site(&state, site_id).await?;
    let Json(document) = payload?;

    state.store.put(site_id, document).await?;
    Ok(SaveResponse::saved(site_id))
}

/// PUT /api/admin/{site_id}/{section}
pub async fn put_section(
    ctx: SiteCtx,
    Path((_, section)): Path<(String, String)>,
    State(state): State<AppState>,
    payload: std::result::Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<SaveResponse>> {
    let site_id = ctx.site_id();
    info!("PUT /api/admin/{}/{}", site_id, section);

    let section: Section = section.parse().map_err(|_| Error::NotFound)?;
    require_site(&state, site_id).await?;
    let Json(raw) = payload?;
    let value = SectionValue::from_json(section, raw)?;

    state.store.put_section(site_id, value).await?;
    Ok(SaveResponse::saved(site_id))
}

/// POST /api/admin/sites
///
/// Provision a site and its password. Requires the master password.
pub async fn create_site(
    _admin: AdminCtx,
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateSiteRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SaveResponse>)> {
    let Json(req) = payload?;
    info!("POST /api/admin/sites - {}", req.site_id);

    if req.password.is_empty() {
        return Err(Error::Validation("password: must not be empty".to_string()));
    }
    // Shadowed by this route under /api/admin/
    if req.site_id == RESERVED_SITE_ID {
        return Err(Error::Validation(format!(
            "site_id: '{}' is reserved",
            RESERVED_SITE_ID
        )));
    }

    state.store.create(&req.site_id, &req.business_name).await?;
    if let Err(e) = state.auth.register(&req.site_id, &req.password).await {
        warn!("Password for {} was not stored; rolling back", req.site_id);
        if let Err(undo) = state.store.remove(&req.site_id).await {
            warn!("Failed to roll back site {}: {}", req.site_id, undo);
        }
        return Err(e);
    }

    Ok((
        StatusCode::CREATED,
        Json(SaveResponse {
            status: "created".to_string(),
            site_id: req.site_id,
        }),
    ))
}
