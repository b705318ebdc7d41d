use crate::config::AppState;
use crate::error::{Error, Result};
use axum::{
    extract::{FromRequestParts, Path},
    http::{header, request::Parts, HeaderMap},
};
use std::collections::HashMap;
use tracing::debug;

/// Token header sent by the admin panel
pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// Read the token from `X-Auth-Token`, falling back to `Authorization: Bearer`.
pub fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    if let Some(value) = headers.get(AUTH_TOKEN_HEADER) {
        return value.to_str().ok().filter(|t| !t.is_empty());
    }
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .filter(|t| !t.is_empty())
}

/// Proof that the request carries a valid token for the `{site_id}` in its path
#[derive(Clone, Debug)]
pub struct SiteCtx {
    site_id: String,
}

impl SiteCtx {
    pub fn site_id(&self) -> &str {
        &self.site_id
    }
}

impl FromRequestParts<AppState> for SiteCtx {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        debug!("EXTRACTOR: require site token");

        let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|_| Error::NotFound)?;
        let site_id = params.get("site_id").cloned().ok_or(Error::NotFound)?;

        let token = token_from_headers(&parts.headers).ok_or(Error::Unauthorized)?;
        state.auth.verify(&site_id, token).await?;

        Ok(SiteCtx { site_id })
    }
}

/// Proof that the request carries the master password
#[derive(Clone, Debug)]
pub struct AdminCtx;

impl FromRequestParts<AppState> for AdminCtx {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = token_from_headers(&parts.headers).ok_or(Error::Unauthorized)?;
        state.auth.verify_admin(token)?;
        Ok(AdminCtx)
    }
}
