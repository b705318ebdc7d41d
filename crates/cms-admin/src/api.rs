//! HTTP client for the CMS server
//!
//! Thin wrapper around `reqwest::Client`. Every call is issued once; there
//! are no retries and no timeouts beyond what the transport imposes.

use crate::session::Session;
use cms_common::{SectionValue, SiteContent};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    #[error("invalid credentials")]
    Unauthorized,

    #[error("site not found")]
    NotFound,

    #[error("rejected by server: {0}")]
    Validation(String),

    #[error("network failure: {0}")]
    Network(String),

    /// Raised locally; no request was sent
    #[error("no document loaded")]
    NoDocument,
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Network(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    site_id: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    site_id: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

/// Client for the public and admin endpoints of one CMS server
#[derive(Debug, Clone)]
pub struct CmsClient {
    http: reqwest::Client,
    base_url: String,
}

impl CmsClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self::with_http(base_url, http))
    }

    /// Use a preconfigured `reqwest::Client` (proxy settings, TLS roots)
    pub fn with_http(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, req: RequestBuilder, session: &Session) -> RequestBuilder {
        req.header(AUTH_TOKEN_HEADER, &session.token)
    }

    /// POST /api/auth/login
    pub async fn login(&self, site_id: &str, password: &str) -> Result<Session> {
        info!("Logging in to {}", site_id);
        let resp = self
            .http
            .post(self.url("/api/auth/login"))
            .json(&LoginRequest { site_id, password })
            .send()
            .await?;
        let body: LoginResponse = read_json(resp).await?;
        Ok(Session::verified(body.site_id, body.token))
    }

    /// GET /api/sites/{site_id}
    pub async fn fetch_site(&self, site_id: &str) -> Result<SiteContent> {
        let resp = self
            .http
            .get(self.url(&format!("/api/sites/{}", site_id)))
            .send()
            .await?;
        read_json(resp).await
    }

    /// PUT /api/admin/{site_id}
    pub async fn save_site(&self, session: &Session, document: &SiteContent) -> Result<()> {
        let req = self
            .http
            .put(self.url(&format!("/api/admin/{}", session.site_id)))
            .json(document);
        let resp = self.authed(req, session).send().await?;
        check_status(resp).await.map(|_| ())
    }

    /// PUT /api/admin/{site_id}/{section}
    pub async fn save_section(&self, session: &Session, value: &SectionValue) -> Result<()> {
        let req = self
            .http
            .put(self.url(&format!(
                "/api/admin/{}/{}",
                session.site_id,
                value.section()
            )))
            .json(value);
        let resp = self.authed(req, session).send().await?;
        check_status(resp).await.map(|_| ())
    }
}

async fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let message = match resp.json::<ErrorBody>().await {
        Ok(body) => body.error.message,
        Err(_) => status.to_string(),
    };
    warn!("Request failed with {}: {}", status, message);

    Err(match status {
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
        StatusCode::NOT_FOUND => ClientError::NotFound,
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
            ClientError::Validation(message)
        }
        _ => ClientError::Network(format!("unexpected status {}", status)),
    })
}

async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let resp = check_status(resp).await?;
    resp.json::<T>()
        .await
        .map_err(|e| ClientError::Network(format!("malformed response: {}", e)))
}
