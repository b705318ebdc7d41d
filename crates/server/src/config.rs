//! CMS server configuration

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::AuthGate;
use crate::store::JsonContentStore;

pub const DEFAULT_PORT: u16 = 8000;

/// Configuration for the CMS server
#[derive(Clone)]
pub struct CmsServerConfig {
    /// Root data directory
    pub data_dir: PathBuf,
    /// One JSON document per site
    pub sites_dir: PathBuf,
    /// Hashed passwords of sites provisioned over the API
    pub credentials_path: PathBuf,
    /// Listen address
    pub bind_addr: SocketAddr,
    /// Per-site passwords supplied by the operator, keyed by site_id
    pub site_passwords: HashMap<String, String>,
    /// Master password for provisioning; provisioning is disabled when unset
    pub admin_password: Option<String>,
    /// Server secret mixed into every token
    pub token_secret: String,
    /// CORS allow-list; empty means any origin
    pub allowed_origins: Vec<String>,
    /// bcrypt work factor for provisioned passwords
    pub bcrypt_cost: u32,
}

impl Default for CmsServerConfig {
    fn default() -> Self {
        let data_dir = cms_common::cms_root();
        Self {
            sites_dir: cms_common::sites_dir(&data_dir),
            credentials_path: cms_common::credentials_path(&data_dir),
            data_dir,
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            site_passwords: HashMap::new(),
            admin_password: None,
            token_secret: uuid::Uuid::new_v4().simple().to_string(),
            allowed_origins: Vec::new(),
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl CmsServerConfig {
    /// Create config with custom base directory
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        let base = base_dir.into();
        Self {
            sites_dir: cms_common::sites_dir(&base),
            credentials_path: cms_common::credentials_path(&base),
            data_dir: base,
            ..Self::default()
        }
    }

    /// Read `CMS_*` environment variables on top of the defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(port) = std::env::var("CMS_PORT") {
            let port: u16 = port
                .parse()
                .with_context(|| format!("Invalid CMS_PORT '{}'", port))?;
            config.bind_addr.set_port(port);
        }
        if let Ok(bind) = std::env::var("CMS_BIND") {
            let ip: IpAddr = bind
                .parse()
                .with_context(|| format!("Invalid CMS_BIND '{}'", bind))?;
            config.bind_addr.set_ip(ip);
        }
        if let Ok(list) = std::env::var("CMS_SITE_PASSWORDS") {
            config.site_passwords = parse_site_passwords(&list);
        }
        config.admin_password = std::env::var("CMS_ADMIN_PASSWORD")
            .ok()
            .filter(|p| !p.is_empty());
        match std::env::var("CMS_TOKEN_SECRET") {
            Ok(secret) if !secret.is_empty() => config.token_secret = secret,
            _ => warn!("CMS_TOKEN_SECRET not set; tokens will not survive a restart"),
        }
        if let Ok(origins) = std::env::var("CMS_ALLOWED_ORIGINS") {
            config.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty() && *o != "*")
                .map(String::from)
                .collect();
        }

        info!(
            "Loaded config: data_dir={:?}, {} configured site(s)",
            config.data_dir,
            config.site_passwords.len()
        );
        Ok(config)
    }

    /// Ensure all directories exist
    pub async fn ensure_dirs(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.sites_dir).await?;
        Ok(())
    }
}

/// Parse `site=password` pairs separated by commas.
pub fn parse_site_passwords(list: &str) -> HashMap<String, String> {
    let mut passwords = HashMap::new();
    for entry in list.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        match entry.split_once('=') {
            Some((site, password)) if cms_common::is_valid_site_id(site.trim()) => {
                passwords.insert(site.trim().to_string(), password.to_string());
            }
            _ => warn!("Ignoring malformed CMS_SITE_PASSWORDS entry"),
        }
    }
    passwords
}

/// App state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: CmsServerConfig,
    pub store: Arc<JsonContentStore>,
    pub auth: Arc<AuthGate>,
}

impl AppState {
    /// Open the store and credential table, and provision a document for
    /// every configured site that has none yet.
    pub async fn new(config: CmsServerConfig) -> Result<Self> {
        let store = Arc::new(JsonContentStore::new(&config).await?);
        let auth = Arc::new(AuthGate::new(&config).await?);

        let mut configured: Vec<_> = config.site_passwords.keys().cloned().collect();
        configured.sort();
        for site_id in configured {
            store.ensure(&site_id).await?;
        }

        Ok(Self {
            config,
            store,
            auth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_site_passwords() {
        let map = parse_site_passwords("acme=secret, jw-cafe=demo=123 ,bad entry,../x=y,");
        assert_eq!(map.len(), 2);
        assert_eq!(map["acme"], "secret");
        assert_eq!(map["jw-cafe"], "demo=123");
    }

    #[test]
    fn test_with_base_dir_layout() {
        let config = CmsServerConfig::with_base_dir("/tmp/cms");
        assert_eq!(config.sites_dir, PathBuf::from("/tmp/cms/sites"));
        assert_eq!(config.credentials_path, PathBuf::from("/tmp/cms/credentials.json"));
        assert_eq!(config.bind_addr.port(), DEFAULT_PORT);
    }
}
