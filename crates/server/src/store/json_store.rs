//! JSON-based site content storage
//!
//! Each site lives in `<sites_dir>/<site_id>.json`. Writes go to a temp
//! file that is renamed into place, and the in-memory copy is only swapped
//! after the rename succeeds.

use crate::config::CmsServerConfig;
use chrono::{DateTime, Utc};
use cms_common::{is_valid_site_id, Section, SectionValue, SiteContent, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("site '{0}' not found")]
    NotFound(String),

    #[error("site '{0}' already exists")]
    AlreadyExists(String),

    #[error("invalid document: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// On-disk record for one site
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSite {
    pub content: SiteContent,
    pub updated_at: DateTime<Utc>,
}

/// Overview entry returned by [`JsonContentStore::list`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSummary {
    pub site_id: String,
    pub business_name: String,
    pub updated_at: DateTime<Utc>,
}

/// JSON-file content store, one document per site
pub struct JsonContentStore {
    sites_dir: PathBuf,
    /// Every known site, loaded at startup
    sites: RwLock<HashMap<String, StoredSite>>,
}

impl JsonContentStore {
    /// Create a store and load existing documents
    pub async fn new(config: &CmsServerConfig) -> anyhow::Result<Self> {
        config.ensure_dirs().await?;

        let store = Self {
            sites_dir: config.sites_dir.clone(),
            sites: RwLock::new(HashMap::new()),
        };

        store.load_existing_sites().await?;

        info!(
            "JSON ContentStore initialized with {} sites",
            store.sites.read().await.len()
        );

        Ok(store)
    }

    /// Get the storage path for a site
    fn site_path(&self, site_id: &str) -> PathBuf {
        self.sites_dir.join(format!("{}.json", site_id))
    }

    /// Load all existing sites from disk
    async fn load_existing_sites(&self) -> anyhow::Result<()> {
        let mut entries = fs::read_dir(&self.sites_dir).await?;
        let mut sites = self.sites.write().await;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if !is_valid_site_id(stem) {
                warn!("Skipping {:?}: not a valid site id", path);
                continue;
            }
            match load_site_from_disk(stem, &path).await {
                Ok(site) => {
                    sites.insert(stem.to_string(), site);
                }
                Err(e) => {
                    warn!("Failed to load site from {:?}: {}", path, e);
                }
            }
        }

        info!("Loaded {} existing sites from disk", sites.len());
        Ok(())
    }

    /// Save a site to disk atomically
    async fn save_site_to_disk(&self, site: &StoredSite) -> Result<()> {
        let path = self.site_path(&site.content.site_id);
        let temp_path = path.with_extension("tmp");

        let json = serde_json::to_string_pretty(site)?;

        if let Err(e) = fs::write(&temp_path, json).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        fs::rename(&temp_path, &path).await?;

        Ok(())
    }

    /// Get a whole document
    pub async fn get(&self, site_id: &str) -> Result<SiteContent> {
        let sites = self.sites.read().await;
        sites
            .get(site_id)
            .map(|s| s.content.clone())
            .ok_or_else(|| StoreError::NotFound(site_id.to_string()))
    }

    /// Get one section of a document
    pub async fn get_section(&self, site_id: &str, section: Section) -> Result<SectionValue> {
        let sites = self.sites.read().await;
        sites
            .get(site_id)
            .map(|s| SectionValue::read(&s.content, section))
            .ok_or_else(|| StoreError::NotFound(site_id.to_string()))
    }

    pub async fn contains(&self, site_id: &str) -> bool {
        self.sites.read().await.contains_key(site_id)
    }

    /// Replace a whole document. The site must already exist.
    pub async fn put(&self, site_id: &str, mut document: SiteContent) -> Result<SiteContent> {
        let mut sites = self.sites.write().await;
        if !sites.contains_key(site_id) {
            return Err(StoreError::NotFound(site_id.to_string()));
        }

        document.validate()?;
        if document.site_id != site_id {
            if !document.site_id.is_empty() {
                warn!(
                    "Document for {} carried site_id {}; keeping the path id",
                    site_id, document.site_id
                );
            }
            document.site_id = site_id.to_string();
        }
        document.normalize_ids();

        let stored = StoredSite {
            content: document,
            updated_at: Utc::now(),
        };
        self.save_site_to_disk(&stored).await?;

        let content = stored.content.clone();
        sites.insert(site_id.to_string(), stored);

        info!("Saved site {}", site_id);
        Ok(content)
    }

    /// Replace one section, leaving the rest of the document untouched.
    pub async fn put_section(&self, site_id: &str, value: SectionValue) -> Result<SiteContent> {
        let mut sites = self.sites.write().await;
        let current = sites
            .get(site_id)
            .ok_or_else(|| StoreError::NotFound(site_id.to_string()))?;

        let section = value.section();
        let mut content = current.content.clone();
        value.apply(&mut content);
        content.normalize_ids();

        let stored = StoredSite {
            content,
            updated_at: Utc::now(),
        };
        self.save_site_to_disk(&stored).await?;

        let content = stored.content.clone();
        sites.insert(site_id.to_string(), stored);

        info!("Saved section {} of site {}", section, site_id);
        Ok(content)
    }

    /// Provision a new, empty site
    pub async fn create(&self, site_id: &str, business_name: &str) -> Result<SiteContent> {
        if !is_valid_site_id(site_id) {
            return Err(ValidationError::new("site_id", "must match [A-Za-z0-9_-]{1,100}").into());
        }
        let content = SiteContent::new(site_id, business_name);
        content.validate()?;

        let mut sites = self.sites.write().await;
        if sites.contains_key(site_id) {
            return Err(StoreError::AlreadyExists(site_id.to_string()));
        }

        let stored = StoredSite {
            content,
            updated_at: Utc::now(),
        };
        self.save_site_to_disk(&stored).await?;

        let content = stored.content.clone();
        sites.insert(site_id.to_string(), stored);

        info!("Created new site: {}", site_id);
        Ok(content)
    }

    /// Delete a site from disk and memory. Used to undo a half-finished provisioning.
    pub async fn remove(&self, site_id: &str) -> Result<()> {
        let mut sites = self.sites.write().await;
        if !sites.contains_key(site_id) {
            return Err(StoreError::NotFound(site_id.to_string()));
        }
        match fs::remove_file(self.site_path(site_id)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        sites.remove(site_id);

        info!("Removed site {}", site_id);
        Ok(())
    }

    /// Provision `site_id` with a default document unless it already exists.
    /// Returns whether a document was created.
    pub async fn ensure(&self, site_id: &str) -> Result<bool> {
        if self.contains(site_id).await {
            return Ok(false);
        }
        let name = SiteContent::provisioned(site_id).business_name;
        match self.create(site_id, &name).await {
            Ok(_) => Ok(true),
            Err(StoreError::AlreadyExists(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// All sites, sorted by id
    pub async fn list(&self) -> Vec<SiteSummary> {
        let sites = self.sites.read().await;
        let mut list: Vec<_> = sites
            .values()
            .map(|s| SiteSummary {
                site_id: s.content.site_id.clone(),
                business_name: s.content.business_name.clone(),
                updated_at: s.updated_at,
            })
            .collect();
        list.sort_by(|a, b| a.site_id.cmp(&b.site_id));
        list
    }
}

/// Load a single site from disk. The file name is authoritative for the id.
async fn load_site_from_disk(site_id: &str, path: &Path) -> Result<StoredSite> {
    let content = fs::read_to_string(path).await?;
    let mut site: StoredSite = serde_json::from_str(&content)?;
    site.content.site_id = site_id.to_string();
    site.content.normalize_ids();
    Ok(site)
}
