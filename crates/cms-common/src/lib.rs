//! Shared types and directory management for the site CMS
//!
//! Directory layout:
//! ```text
//! cms_data/
//! ├── sites/              # one <site_id>.json document per site
//! └── credentials.json    # bcrypt hashes of provisioned site passwords
//! ```

pub mod model;
pub mod section;

pub use model::{
    is_valid_site_id, new_id, Hours, Identified, MenuItem, Promotion, Service, SiteContent, StaffMember,
    ValidationError, Weekday,
};
pub use section::{Section, SectionValue};

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Get the CMS_ROOT directory from environment or default
pub fn cms_root() -> PathBuf {
    match std::env::var("CMS_ROOT") {
        Ok(val) if !val.trim().is_empty() => PathBuf::from(val),
        _ => PathBuf::from("cms_data"),
    }
}

pub fn sites_dir(root: &Path) -> PathBuf {
    root.join("sites")
}

pub fn credentials_path(root: &Path) -> PathBuf {
    root.join("credentials.json")
}

/// Per-user directory for the admin client (`~/.config/cms-admin` on Linux)
pub fn admin_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("cms-admin"))
}

/// Write `value` as pretty JSON through a temp file and rename, so readers
/// never observe a half-written file.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let temp_path = path.with_extension("tmp");
    let json = serde_json::to_string_pretty(value)?;
    fs::write(&temp_path, json)?;
    fs::rename(&temp_path, path)?;
    debug!("Wrote {:?}", path);
    Ok(())
}
