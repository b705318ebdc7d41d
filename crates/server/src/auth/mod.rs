//! Authentication Module
//!
//! One password per site. A successful login yields a token derived from the
//! server secret, the site id and the site's credential, so it can be checked
//! later without a session table. Tokens have no expiry; they stop working when
//! the site's password or the server secret changes.

use crate::config::CmsServerConfig;
use crate::error::{Error, Result};
use anyhow::Context;
use bcrypt::{hash, verify};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Stored form of a site password
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// Supplied by the operator through configuration
    Plain(String),
    /// bcrypt hash of a password set through provisioning
    Hashed(String),
}

impl Credential {
    fn matches(&self, password: &str) -> bool {
        match self {
            Credential::Plain(expected) => {
                constant_time_eq(expected.as_bytes(), password.as_bytes())
            }
            Credential::Hashed(hash) => verify(password, hash).unwrap_or(false),
        }
    }

    /// Stable value that changes whenever the password changes
    fn fingerprint(&self) -> String {
        match self {
            Credential::Plain(password) => format!("{:x}", Sha256::digest(password.as_bytes())),
            Credential::Hashed(hash) => hash.clone(),
        }
    }
}

/// Auth gate for site writes
pub struct AuthGate {
    secret: String,
    admin_password: Option<String>,
    bcrypt_cost: u32,
    /// Verified against on login paths that have no hash of their own
    decoy_hash: String,
    credentials_path: PathBuf,
    /// Passwords from configuration
    configured: HashMap<String, String>,
    /// Hashes of provisioned sites, mirrored to `credentials_path`
    provisioned: RwLock<HashMap<String, String>>,
}

impl AuthGate {
    /// Create the gate and load provisioned credentials
    pub async fn new(config: &CmsServerConfig) -> anyhow::Result<Self> {
        let path = &config.credentials_path;
        let provisioned: HashMap<String, String> = match tokio::fs::read_to_string(path).await {
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {:?}", path))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        let decoy_hash = hash(uuid::Uuid::new_v4().simple().to_string(), config.bcrypt_cost)
            .context("Failed to prepare login hash")?;

        let gate = Self {
            secret: config.token_secret.clone(),
            admin_password: config.admin_password.clone(),
            bcrypt_cost: config.bcrypt_cost,
            decoy_hash,
            credentials_path: config.credentials_path.clone(),
            configured: config.site_passwords.clone(),
            provisioned: RwLock::new(provisioned),
        };

        info!(
            "[Auth] Initialized with {} configured and {} provisioned site(s)",
            gate.configured.len(),
            gate.provisioned.read().await.len()
        );

        Ok(gate)
    }

    /// Provisioned credentials take precedence over configured ones.
    async fn credential(&self, site_id: &str) -> Option<Credential> {
        if let Some(hash) = self.provisioned.read().await.get(site_id) {
            return Some(Credential::Hashed(hash.clone()));
        }
        self.configured
            .get(site_id)
            .map(|p| Credential::Plain(p.clone()))
    }

    fn token_for(&self, site_id: &str, credential: &Credential) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update([0u8]);
        hasher.update(site_id.as_bytes());
        hasher.update([0u8]);
        hasher.update(credential.fingerprint().as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Check a site password and issue its token.
    /// Unknown site and wrong password fail identically.
    pub async fn login(&self, site_id: &str, password: &str) -> Result<String> {
        let credential = self.credential(site_id).await;

        // Every attempt pays for exactly one bcrypt verification.
        let accepted = match &credential {
            Some(hashed @ Credential::Hashed(_)) => hashed.matches(password),
            Some(plain @ Credential::Plain(_)) => {
                self.decoy_verify(password);
                plain.matches(password)
            }
            None => {
                self.decoy_verify(password);
                false
            }
        };

        match credential {
            Some(credential) if accepted => {
                info!("[Auth] Login succeeded for {}", site_id);
                Ok(self.token_for(site_id, &credential))
            }
            _ => {
                warn!("[Auth] Login failed for {}", site_id);
                Err(Error::Unauthorized)
            }
        }
    }

    fn decoy_verify(&self, password: &str) -> bool {
        verify(password, &self.decoy_hash).unwrap_or(false)
    }

    /// Check that `token` was issued for `site_id`
    pub async fn verify(&self, site_id: &str, token: &str) -> Result<()> {
        let credential = self.credential(site_id).await.ok_or(Error::Unauthorized)?;
        let expected = self.token_for(site_id, &credential);
        if constant_time_eq(expected.as_bytes(), token.as_bytes()) {
            Ok(())
        } else {
            warn!("[Auth] Rejected token for {}", site_id);
            Err(Error::Unauthorized)
        }
    }

    /// Check the master password that guards provisioning
    pub fn verify_admin(&self, token: &str) -> Result<()> {
        match &self.admin_password {
            Some(expected) if constant_time_eq(expected.as_bytes(), token.as_bytes()) => Ok(()),
            _ => Err(Error::Unauthorized),
        }
    }

    /// Store a bcrypt hash of `password` for `site_id` and persist the table
    pub async fn register(&self, site_id: &str, password: &str) -> Result<()> {
        if password.is_empty() {
            return Err(Error::Validation("password: must not be empty".to_string()));
        }
        let password_hash = hash(password, self.bcrypt_cost)
            .context("Failed to hash password")?;

        let mut provisioned = self.provisioned.write().await;
        let mut updated = provisioned.clone();
        updated.insert(site_id.to_string(), password_hash);

        let json = serde_json::to_string_pretty(&updated).context("Failed to encode credentials")?;
        let temp_path = self.credentials_path.with_extension("tmp");
        tokio::fs::write(&temp_path, json)
            .await
            .context("Failed to write credentials")?;
        tokio::fs::rename(&temp_path, &self.credentials_path)
            .await
            .context("Failed to write credentials")?;

        *provisioned = updated;
        info!("[Auth] Registered credential for {}", site_id);
        Ok(())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
