//! Admin session and its persistence across restarts

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Whether the server has accepted this token since it was obtained
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
    /// Loaded from storage, not yet accepted by the server
    #[default]
    Unverified,
    /// Issued by login or accepted by an authenticated call
    Verified,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub site_id: String,
    pub token: String,
    #[serde(skip)]
    state: SessionState,
}

impl Session {
    /// A session just issued by the server
    pub fn verified(site_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            site_id: site_id.into(),
            token: token.into(),
            state: SessionState::Verified,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_verified(&self) -> bool {
        self.state == SessionState::Verified
    }

    pub fn mark_verified(&mut self) {
        self.state = SessionState::Verified;
    }
}

/// JSON file holding the `{site_id, token}` pair
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config_dir>/cms-admin/session.json`
    pub fn default_location() -> Option<Self> {
        cms_common::admin_config_dir().map(|d| Self::at(d.join("session.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load a persisted session. Always comes back unverified.
    pub fn load(&self) -> Option<Session> {
        if !self.path.exists() {
            return None;
        }

        match fs::read_to_string(&self.path) {
            Ok(content) => match serde_json::from_str::<Session>(&content) {
                Ok(session) if !session.site_id.is_empty() && !session.token.is_empty() => {
                    Some(session)
                }
                Ok(_) => None,
                Err(e) => {
                    warn!("Failed to parse session file at {:?}: {}", self.path, e);
                    None
                }
            },
            Err(e) => {
                warn!("Failed to read session file at {:?}: {}", self.path, e);
                None
            }
        }
    }

    pub fn save(&self, session: &Session) -> anyhow::Result<()> {
        cms_common::write_json_atomic(&self.path, session)
    }

    pub fn clear(&self) -> anyhow::Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_session_round_trip_comes_back_unverified() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::at(dir.path().join("admin").join("session.json"));
        assert!(store.load().is_none());

        let session = Session::verified("acme", "t0ken");
        assert!(session.is_verified());
        store.save(&session).unwrap();

        let mut loaded = store.load().unwrap();
        assert_eq!(loaded.site_id, "acme");
        assert_eq!(loaded.token, "t0ken");
        assert_eq!(loaded.state(), SessionState::Unverified);

        loaded.mark_verified();
        assert!(loaded.is_verified());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::at(dir.path().join("session.json"));
        store.save(&Session::verified("acme", "t")).unwrap();

        store.clear().unwrap();
        store.clear().unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn test_incomplete_session_is_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, r#"{"site_id":"acme","token":""}"#).unwrap();
        assert!(SessionStore::at(&path).load().is_none());

        fs::write(&path, "not json").unwrap();
        assert!(SessionStore::at(&path).load().is_none());
    }
}
