//! Admin panel controller: session, client and editor wired together

use crate::api::{ClientError, CmsClient};
use crate::editor::{Editor, Notification, Phase};
use crate::session::{Session, SessionStore};
use tracing::{info, warn};

pub struct AdminApp {
    client: CmsClient,
    sessions: SessionStore,
    session: Option<Session>,
    editor: Editor,
}

impl AdminApp {
    pub fn new(client: CmsClient, sessions: SessionStore) -> Self {
        Self {
            client,
            sessions,
            session: None,
            editor: Editor::new(),
        }
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut Editor {
        &mut self.editor
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Resume a persisted session, going straight to Loading.
    /// Returns whether a session was found.
    pub async fn startup(&mut self) -> bool {
        let Some(session) = self.sessions.load() else {
            return false;
        };
        info!("Resuming session for {}", session.site_id);
        self.session = Some(session);
        self.editor.begin_loading();
        self.load().await;
        true
    }

    pub async fn login(&mut self, site_id: &str, password: &str) -> Result<(), ClientError> {
        let session = match self.client.login(site_id, password).await {
            Ok(session) => session,
            Err(e) => {
                self.editor.notify(Notification::error(format!("Login failed: {}", e)));
                return Err(e);
            }
        };

        if let Err(e) = self.sessions.save(&session) {
            warn!("Failed to persist session: {}", e);
        }
        self.session = Some(session);
        self.editor.begin_loading();
        self.load().await;
        Ok(())
    }

    async fn load(&mut self) {
        let Some(site_id) = self.session.as_ref().map(|s| s.site_id.clone()) else {
            return;
        };

        match self.client.fetch_site(&site_id).await {
            Ok(document) => {
                self.editor.loaded(document);
            }
            Err(e) => {
                // A vanished site cannot be edited again with this session.
                if e == ClientError::NotFound {
                    self.forget_session();
                }
                self.editor.load_failed(&e);
            }
        }
    }

    /// Push the whole document. Failures only notify; edits are kept.
    pub async fn save(&mut self) -> Result<(), ClientError> {
        let ticket = self.editor.begin_save().map_err(|e| {
            warn!("Save refused: {}", e);
            ClientError::NoDocument
        })?;
        let Some(session) = self.session.clone() else {
            self.editor.finish_save(&ticket, Err(ClientError::Unauthorized));
            return Err(ClientError::Unauthorized);
        };

        let result = self.client.save_site(&session, &ticket.document).await;
        if result.is_ok() {
            if let Some(s) = self.session.as_mut() {
                s.mark_verified();
            }
        }
        self.editor.finish_save(&ticket, result.clone());
        result
    }

    /// Discard the document and the persisted session.
    /// Returns whether unsaved edits were dropped.
    pub fn logout(&mut self) -> bool {
        let had_unsaved = self.editor.logout();
        self.forget_session();
        info!("Logged out");
        had_unsaved
    }

    fn forget_session(&mut self) {
        self.session = None;
        if let Err(e) = self.sessions.clear() {
            warn!("Failed to clear persisted session: {}", e);
        }
    }

    pub fn phase(&self) -> Phase {
        self.editor.phase()
    }
}
