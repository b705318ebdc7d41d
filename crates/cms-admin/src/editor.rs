//! Editor state machine
//!
//! ```text
//! LoggedOut ──login──▶ Loading ──loaded──▶ Editing ◀──▶ Saving
//!     ▲                   │                    │           │
//!     └──── load failed ──┘◀────── logout ─────┴───────────┘
//! ```
//!
//! Edits stay allowed while saves are in flight. A save result never
//! replaces the local document; it only posts a notification.

use crate::api::ClientError;
use crate::document::{self, EditError, FieldValue};
use cms_common::{Section, SiteContent, Weekday};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    LoggedOut,
    Loading,
    Editing,
    /// At least one save is in flight
    Saving,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

/// Transient message for the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }
}

/// Snapshot of the document handed to one save request
#[derive(Debug, Clone)]
pub struct SaveTicket {
    pub seq: u64,
    /// Edit generation the snapshot was taken at
    generation: u64,
    /// Login the snapshot belongs to
    epoch: u64,
    pub document: SiteContent,
}

#[derive(Debug)]
pub struct Editor {
    phase: Phase,
    document: Option<SiteContent>,
    view: Section,
    /// Bumped on every edit
    generation: u64,
    /// Generation last confirmed by the server
    saved_generation: u64,
    next_seq: u64,
    in_flight: usize,
    /// Bumped on every reset so saves from an earlier login are ignored
    epoch: u64,
    notification: Option<Notification>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    pub fn new() -> Self {
        Self {
            phase: Phase::LoggedOut,
            document: None,
            view: Section::Hours,
            generation: 0,
            saved_generation: 0,
            next_seq: 0,
            in_flight: 0,
            epoch: 0,
            notification: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn document(&self) -> Option<&SiteContent> {
        self.document.as_ref()
    }

    /// True when there are edits the server has not confirmed
    pub fn is_dirty(&self) -> bool {
        self.document.is_some() && self.generation != self.saved_generation
    }

    pub fn current_section(&self) -> Section {
        self.view
    }

    pub fn select_section(&mut self, section: Section) {
        debug!("Switching to {} view", section);
        self.view = section;
    }

    pub fn notify(&mut self, notification: Notification) {
        self.notification = Some(notification);
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    /// Hand the pending notification to the UI
    pub fn take_notification(&mut self) -> Option<Notification> {
        self.notification.take()
    }

    /// Enter Loading; any previous document is dropped
    pub fn begin_loading(&mut self) {
        self.reset();
        self.phase = Phase::Loading;
    }

    /// Install a freshly fetched document. Ignored unless Loading.
    pub fn loaded(&mut self, document: SiteContent) -> bool {
        if self.phase != Phase::Loading {
            warn!("Discarding document for {} loaded outside Loading", document.site_id);
            return false;
        }
        info!("Loaded document for {}", document.site_id);
        self.document = Some(document);
        self.phase = Phase::Editing;
        true
    }

    pub fn load_failed(&mut self, err: &ClientError) {
        if self.phase != Phase::Loading {
            return;
        }
        self.reset();
        self.notify(Notification::error(format!("Failed to load content: {}", err)));
    }

    /// Replace the document with `f(current)`
    pub fn apply<F>(&mut self, f: F) -> Result<(), EditError>
    where
        F: FnOnce(&SiteContent) -> Result<SiteContent, EditError>,
    {
        if !matches!(self.phase, Phase::Editing | Phase::Saving) {
            return Err(EditError::NoDocument);
        }
        let current = self.document.as_ref().ok_or(EditError::NoDocument)?;
        let next = f(current)?;
        self.document = Some(next);
        self.generation += 1;
        Ok(())
    }

    /// Append a blank entry to the current list view
    pub fn add_entry(&mut self) -> Result<(), EditError> {
        let section = self.view;
        self.apply(|doc| document::add_entry(doc, section))
    }

    pub fn remove_entry(&mut self, index: usize) -> Result<(), EditError> {
        let section = self.view;
        self.apply(|doc| document::remove_entry(doc, section, index))
    }

    pub fn edit_field(
        &mut self,
        index: usize,
        field: &str,
        value: impl Into<FieldValue>,
    ) -> Result<(), EditError> {
        let section = self.view;
        let value = value.into();
        self.apply(|doc| document::edit_field(doc, section, index, field, value))
    }

    pub fn set_hours(&mut self, day: Weekday, value: impl Into<String>) -> Result<(), EditError> {
        let value = value.into();
        self.apply(|doc| Ok(document::set_hours(doc, day, value)))
    }

    /// Snapshot the whole document for a save request
    pub fn begin_save(&mut self) -> Result<SaveTicket, EditError> {
        if !matches!(self.phase, Phase::Editing | Phase::Saving) {
            return Err(EditError::NoDocument);
        }
        let document = self.document.clone().ok_or(EditError::NoDocument)?;

        self.next_seq += 1;
        self.in_flight += 1;
        self.phase = Phase::Saving;

        Ok(SaveTicket {
            seq: self.next_seq,
            generation: self.generation,
            epoch: self.epoch,
            document,
        })
    }

    /// Record the outcome of a save. Results may arrive in any order; the
    /// last one to arrive sets the notification.
    pub fn finish_save(&mut self, ticket: &SaveTicket, result: Result<(), ClientError>) {
        if self.phase == Phase::LoggedOut || ticket.epoch != self.epoch {
            debug!("Ignoring save #{} that finished after logout", ticket.seq);
            return;
        }

        self.in_flight = self.in_flight.saturating_sub(1);
        if self.in_flight == 0 {
            self.phase = Phase::Editing;
        }

        match result {
            Ok(()) => {
                if ticket.generation > self.saved_generation {
                    self.saved_generation = ticket.generation;
                }
                info!("Save #{} succeeded", ticket.seq);
                self.notify(Notification::success("Changes saved"));
            }
            Err(e) => {
                warn!("Save #{} failed: {}", ticket.seq, e);
                self.notify(Notification::error(format!("Save failed: {}", e)));
            }
        }
    }

    /// Drop the document and any unsaved edits. Returns whether edits were lost.
    pub fn logout(&mut self) -> bool {
        let had_unsaved = self.is_dirty();
        if had_unsaved {
            warn!("Logging out with unsaved edits");
        }
        self.reset();
        had_unsaved
    }

    fn reset(&mut self) {
        self.phase = Phase::LoggedOut;
        self.document = None;
        self.view = Section::Hours;
        self.generation = 0;
        self.saved_generation = 0;
        self.in_flight = 0;
        self.epoch += 1;
    }
}
