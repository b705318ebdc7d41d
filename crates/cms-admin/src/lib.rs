//! Admin panel client for the site CMS
//!
//! Logs in to one site, keeps an editable copy of its content document and
//! pushes the whole document back on save.

pub mod api;
pub mod app;
pub mod document;
pub mod editor;
pub mod session;

pub use api::{ClientError, CmsClient};
pub use app::AdminApp;
pub use document::{EditError, FieldValue};
pub use editor::{Editor, Notification, NotificationKind, Phase, SaveTicket};
pub use session::{Session, SessionState, SessionStore};
