//! HTTP handlers for the CMS server
//!
//! Public reads need no credentials; every admin write is gated by a
//! site token (see [`crate::ctx::SiteCtx`]).

pub mod admin;
pub mod auth;
pub mod sites;

// Re-export AppState from config
pub use crate::config::AppState;

// Auth handlers
pub use auth::login;

// Public read handlers
pub use sites::{get_section, get_site, list_sites};

// Admin write handlers
pub use admin::{create_site, put_section, put_site};
