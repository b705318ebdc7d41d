//! Site content storage module
//!
//! Provides JSON file storage with one document per site and
//! atomic whole-document replacement.

pub mod json_store;

pub use json_store::{JsonContentStore, SiteSummary, StoreError, StoredSite};
