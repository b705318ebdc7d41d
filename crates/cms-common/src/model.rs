//! Site content document model
//!
//! One [`SiteContent`] exists per site. Input is accepted leniently (missing
//! weekday keys, missing optional fields, missing ids) and normalised before it
//! is stored, so readers always see the full shape.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Maximum accepted length of a site identifier
pub const MAX_SITE_ID_LEN: usize = 100;

/// Structural problem with a write payload
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }

    fn blank(field: impl Into<String>) -> Self {
        Self::new(field, "must not be blank")
    }
}

/// Site identifiers double as file names, so only `[A-Za-z0-9_-]` is allowed.
pub fn is_valid_site_id(site_id: &str) -> bool {
    !site_id.is_empty()
        && site_id.len() <= MAX_SITE_ID_LEN
        && site_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Root document for one site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteContent {
    #[serde(default)]
    pub site_id: String,
    pub business_name: String,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub hours: Hours,
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub staff: Vec<StaffMember>,
    #[serde(default)]
    pub menu_items: Vec<MenuItem>,
    #[serde(default)]
    pub promotions: Vec<Promotion>,
}

impl SiteContent {
    /// Create an empty document
    pub fn new(site_id: impl Into<String>, business_name: impl Into<String>) -> Self {
        Self {
            site_id: site_id.into(),
            business_name: business_name.into(),
            tagline: None,
            phone: None,
            email: None,
            address: None,
            hours: Hours::default(),
            services: Vec::new(),
            staff: Vec::new(),
            menu_items: Vec::new(),
            promotions: Vec::new(),
        }
    }

    /// Empty document named after its id: `"jw-cafe"` becomes `"Jw Cafe"`.
    pub fn provisioned(site_id: &str) -> Self {
        Self::new(site_id, display_name(site_id))
    }

    /// Check required fields. Does not touch ids.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.business_name.trim().is_empty() {
            return Err(ValidationError::blank("business_name"));
        }
        for (i, s) in self.services.iter().enumerate() {
            if s.title.trim().is_empty() {
                return Err(ValidationError::blank(format!("services[{}].title", i)));
            }
        }
        for (i, m) in self.staff.iter().enumerate() {
            if m.name.trim().is_empty() {
                return Err(ValidationError::blank(format!("staff[{}].name", i)));
            }
            if m.role.trim().is_empty() {
                return Err(ValidationError::blank(format!("staff[{}].role", i)));
            }
        }
        for (i, m) in self.menu_items.iter().enumerate() {
            if m.name.trim().is_empty() {
                return Err(ValidationError::blank(format!("menu_items[{}].name", i)));
            }
        }
        for (i, p) in self.promotions.iter().enumerate() {
            if p.title.trim().is_empty() {
                return Err(ValidationError::blank(format!("promotions[{}].title", i)));
            }
        }
        Ok(())
    }

    /// Give every list entry a unique id, keeping the ones already unique.
    pub fn normalize_ids(&mut self) {
        assign_ids(&mut self.services);
        assign_ids(&mut self.staff);
        assign_ids(&mut self.menu_items);
        assign_ids(&mut self.promotions);
    }
}

fn display_name(site_id: &str) -> String {
    site_id
        .split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Opening hours, one free-form string per weekday
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hours {
    #[serde(deserialize_with = "null_as_empty")]
    pub monday: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub tuesday: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub wednesday: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub thursday: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub friday: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub saturday: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub sunday: String,
}

impl Hours {
    pub fn get(&self, day: Weekday) -> &str {
        match day {
            Weekday::Monday => &self.monday,
            Weekday::Tuesday => &self.tuesday,
            Weekday::Wednesday => &self.wednesday,
            Weekday::Thursday => &self.thursday,
            Weekday::Friday => &self.friday,
            Weekday::Saturday => &self.saturday,
            Weekday::Sunday => &self.sunday,
        }
    }

    pub fn set(&mut self, day: Weekday, value: impl Into<String>) {
        let slot = match day {
            Weekday::Monday => &mut self.monday,
            Weekday::Tuesday => &mut self.tuesday,
            Weekday::Wednesday => &mut self.wednesday,
            Weekday::Thursday => &mut self.thursday,
            Weekday::Friday => &mut self.friday,
            Weekday::Saturday => &mut self.saturday,
            Weekday::Sunday => &mut self.sunday,
        };
        *slot = value.into();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Monday => "monday",
            Weekday::Tuesday => "tuesday",
            Weekday::Wednesday => "wednesday",
            Weekday::Thursday => "thursday",
            Weekday::Friday => "friday",
            Weekday::Saturday => "saturday",
            Weekday::Sunday => "sunday",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Weekday {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Weekday::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ValidationError::new("hours", format!("unknown weekday '{}'", s)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    /// Free-form, e.g. "Starting at $500"
    #[serde(default)]
    pub price: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffMember {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub price: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promotion {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    /// Omitted on input means active
    #[serde(default = "active_by_default")]
    pub active: bool,
}

fn active_by_default() -> bool {
    true
}

impl Default for Promotion {
    fn default() -> Self {
        Self {
            id: None,
            title: String::new(),
            description: String::new(),
            active: true,
        }
    }
}

/// A list entry that carries a list-local identifier
pub trait Identified {
    const ID_PREFIX: &'static str;

    fn id(&self) -> Option<&str>;
    fn set_id(&mut self, id: String);
}

macro_rules! identified {
    ($ty:ty, $prefix:literal) => {
        impl Identified for $ty {
            const ID_PREFIX: &'static str = $prefix;

            fn id(&self) -> Option<&str> {
                self.id.as_deref()
            }

            fn set_id(&mut self, id: String) {
                self.id = Some(id);
            }
        }
    };
}

identified!(Service, "svc");
identified!(StaffMember, "staff");
identified!(MenuItem, "menu");
identified!(Promotion, "promo");

fn fresh_id(prefix: &str, taken: &HashSet<String>) -> String {
    loop {
        let id = format!("{}-{}", prefix, &Uuid::new_v4().simple().to_string()[..8]);
        if !taken.contains(&id) {
            return id;
        }
    }
}

/// A fresh id for a new entry of `items`, unique within that list
pub fn new_id<T: Identified>(items: &[T]) -> String {
    let taken: HashSet<String> = items
        .iter()
        .filter_map(|item| item.id())
        .map(|id| id.trim().to_string())
        .collect();
    fresh_id(T::ID_PREFIX, &taken)
}

/// Assign ids to entries whose id is missing, blank or already used earlier in the list.
pub fn assign_ids<T: Identified>(items: &mut [T]) {
    let mut taken: HashSet<String> = HashSet::with_capacity(items.len());
    let mut needs_id = Vec::new();

    for (i, item) in items.iter().enumerate() {
        match item.id().map(str::trim) {
            Some(id) if !id.is_empty() && !taken.contains(id) => {
                taken.insert(id.to_string());
            }
            _ => needs_id.push(i),
        }
    }

    // Preserved ids are collected first so a fresh id never shadows a later one.
    for i in needs_id {
        let id = fresh_id(T::ID_PREFIX, &taken);
        taken.insert(id.clone());
        items[i].set_id(id);
    }
}
