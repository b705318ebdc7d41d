//! Independently updatable parts of a site document

use crate::model::{Hours, MenuItem, Promotion, Service, SiteContent, StaffMember, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Hours,
    Services,
    /// Stored in `SiteContent::menu_items`
    Menu,
    Staff,
    Promotions,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Hours,
        Section::Services,
        Section::Menu,
        Section::Staff,
        Section::Promotions,
    ];

    /// Name used in URLs
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Hours => "hours",
            Section::Services => "services",
            Section::Menu => "menu",
            Section::Staff => "staff",
            Section::Promotions => "promotions",
        }
    }

    /// Name of the `SiteContent` field holding this section
    pub fn field_name(&self) -> &'static str {
        match self {
            Section::Menu => "menu_items",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Section::ALL
            .into_iter()
            .find(|sec| sec.as_str() == s)
            .ok_or_else(|| ValidationError::new("section", format!("unknown section '{}'", s)))
    }
}

/// The value of one section, serialised exactly as the bare section
/// (an `Hours` object or a list).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SectionValue {
    Hours(Hours),
    Services(Vec<Service>),
    Menu(Vec<MenuItem>),
    Staff(Vec<StaffMember>),
    Promotions(Vec<Promotion>),
}

impl SectionValue {
    pub fn section(&self) -> Section {
        match self {
            SectionValue::Hours(_) => Section::Hours,
            SectionValue::Services(_) => Section::Services,
            SectionValue::Menu(_) => Section::Menu,
            SectionValue::Staff(_) => Section::Staff,
            SectionValue::Promotions(_) => Section::Promotions,
        }
    }

    /// Parse a JSON payload as the given section. The shape is decided by
    /// `section`, never guessed from the payload.
    pub fn from_json(section: Section, value: serde_json::Value) -> Result<Self, ValidationError> {
        let invalid = |e: serde_json::Error| ValidationError::new(section.as_str(), e.to_string());
        Ok(match section {
            Section::Hours => SectionValue::Hours(serde_json::from_value(value).map_err(invalid)?),
            Section::Services => {
                SectionValue::Services(serde_json::from_value(value).map_err(invalid)?)
            }
            Section::Menu => SectionValue::Menu(serde_json::from_value(value).map_err(invalid)?),
            Section::Staff => SectionValue::Staff(serde_json::from_value(value).map_err(invalid)?),
            Section::Promotions => {
                SectionValue::Promotions(serde_json::from_value(value).map_err(invalid)?)
            }
        })
    }

    /// Copy a section out of a document
    pub fn read(doc: &SiteContent, section: Section) -> Self {
        match section {
            Section::Hours => SectionValue::Hours(doc.hours.clone()),
            Section::Services => SectionValue::Services(doc.services.clone()),
            Section::Menu => SectionValue::Menu(doc.menu_items.clone()),
            Section::Staff => SectionValue::Staff(doc.staff.clone()),
            Section::Promotions => SectionValue::Promotions(doc.promotions.clone()),
        }
    }

    /// Replace the matching section of `doc`, leaving the others untouched.
    pub fn apply(self, doc: &mut SiteContent) {
        match self {
            SectionValue::Hours(hours) => doc.hours = hours,
            SectionValue::Services(items) => doc.services = items,
            SectionValue::Menu(items) => doc.menu_items = items,
            SectionValue::Staff(items) => doc.staff = items,
            SectionValue::Promotions(items) => doc.promotions = items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_menu_maps_to_menu_items() {
        assert_eq!("menu".parse::<Section>().unwrap(), Section::Menu);
        assert_eq!(Section::Menu.field_name(), "menu_items");
        assert!("menu_items".parse::<Section>().is_err());
    }

    #[test]
    fn test_apply_only_touches_one_section() {
        let mut doc = SiteContent::new("acme", "Acme");
        doc.services.push(Service {
            title: "Repair".into(),
            ..Default::default()
        });
        let before = doc.clone();

        let menu = SectionValue::from_json(
            Section::Menu,
            json!([{ "name": "Latte", "price": "$4" }]),
        )
        .unwrap();
        menu.apply(&mut doc);

        assert_eq!(doc.menu_items.len(), 1);
        assert_eq!(doc.menu_items[0].name, "Latte");
        assert_eq!(doc.services, before.services);
        assert_eq!(doc.hours, before.hours);
    }

    #[test]
    fn test_wrong_shape_is_rejected() {
        let err =
            SectionValue::from_json(Section::Promotions, json!({ "monday": "x" })).unwrap_err();
        assert_eq!(err.field, "promotions");
    }

    #[test]
    fn test_serialises_as_bare_section() {
        let doc = SiteContent::new("acme", "Acme");
        let value = serde_json::to_value(SectionValue::read(&doc, Section::Staff)).unwrap();
        assert_eq!(value, json!([]));
    }
}
