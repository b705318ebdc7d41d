//! Pure editing operations on a site document
//!
//! Every operation takes the current document by reference and returns the
//! edited copy, so section views never alias one another's state. List
//! entries are addressed by position; removing one shifts the rest down.

use cms_common::{
    new_id, Identified, MenuItem, Promotion, Section, Service, SiteContent, StaffMember, Weekday,
};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("index {index} out of range for {section} ({len} entries)")]
    IndexOutOfRange {
        section: Section,
        index: usize,
        len: usize,
    },

    #[error("{section} has no editable field '{field}'")]
    UnknownField { section: Section, field: String },

    #[error("wrong value type for field '{field}'")]
    WrongType { field: String },

    #[error("{0} is not a list section")]
    NotAList(Section),

    #[error("no document loaded")]
    NoDocument,
}

/// New value for one field of a list entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    OptionalText(Option<String>),
    Flag(bool),
}

impl FieldValue {
    fn into_text(self, field: &str) -> Result<String, EditError> {
        match self {
            FieldValue::Text(s) | FieldValue::OptionalText(Some(s)) => Ok(s),
            _ => Err(EditError::WrongType {
                field: field.to_string(),
            }),
        }
    }

    /// Empty text clears an optional field
    fn into_optional(self, field: &str) -> Result<Option<String>, EditError> {
        match self {
            FieldValue::Text(s) => Ok(Some(s).filter(|s| !s.is_empty())),
            FieldValue::OptionalText(o) => Ok(o),
            FieldValue::Flag(_) => Err(EditError::WrongType {
                field: field.to_string(),
            }),
        }
    }

    fn into_flag(self, field: &str) -> Result<bool, EditError> {
        match self {
            FieldValue::Flag(b) => Ok(b),
            _ => Err(EditError::WrongType {
                field: field.to_string(),
            }),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Flag(b)
    }
}

/// A list entry the editor can create blank and edit field by field.
/// The `id` is minted when the entry is added and is not editable.
pub trait Entry: Clone + Default + Identified {
    const SECTION: Section;

    fn set_field(&mut self, field: &str, value: FieldValue) -> Result<(), EditError>;
}

fn unknown<T: Entry>(field: &str) -> EditError {
    EditError::UnknownField {
        section: T::SECTION,
        field: field.to_string(),
    }
}

impl Entry for Service {
    const SECTION: Section = Section::Services;

    fn set_field(&mut self, field: &str, value: FieldValue) -> Result<(), EditError> {
        match field {
            "title" => self.title = value.into_text(field)?,
            "description" => self.description = value.into_text(field)?,
            "price" => self.price = value.into_optional(field)?,
            _ => return Err(unknown::<Self>(field)),
        }
        Ok(())
    }
}

impl Entry for StaffMember {
    const SECTION: Section = Section::Staff;

    fn set_field(&mut self, field: &str, value: FieldValue) -> Result<(), EditError> {
        match field {
            "name" => self.name = value.into_text(field)?,
            "role" => self.role = value.into_text(field)?,
            "bio" => self.bio = value.into_optional(field)?,
            _ => return Err(unknown::<Self>(field)),
        }
        Ok(())
    }
}

impl Entry for MenuItem {
    const SECTION: Section = Section::Menu;

    fn set_field(&mut self, field: &str, value: FieldValue) -> Result<(), EditError> {
        match field {
            "name" => self.name = value.into_text(field)?,
            "price" => self.price = value.into_text(field)?,
            "description" => self.description = value.into_optional(field)?,
            "category" => self.category = value.into_optional(field)?,
            _ => return Err(unknown::<Self>(field)),
        }
        Ok(())
    }
}

impl Entry for Promotion {
    const SECTION: Section = Section::Promotions;

    fn set_field(&mut self, field: &str, value: FieldValue) -> Result<(), EditError> {
        match field {
            "title" => self.title = value.into_text(field)?,
            "description" => self.description = value.into_text(field)?,
            "active" => self.active = value.into_flag(field)?,
            _ => return Err(unknown::<Self>(field)),
        }
        Ok(())
    }
}

enum ListOp<'a> {
    Add,
    Remove(usize),
    Edit(usize, &'a str, FieldValue),
}

impl ListOp<'_> {
    fn apply<T: Entry>(self, items: &mut Vec<T>) -> Result<(), EditError> {
        let check = |index: usize, len: usize| {
            if index < len {
                Ok(())
            } else {
                Err(EditError::IndexOutOfRange {
                    section: T::SECTION,
                    index,
                    len,
                })
            }
        };

        match self {
            ListOp::Add => {
                let mut entry = T::default();
                entry.set_id(new_id(items.as_slice()));
                items.push(entry);
            }
            ListOp::Remove(index) => {
                check(index, items.len())?;
                items.remove(index);
            }
            ListOp::Edit(index, field, value) => {
                check(index, items.len())?;
                items[index].set_field(field, value)?;
            }
        }
        Ok(())
    }
}

fn list_op(doc: &SiteContent, section: Section, op: ListOp<'_>) -> Result<SiteContent, EditError> {
    let mut next = doc.clone();
    match section {
        Section::Hours => return Err(EditError::NotAList(section)),
        Section::Services => op.apply(&mut next.services)?,
        Section::Menu => op.apply(&mut next.menu_items)?,
        Section::Staff => op.apply(&mut next.staff)?,
        Section::Promotions => op.apply(&mut next.promotions)?,
    }
    Ok(next)
}

/// Append a blank entry with a fresh id to a list section
pub fn add_entry(doc: &SiteContent, section: Section) -> Result<SiteContent, EditError> {
    list_op(doc, section, ListOp::Add)
}

/// Remove the entry at `index`
pub fn remove_entry(
    doc: &SiteContent,
    section: Section,
    index: usize,
) -> Result<SiteContent, EditError> {
    list_op(doc, section, ListOp::Remove(index))
}

/// Set one field of the entry at `index`
pub fn edit_field(
    doc: &SiteContent,
    section: Section,
    index: usize,
    field: &str,
    value: impl Into<FieldValue>,
) -> Result<SiteContent, EditError> {
    list_op(doc, section, ListOp::Edit(index, field, value.into()))
}

pub fn set_hours(doc: &SiteContent, day: Weekday, value: impl Into<String>) -> SiteContent {
    let mut next = doc.clone();
    next.hours.set(day, value);
    next
}

/// Number of entries in a list section; `None` for hours
pub fn entry_count(doc: &SiteContent, section: Section) -> Option<usize> {
    match section {
        Section::Hours => None,
        Section::Services => Some(doc.services.len()),
        Section::Menu => Some(doc.menu_items.len()),
        Section::Staff => Some(doc.staff.len()),
        Section::Promotions => Some(doc.promotions.len()),
    }
}
