//! Typed page payloads for the note store.
//!
//! Each entity kind has a builder struct whose optional fields are `Option`s.
//! `into_properties` validates the values and emits only the properties that
//! are present, so an absent due date produces no `Due Date` key at all.

use chrono::{DateTime, NaiveDate};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::json;

use crate::errors::PayloadError;
use crate::format::clamp_chars;

/// Character limit the note store enforces on a single text object.
pub const MAX_TEXT_LEN: usize = 2000;

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Title(String),
    RichText(String),
    Number(f64),
    Url(String),
    Date(String),
}

impl PropertyValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Title(s)
            | PropertyValue::RichText(s)
            | PropertyValue::Url(s)
            | PropertyValue::Date(s) => Some(s),
            PropertyValue::Number(_) => None,
        }
    }
}

impl Serialize for PropertyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = match self {
            PropertyValue::Title(s) => json!({ "title": [{ "text": { "content": s } }] }),
            PropertyValue::RichText(s) => json!({ "rich_text": [{ "text": { "content": s } }] }),
            PropertyValue::Number(n) => json!({ "number": n }),
            PropertyValue::Url(s) => json!({ "url": s }),
            PropertyValue::Date(s) => json!({ "date": { "start": s } }),
        };
        value.serialize(serializer)
    }
}

/// An ordered property map, serialised as a JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageProperties {
    entries: Vec<(String, PropertyValue)>,
}

impl PageProperties {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, name: &str, value: PropertyValue) {
        self.entries.retain(|(existing, _)| existing != name);
        self.entries.push((name.to_string(), value));
    }

    pub fn title(mut self, name: &str, text: &str) -> Self {
        self.insert(name, PropertyValue::Title(clamp_chars(text, MAX_TEXT_LEN).into_owned()));
        self
    }

    pub fn rich_text(mut self, name: &str, text: &str) -> Self {
        self.insert(
            name,
            PropertyValue::RichText(clamp_chars(text, MAX_TEXT_LEN).into_owned()),
        );
        self
    }

    pub fn number(mut self, name: &str, value: f64) -> Result<Self, PayloadError> {
        if !value.is_finite() {
            return Err(PayloadError::NonFiniteNumber {
                property: name.to_string(),
            });
        }
        self.insert(name, PropertyValue::Number(value));
        Ok(self)
    }

    pub fn url(mut self, name: &str, url: Option<&str>) -> Self {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.insert(name, PropertyValue::Url(url.to_string()));
        }
        self
    }

    pub fn date(mut self, name: &str, date: Option<&str>) -> Result<Self, PayloadError> {
        if let Some(date) = date.filter(|d| !d.trim().is_empty()) {
            if !is_iso_date(date) {
                return Err(PayloadError::InvalidDate {
                    property: name.to_string(),
                    value: date.to_string(),
                });
            }
            self.insert(name, PropertyValue::Date(date.to_string()));
        }
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }
}

impl Serialize for PageProperties {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

fn is_iso_date(value: &str) -> bool {
    DateTime::parse_from_rfc3339(value).is_ok()
        || NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

pub struct CoursePage<'a> {
    pub name: &'a str,
    pub course_id: u64,
    pub url: &'a str,
}

impl CoursePage<'_> {
    pub fn into_properties(self) -> Result<PageProperties, PayloadError> {
        Ok(PageProperties::new()
            .title("Name", self.name)
            .rich_text("Course ID", &self.course_id.to_string())
            .url("URL", Some(self.url)))
    }
}

pub struct AssignmentPage<'a> {
    pub name: &'a str,
    pub assignment_id: u64,
    pub course: &'a str,
    pub points: f64,
    pub url: Option<&'a str>,
    pub due: Option<&'a str>,
    pub available_from: Option<&'a str>,
    pub available_to: Option<&'a str>,
}

impl AssignmentPage<'_> {
    pub fn into_properties(self) -> Result<PageProperties, PayloadError> {
        PageProperties::new()
            .title("Assignment Name", self.name)
            .rich_text("Assignment ID", &self.assignment_id.to_string())
            .rich_text("Course", self.course)
            .number("Points", self.points)?
            .url("URL", self.url)
            .date("Due Date", self.due)?
            .date("Available From", self.available_from)?
            .date("Available To", self.available_to)
    }
}

pub struct FilePage<'a> {
    pub name: &'a str,
    pub file_id: u64,
    pub course: &'a str,
    pub content_type: &'a str,
    pub download_url: Option<&'a str>,
}

impl FilePage<'_> {
    pub fn into_properties(self) -> Result<PageProperties, PayloadError> {
        Ok(PageProperties::new()
            .title("File Name", self.name)
            .rich_text("File ID", &self.file_id.to_string())
            .rich_text("Course", self.course)
            .rich_text("File Type", self.content_type)
            .url("Download Link", self.download_url))
    }
}

pub struct AnnouncementPage<'a> {
    pub title: &'a str,
    pub announcement_id: u64,
    pub course: &'a str,
    pub url: Option<&'a str>,
    /// Plain text, already cleaned from the HTML body.
    pub content: &'a str,
    pub posted_at: Option<&'a str>,
}

impl AnnouncementPage<'_> {
    pub fn into_properties(self) -> Result<PageProperties, PayloadError> {
        PageProperties::new()
            .title("Title", self.title)
            .rich_text("Announcement ID", &self.announcement_id.to_string())
            .rich_text("Course", self.course)
            .url("URL", self.url)
            .rich_text("Content", self.content)
            .date("Posted At", self.posted_at)
    }
}
