//! Source records as returned by the LMS API.
//!
//! Only the fields the mirror uses are deserialised. Text fields the LMS may
//! send as `null` are kept optional and read through accessors that apply the
//! display defaults.

use serde::Deserialize;

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Course {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
}

impl Course {
    pub fn name(&self) -> &str {
        non_empty(&self.name).unwrap_or("No Name")
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Assignment {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub points_possible: Option<f64>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub due_at: Option<String>,
    #[serde(default)]
    pub unlock_at: Option<String>,
    #[serde(default)]
    pub lock_at: Option<String>,
}

impl Assignment {
    pub fn name(&self) -> &str {
        non_empty(&self.name).unwrap_or("No Name")
    }

    pub fn points(&self) -> f64 {
        self.points_possible.unwrap_or(0.0)
    }

    pub fn html_url(&self) -> Option<&str> {
        non_empty(&self.html_url)
    }

    pub fn due_at(&self) -> Option<&str> {
        non_empty(&self.due_at)
    }

    pub fn unlock_at(&self) -> Option<&str> {
        non_empty(&self.unlock_at)
    }

    pub fn lock_at(&self) -> Option<&str> {
        non_empty(&self.lock_at)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CourseFile {
    pub id: u64,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default, rename = "content-type")]
    pub content_type: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl CourseFile {
    pub fn display_name(&self) -> &str {
        non_empty(&self.display_name).unwrap_or("No Name")
    }

    pub fn content_type(&self) -> &str {
        self.content_type.as_deref().unwrap_or("")
    }

    pub fn download_url(&self) -> Option<&str> {
        non_empty(&self.url)
    }
}

/// An announcement. The discussion-topics fallback endpoint returns the same shape.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Announcement {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub posted_at: Option<String>,
    /// Raw HTML body.
    #[serde(default)]
    pub message: Option<String>,
}

impl Announcement {
    pub fn title(&self) -> &str {
        non_empty(&self.title).unwrap_or("No Title")
    }

    pub fn html_url(&self) -> Option<&str> {
        non_empty(&self.html_url)
    }

    pub fn posted_at(&self) -> Option<&str> {
        non_empty(&self.posted_at)
    }

    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or("")
    }
}
