//! Error types for each collaborator boundary.
//!
//! Every external call returns one of these instead of swallowing failures;
//! the pipeline and orchestrator decide which ones are fatal to a record and
//! which ones are only logged.

use thiserror::Error;

/// Failure talking to the LMS API.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to build LMS http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned status {status}: {body}")]
    Status { url: String, status: u16, body: String },
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl SourceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, SourceError::Status { status: 404, .. })
    }
}

/// Failure talking to the note store (query or create).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("note store request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("note store returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("note store response did not contain a page id")]
    MissingId,
}

/// Failure delivering a chat notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("notification endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("notification rejected: {description}")]
    Rejected { description: String },
}

/// Failure building a destination payload from a source record.
#[derive(Debug, Error, PartialEq)]
pub enum PayloadError {
    #[error("property '{property}' has an invalid date: {value}")]
    InvalidDate { property: String, value: String },
    #[error("property '{property}' is not a finite number")]
    NonFiniteNumber { property: String },
}

/// Failure in one of the text formatting helpers. Callers fall back to the raw input.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("unterminated tag at byte {position}")]
    UnterminatedTag { position: usize },
    #[error("unrecognised timestamp '{value}'")]
    Timestamp { value: String },
}
