#![doc = "canvas-sync-core: core logic for mirroring LMS course content into note-store databases."]

//! This crate holds the data models, collaborator traits, formatting helpers,
//! the per-record sync pipeline and the orchestrator. The LMS client lives
//! here too; the note-store and chat clients live in the CLI crate.
//!
//! # Usage
//! Build a [`config::SyncConfig`], pick implementations of
//! [`contract::CourseSource`], [`contract::NoteStore`] and
//! [`contract::Notifier`], and call [`synchronise::synchronise`].

pub mod config;
pub mod contract;
pub mod dedupe;
pub mod errors;
pub mod format;
pub mod models;
pub mod notify;
pub mod pipeline;
pub mod properties;
pub mod source;
pub mod synchronise;
