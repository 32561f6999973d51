//! Core of a stress-management tracker: localized UI strings, a SQLite
//! data layer behind per-entity repositories, a seven-item anxiety
//! questionnaire with derived severity, login with salted password hashes,
//! CSV export, and whole-database backup/restore.
//!
//! Two binaries share this library. `stress-tracker` is the user-facing
//! entry point; `stress-admin` adds user administration, export, and
//! backup commands.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod i18n;
pub mod models;
pub mod repository;
pub mod retry;
pub mod scoring;
pub mod seed;

pub use error::{Error, Result};
