//! # StageDirect Common Library
//!
//! Shared code for the StageDirect service including:
//! - Database models and schema initialization
//! - Bootstrap configuration loading
//! - Company name normalization, duplicate detection and record merging
//! - Kanban board reordering

pub mod config;
pub mod db;
pub mod dedup;
pub mod error;
pub mod kanban;

pub use dedup::{find_matches, merge_companies, normalize, ValidatedPolicy};
pub use error::{Error, Result};
