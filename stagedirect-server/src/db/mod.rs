//! Database access layer for stagedirect-server
//!
//! Pool setup and schema live in `stagedirect_common::db`; this module holds
//! the queries the HTTP handlers and the merge service run.

pub mod companies;
pub mod contacts;
pub mod internships;
pub mod kanban;
pub mod sectors;
