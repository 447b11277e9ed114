//! Database models
//!
//! Persisted records carry their storage id next to a `*Fields` payload. The
//! payload doubles as the create/replace request body, so handlers and the
//! merge workflow share one shape.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Country assigned to companies submitted without one
pub const DEFAULT_COUNTRY: &str = "France";

fn default_country() -> String {
    DEFAULT_COUNTRY.to_string()
}

/// Business sector referenced by every company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Sector {
    pub id: i64,
    pub label: String,
}

/// Mutable attributes of a company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CompanyFields {
    pub name: String,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    pub city: String,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub fax: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Size category ("TPE", "PME", ...), free text
    #[serde(default)]
    pub size: Option<String>,
    pub sector_id: i64,
    /// Primary contact
    #[serde(default)]
    pub contact_id: Option<i64>,
    #[serde(default)]
    pub validated: bool,
}

impl CompanyFields {
    /// Minimal field set; everything optional left empty
    pub fn new(name: impl Into<String>, city: impl Into<String>, sector_id: i64) -> Self {
        Self {
            name: name.into(),
            street: None,
            postal_code: None,
            city: city.into(),
            country: default_country(),
            department: None,
            phone: None,
            fax: None,
            email: None,
            size: None,
            sector_id,
            contact_id: None,
            validated: false,
        }
    }

    /// Enforce the persisted-record invariant: name and city are never empty
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidInput("company name is required".to_string()));
        }
        if self.city.trim().is_empty() {
            return Err(Error::InvalidInput("company city is required".to_string()));
        }
        if self.sector_id <= 0 {
            return Err(Error::InvalidInput("company sector is required".to_string()));
        }
        Ok(())
    }
}

/// Company eligible to host an internship
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: i64,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub fields: CompanyFields,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Mutable attributes of a contact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ContactFields {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Person attached to one or more companies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: i64,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub fields: ContactFields,
}

/// Lifecycle of an internship agreement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum InternshipStatus {
    #[default]
    Draft,
    Submitted,
    Validated,
    Completed,
}

/// Mutable attributes of an internship
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InternshipFields {
    pub student_name: String,
    #[serde(default)]
    pub student_email: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    pub company_id: i64,
    /// Company tutor
    #[serde(default)]
    pub contact_id: Option<i64>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: InternshipStatus,
}

impl InternshipFields {
    pub fn validate(&self) -> Result<()> {
        if self.student_name.trim().is_empty() {
            return Err(Error::InvalidInput("student name is required".to_string()));
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(Error::InvalidInput(format!(
                    "internship ends ({}) before it starts ({})",
                    end, start
                )));
            }
        }
        Ok(())
    }
}

/// Internship record linking a student to a host company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Internship {
    pub id: i64,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub fields: InternshipFields,
    pub created_at: NaiveDateTime,
}

/// Card on a user's Kanban board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct KanbanCard {
    pub id: i64,
    pub owner: String,
    pub lane: String,
    /// 0-based, dense within (owner, lane)
    pub position: i64,
    pub title: String,
    pub notes: Option<String>,
    pub company_id: Option<i64>,
}
