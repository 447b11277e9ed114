//! Error type shared by the StageDirect library and service

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Storage failure; constraint violations are told apart by the helpers below
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Config file read or database directory creation
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unparseable or inconsistent `stagedirect.toml`
    #[error("Configuration error: {0}")]
    Config(String),

    /// No company, contact, sector, internship or card with the given id
    #[error("Not found: {0}")]
    NotFound(String),

    /// Field or id rejected before touching storage
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// True when the underlying database error is a foreign key violation
    pub fn is_foreign_key_violation(&self) -> bool {
        match self {
            Error::Database(sqlx::Error::Database(db)) => db.is_foreign_key_violation(),
            _ => false,
        }
    }

    /// True when the underlying database error is a UNIQUE constraint violation
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Error::Database(sqlx::Error::Database(db)) => db.is_unique_violation(),
            _ => false,
        }
    }
}
