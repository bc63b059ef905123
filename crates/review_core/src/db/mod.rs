//! SQLite connection bootstrap.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the review store.
//! - Expose the storage error type shared by every repository.
//!
//! # Invariants
//! - Tables are created explicitly by repositories, never by opening.
//! - Foreign keys are declared by table DDL but not enforced
//!   (`foreign_keys` stays at the SQLite default `OFF`).

use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
