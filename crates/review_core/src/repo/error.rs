//! Error type shared by the review and employee repositories and the session.

use crate::db::DbError;
use crate::model::review::ReviewId;
use crate::model::validation::ValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for review/employee persistence and validation.
#[derive(Debug)]
pub enum RepoError {
    /// A field failed its invariant.
    Validation(ValidationError),
    /// Storage-level failure, passed through untranslated.
    Db(DbError),
    /// Operation needs a stored row but the review has no id yet.
    NotPersisted,
    /// Review already has a row; saving again would duplicate it.
    AlreadyPersisted(ReviewId),
    /// No row matches the review id.
    NotFound(ReviewId),
    /// The session needs to write the instance while the caller still
    /// holds a borrow of it.
    InstanceBorrowed(Option<ReviewId>),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotPersisted => write!(f, "review has not been saved yet"),
            Self::AlreadyPersisted(id) => write!(f, "review already saved with id {id}"),
            Self::NotFound(id) => write!(f, "review not found: {id}"),
            Self::InstanceBorrowed(Some(id)) => {
                write!(f, "review {id} is still borrowed by the caller")
            }
            Self::InstanceBorrowed(None) => write!(f, "review is still borrowed by the caller"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotPersisted
            | Self::AlreadyPersisted(_)
            | Self::NotFound(_)
            | Self::InstanceBorrowed(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
