use std::fmt::Display;

use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind};
use project_tracking_core::model::vocabulary::EnumValueError;
use serde::Serialize;

#[derive(thiserror::Error, Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Error {
    #[error("{message}")]
    Request { message: String },
    #[error("{message}")]
    DidNotFind { message: String },
    #[error("{message}")]
    UniqueConstraint { message: String },
    #[error("{message}")]
    EnumValue { message: String },
    #[error("Project '{project}' not found.")]
    ProjectNotFound {
        project: String,
        available: Vec<String>,
    },
    #[error("{message}")]
    Other { message: String },
}

impl Error {
    pub fn missing_argument(argument: &str) -> Self {
        Self::Request {
            message: format!("For current request, '{argument}' is required"),
        }
    }

    pub fn request(message: impl Into<String>) -> Self {
        Self::Request {
            message: message.into(),
        }
    }

    pub fn did_not_find(table: impl Display, attribute: &str, value: impl Display) -> Self {
        Self::DidNotFind {
            message: format!("'{table}' with '{attribute}' '{value}' doesn't exist in the database"),
        }
    }

    pub fn unique(entity: impl Display, attribute: &str, value: impl Display) -> Self {
        Self::UniqueConstraint {
            message: format!(
                "'{entity}' with '{attribute}' '{value}' already exists in the database and \
                 '{attribute}' has to be unique"
            ),
        }
    }

    /// A value that doesn't fit its column. Values outside a vocabulary are
    /// reported as such.
    pub fn invalid_value(err: &serde_json::Error) -> Self {
        let message = err.to_string();

        if message.contains("unknown variant") {
            Self::EnumValue { message }
        } else {
            Self::request(message)
        }
    }

    pub(super) fn from_other_error(err: impl std::error::Error) -> Self {
        Self::Other {
            message: format!("{err:?}"),
        }
    }
}

impl From<EnumValueError> for Error {
    fn from(err: EnumValueError) -> Self {
        Self::EnumValue {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::from_other_error(err)
    }
}

impl From<diesel::result::Error> for Error {
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::Error::{DatabaseError, NotFound};

        match err {
            DatabaseError(kind, info) => Self::from((kind, info)),
            NotFound => Self::DidNotFind {
                message: "record doesn't exist in the database".to_string(),
            },
            _ => Self::from_other_error(err),
        }
    }
}

impl From<diesel::r2d2::PoolError> for Error {
    fn from(err: diesel::r2d2::PoolError) -> Self {
        Self::from_other_error(err)
    }
}

impl From<diesel::ConnectionError> for Error {
    fn from(err: diesel::ConnectionError) -> Self {
        Self::from_other_error(err)
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::from_other_error(err)
    }
}

impl From<(DatabaseErrorKind, Box<dyn DatabaseErrorInformation + Send + Sync>)> for Error {
    fn from(
        (kind, info): (DatabaseErrorKind, Box<dyn DatabaseErrorInformation + Send + Sync>),
    ) -> Self {
        match kind {
            // sqlite reports "UNIQUE constraint failed: <table>.<column>"
            DatabaseErrorKind::UniqueViolation => {
                let (table, column) = info
                    .message()
                    .rsplit(' ')
                    .next()
                    .and_then(|qualified| qualified.split_once('.'))
                    .unwrap_or_default();

                Self::UniqueConstraint {
                    message: format!(
                        "'{table}' with this '{column}' already exists in the database and \
                         '{column}' has to be unique"
                    ),
                }
            }
            DatabaseErrorKind::ForeignKeyViolation => Self::DidNotFind {
                message: "a referenced row doesn't exist in the database".to_string(),
            },
            _ => Self::from_other_error(diesel::result::Error::DatabaseError(kind, info)),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
