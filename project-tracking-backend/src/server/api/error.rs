use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::db;

#[derive(thiserror::Error, Serialize, Debug, Clone)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Error {
    #[error(transparent)]
    Database(#[from] db::error::Error),
    #[error("{reason}")]
    SimpleData { reason: String },
    #[error("{message}")]
    MalformedRequest {
        #[serde(skip)]
        status: StatusCode,
        message: String,
    },
}

impl Error {
    fn status_code(&self) -> StatusCode {
        use db::error::Error::{Other, ProjectNotFound};

        match self {
            Self::SimpleData { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::MalformedRequest { status, .. } => *status,
            Self::Database(inner) => match inner {
                ProjectNotFound { .. } => StatusCode::NOT_FOUND,
                Other { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::BAD_REQUEST,
            },
        }
    }

    fn body(&self) -> Value {
        match self {
            Self::Database(db::error::Error::ProjectNotFound { available, .. }) => {
                let mut lines = vec![self.to_string(), "Available projects:".to_string()];
                lines.extend(available.iter().cloned());
                json!(lines)
            }
            other => json!(other.to_string()),
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(err: JsonRejection) -> Self {
        Self::MalformedRequest {
            status: err.status(),
            message: err.body_text(),
        }
    }
}

impl From<QueryRejection> for Error {
    fn from(err: QueryRejection) -> Self {
        Self::MalformedRequest {
            status: err.status(),
            message: err.body_text(),
        }
    }
}

impl From<PathRejection> for Error {
    fn from(err: PathRejection) -> Self {
        Self::MalformedRequest {
            status: err.status(),
            message: err.body_text(),
        }
    }
}

impl From<garde::Report> for Error {
    fn from(err: garde::Report) -> Self {
        Self::SimpleData {
            reason: format!("{err:#}"),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            #[serde(rename = "DB_ACTION_ERROR")]
            error: Value,
        }

        tracing::error!(error = ?self);

        let status = self.status_code();

        let error = if status == StatusCode::INTERNAL_SERVER_ERROR {
            json!("internal server error")
        } else {
            self.body()
        };

        (status, axum::Json(ErrorResponse { error })).into_response()
    }
}

pub type Result<T> = std::result::Result<T, Error>;
