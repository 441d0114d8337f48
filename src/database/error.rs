use std::convert::Infallible;
use std::fmt::{self, Display};

use serde::Serialize;
use warp::http::StatusCode;
use warp::reject::{self, Rejection};

#[derive(Debug)]
pub struct QueryError {
    info: String,
}

impl QueryError {
    pub fn new(info: String) -> Self {
        Self { info }
    }
}

impl From<sqlx::Error> for QueryError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::Configuration(e) => Self::new(format!("{e}")),
            sqlx::Error::Database(e) => Self::new(format!("{e}")),
            sqlx::Error::Io(e) => Self::new(format!("{e}")),
            sqlx::Error::Tls(e) => Self::new(format!("{e}")),
            sqlx::Error::Protocol(e) => Self::new(format!("{e}")),
            sqlx::Error::RowNotFound => Self::new(format!("RowNotFound")),
            sqlx::Error::TypeNotFound { type_name } => {
                Self::new(format!("Type not found: {type_name}"))
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => {
                Self::new(format!("Column index out of bounds {index} ({len})"))
            }
            sqlx::Error::ColumnNotFound(e) => Self::new(format!("{e}")),
            sqlx::Error::ColumnDecode { index, source } => {
                Self::new(format!("Column decode {index} ({source})"))
            }
            sqlx::Error::Decode(e) => Self::new(format!("{e}")),
            sqlx::Error::PoolTimedOut => Self::new(format!("Pool timed out")),
            sqlx::Error::PoolClosed => Self::new(format!("Pool closed")),
            sqlx::Error::WorkerCrashed => Self::new(format!("Worker crashed")),
            _ => Self::new(format!("Unknown error")),
        }
    }
}

impl Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.info)
    }
}

/// Uniqueness violations surface through this check so callers can translate
/// them into domain errors instead of leaking the storage error.
pub fn is_unique_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(e) => e.code().as_deref() == Some("23505"),
        _ => false,
    }
}

pub fn is_foreign_key_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(e) => e.code().as_deref() == Some("23503"),
        _ => false,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    DuplicateIngredient(String),
    #[error("{0}")]
    AlreadyExists(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    SelfReference(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Query(QueryError),
    #[error("{0}")]
    Internal(String),
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// User-facing message. Infrastructure failures are masked.
    pub fn detail(&self) -> String {
        match self {
            Error::Query(_) | Error::Internal(_) => String::from("Bad request"),
            other => other.to_string(),
        }
    }
}

impl Into<Error> for QueryError {
    fn into(self) -> Error {
        Error::Query(self)
    }
}

impl reject::Reject for Error {}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

pub async fn handle_rejection(rejection: Rejection) -> Result<impl warp::Reply, Infallible> {
    let (status, detail) = if rejection.is_not_found() {
        (StatusCode::NOT_FOUND, String::from("Not found"))
    } else if let Some(error) = rejection.find::<Error>() {
        if let Error::Query(_) | Error::Internal(_) = error {
            log::error!("request failed: {error}");
        }
        (error.status(), error.detail())
    } else {
        (StatusCode::BAD_REQUEST, String::from("Bad request"))
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&ErrorBody { detail }),
        status,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_client_statuses() {
        assert_eq!(
            Error::Validation(String::from("x")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::AlreadyExists(String::from("x")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::SelfReference(String::from("x")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::NotFound(String::from("x")).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::Unauthorized(String::from("x")).status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn query_errors_are_masked() {
        let error: Error = QueryError::new(String::from("duplicate key value")).into();
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error.detail(), "Bad request");
    }

    #[test]
    fn domain_messages_pass_through() {
        let error = Error::AlreadyExists(String::from("Recipe is already in favorites"));
        assert_eq!(error.detail(), "Recipe is already in favorites");
    }
}
