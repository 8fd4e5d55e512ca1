use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("unprocessable entity: {0}")]
    UnprocessableEntity(String),
    #[error("signature verification failed")]
    Unverified,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Discriminant of [`CoreError`], comparable by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InvalidTransition,
    Forbidden,
    UnprocessableEntity,
    Unverified,
    BadRequest,
    Internal,
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::NotFound(_) => ErrorKind::NotFound,
            CoreError::Conflict(_) => ErrorKind::Conflict,
            CoreError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            CoreError::Forbidden(_) => ErrorKind::Forbidden,
            CoreError::UnprocessableEntity(_) => ErrorKind::UnprocessableEntity,
            CoreError::Unverified => ErrorKind::Unverified,
            CoreError::BadRequest(_) => ErrorKind::BadRequest,
            CoreError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind() == kind
    }
}

impl From<DieselError> for CoreError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => CoreError::NotFound("record"),
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                CoreError::Conflict(info.message().to_string())
            }
            other => CoreError::Internal(other.into()),
        }
    }
}

impl From<diesel::r2d2::PoolError> for CoreError {
    fn from(err: diesel::r2d2::PoolError) -> Self {
        CoreError::Internal(err.into())
    }
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
