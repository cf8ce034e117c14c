use {agenda_common::Entity, serde::Serialize};

/// Coarse failure classes reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    Unauthorized,
    Forbidden,
    StoreFailure,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Conflict => "conflict",
            Self::NotFound => "not_found",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::StoreFailure => "store_failure",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    #[error("{field} already in use")]
    Conflict { field: String },

    #[error("{0} not found")]
    NotFound(Entity),

    /// Missing or unusable credentials, or a failed login. The message never
    /// says which.
    #[error("invalid credentials")]
    Unauthorized,

    #[error("no permission: {reason}")]
    Forbidden { reason: String },

    #[error(transparent)]
    Store(agenda_store::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Unauthorized => ErrorKind::Unauthorized,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::Store(_) | Self::Internal(_) => ErrorKind::StoreFailure,
        }
    }
}

impl From<agenda_store::Error> for Error {
    fn from(err: agenda_store::Error) -> Self {
        match err {
            agenda_store::Error::Conflict { field } => Self::Conflict { field },
            agenda_store::Error::NotFound(entity) => Self::NotFound(entity),
            agenda_store::Error::InvalidTimeRange => {
                Self::validation("endTime", "must be after startTime")
            },
            other => Self::Store(other),
        }
    }
}

impl From<agenda_auth::Error> for Error {
    fn from(err: agenda_auth::Error) -> Self {
        match err {
            agenda_auth::Error::MalformedToken => Self::Unauthorized,
            agenda_auth::Error::Hash(message) => Self::Internal(message),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
