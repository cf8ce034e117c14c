use agenda_common::{Entity, FromMessage};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A unique column (`user_id`, `email`, `calendar_code`, `schedule_id`)
    /// already holds this value.
    #[error("{field} already in use")]
    Conflict { field: String },

    #[error("{0} not found")]
    NotFound(Entity),

    #[error("schedule must end after it starts")]
    InvalidTimeRange,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Message(String),
}

impl Error {
    #[must_use]
    pub fn conflict(field: impl Into<String>) -> Self {
        Self::Conflict {
            field: field.into(),
        }
    }

    /// Classify a failed write. Unique violations become [`Error::Conflict`]
    /// naming the offending column, foreign key violations become
    /// [`Error::NotFound`] for `parent`, a failed time range check becomes
    /// [`Error::InvalidTimeRange`].
    pub(crate) fn from_write(err: sqlx::Error, parent: Entity) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return Self::conflict(unique_column(db.message()));
            }
            if db.is_check_violation() && db.message().contains("start_time < end_time") {
                return Self::InvalidTimeRange;
            }
            if db.is_foreign_key_violation() {
                return Self::NotFound(parent);
            }
        }
        Self::Sqlx(err)
    }
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message(message)
    }
}

/// Extract the column from `UNIQUE constraint failed: users.email`.
fn unique_column(message: &str) -> &str {
    message
        .rsplit_once(": ")
        .map(|(_, cols)| cols)
        .and_then(|cols| cols.split(',').next())
        .and_then(|col| col.trim().rsplit('.').next())
        .filter(|col| !col.is_empty())
        .unwrap_or("id")
}

pub type Result<T> = std::result::Result<T, Error>;

agenda_common::impl_context!();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_column_from_sqlite_message() {
        assert_eq!(
            unique_column("UNIQUE constraint failed: users.email"),
            "email"
        );
        assert_eq!(
            unique_column("UNIQUE constraint failed: calendars.calendar_code"),
            "calendar_code"
        );
        assert_eq!(unique_column("something else"), "id");
    }
}
