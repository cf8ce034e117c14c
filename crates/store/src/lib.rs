//! Persistent storage for users, calendars and schedules.
//!
//! Ownership runs `Schedule -> Calendar -> User`. Every read returns the
//! entity together with its resolved owner so callers can make
//! authorization decisions without a second lookup. Deleting a user or a
//! calendar cascades through foreign keys.

pub mod error;
pub mod store;
pub mod types;

use std::{str::FromStr, time::Duration};

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

pub use {
    error::{Error, Result},
    store::SqliteStore,
    types::{
        Calendar, Location, NewCalendar, NewSchedule, NewUser, Owner, Participant, Schedule,
        StoreStats, User,
    },
};

/// Open a SQLite pool with foreign keys enforced.
///
/// File databases are created if missing and run in WAL mode.
pub async fn connect(url: &str, max_connections: u32) -> Result<SqlitePool> {
    let mut options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));
    if !url.contains(":memory:") {
        options = options.journal_mode(SqliteJournalMode::Wal);
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Run database migrations for the store.
///
/// Creates the `users`, `calendars` and `schedules` tables and their
/// indexes. Call at startup before building a [`SqliteStore`].
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
