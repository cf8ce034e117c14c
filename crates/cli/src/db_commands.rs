use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use {agenda_config::AgendaConfig, agenda_store::SqliteStore, clap::Subcommand};

#[derive(Subcommand)]
pub enum DbAction {
    /// Delete the database file (and its WAL/SHM companions).
    Reset,
    /// Run all pending database migrations.
    Migrate,
    /// Print how many users, calendars and schedules are stored.
    Stats,
}

pub async fn handle_db(action: DbAction, config: &AgendaConfig) -> anyhow::Result<()> {
    match action {
        DbAction::Reset => reset_database(config),
        DbAction::Migrate => run_migrations(config).await,
        DbAction::Stats => print_stats(config).await,
    }
}

/// Open the configured database, creating the default data directory if it
/// is going to be used.
async fn open_store(config: &AgendaConfig) -> anyhow::Result<SqliteStore> {
    if config.database.url.is_none() {
        std::fs::create_dir_all(agenda_config::data_dir())?;
    }
    let pool = agenda_store::connect(
        &config.database.resolved_url(),
        config.database.max_connections,
    )
    .await?;
    Ok(SqliteStore::new(pool))
}

/// File path behind a `sqlite:` URL. `None` for in-memory databases.
fn sqlite_path(url: &str) -> Option<PathBuf> {
    let rest = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or(rest);
    if path.is_empty() || path == ":memory:" {
        return None;
    }
    Some(PathBuf::from(path))
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Delete the database file along with the WAL and SHM files SQLite keeps
/// next to it.
fn reset_database(config: &AgendaConfig) -> anyhow::Result<()> {
    let url = config.database.resolved_url();
    let Some(db) = sqlite_path(&url) else {
        anyhow::bail!("nothing to reset for {url}");
    };

    let mut deleted = false;
    for suffix in ["", "-wal", "-shm"] {
        let path = with_suffix(&db, suffix);
        if path.exists() {
            std::fs::remove_file(&path)?;
            println!("Deleted: {}", path.display());
            deleted = true;
        }
    }

    if deleted {
        println!("Database files deleted. Run `agenda db migrate` to recreate them.");
    } else {
        println!("No database files found at {}.", db.display());
    }
    Ok(())
}

async fn run_migrations(config: &AgendaConfig) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    agenda_store::run_migrations(store.pool()).await?;
    println!("Migrations applied.");
    Ok(())
}

async fn print_stats(config: &AgendaConfig) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let stats = store.stats().await?;
    println!("users:     {}", stats.users);
    println!("calendars: {}", stats.calendars);
    println!("schedules: {}", stats.schedules);
    Ok(())
}
