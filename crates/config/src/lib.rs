//! Configuration loading for the agenda gateway.
//!
//! Config files: `agenda.toml`, `agenda.yaml`, `agenda.yml` or `agenda.json`,
//! searched in `./` then the user config directory (`~/.config/agenda/`).
//! `AGENDA_*` environment variables override file values.

pub mod loader;
pub mod schema;

pub use {
    loader::{apply_env_overrides, config_dir, data_dir, discover_and_load, load_config},
    schema::{AgendaConfig, AuthConfig, DatabaseConfig, ServerConfig},
};
