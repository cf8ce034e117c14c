use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::schema::AgendaConfig;

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["agenda.toml", "agenda.yaml", "agenda.yml", "agenda.json"];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<AgendaConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    parse_config(&raw, path)
}

/// Discover and load config from standard locations, then apply `AGENDA_*`
/// environment overrides.
///
/// Falls back to [`AgendaConfig::default()`] when no file is found or the
/// file fails to parse.
pub fn discover_and_load() -> AgendaConfig {
    let mut config = match find_config_file() {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(&path).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
                AgendaConfig::default()
            })
        },
        None => {
            debug!("no config file found, using defaults");
            AgendaConfig::default()
        },
    };
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    config
}

/// Override config values from `AGENDA_BIND`, `AGENDA_PORT` and
/// `AGENDA_DATABASE_URL`.
///
/// Takes the lookup as a function so it can be tested without touching the
/// process environment.
pub fn apply_env_overrides(config: &mut AgendaConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(bind) = lookup("AGENDA_BIND") {
        config.server.bind = bind;
    }
    if let Some(port) = lookup("AGENDA_PORT") {
        match port.parse() {
            Ok(port) => config.server.port = port,
            Err(e) => warn!(value = %port, error = %e, "ignoring invalid AGENDA_PORT"),
        }
    }
    if let Some(url) = lookup("AGENDA_DATABASE_URL") {
        config.database.url = Some(url);
    }
}

fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/agenda/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "agenda").map(|d| d.config_dir().to_path_buf())
}

/// Returns the directory holding `agenda.db`. Falls back to `./.agenda`
/// when no home directory can be resolved.
pub fn data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "agenda")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".agenda"))
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<AgendaConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::schema::ServerConfig};

    #[test]
    fn loads_partial_toml_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agenda.toml");
        std::fs::write(&path, "[server]\nport = 8080\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.bind, "127.0.0.1");
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.auth.min_password_len, 1);
    }

    #[test]
    fn loads_yaml_and_json() {
        let dir = tempfile::tempdir().unwrap();

        let yaml = dir.path().join("agenda.yaml");
        std::fs::write(&yaml, "database:\n  url: \"sqlite::memory:\"\n").unwrap();
        let config = load_config(&yaml).unwrap();
        assert_eq!(config.database.url.as_deref(), Some("sqlite::memory:"));

        let json = dir.path().join("agenda.json");
        std::fs::write(&json, r#"{"auth": {"min_password_len": 8}}"#).unwrap();
        assert_eq!(load_config(&json).unwrap().auth.min_password_len, 8);
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agenda.ini");
        std::fs::write(&path, "port=1").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let mut config = AgendaConfig::default();
        apply_env_overrides(&mut config, |name| match name {
            "AGENDA_BIND" => Some("0.0.0.0".into()),
            "AGENDA_PORT" => Some("9000".into()),
            "AGENDA_DATABASE_URL" => Some("sqlite:/tmp/x.db".into()),
            _ => None,
        });
        assert_eq!(config.server.bind, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.database.url.as_deref(), Some("sqlite:/tmp/x.db"));
    }

    #[test]
    fn invalid_port_override_is_ignored() {
        let mut config = AgendaConfig::default();
        apply_env_overrides(&mut config, |name| {
            (name == "AGENDA_PORT").then(|| "not-a-port".to_string())
        });
        assert_eq!(config.server.port, ServerConfig::default().port);
    }
}
