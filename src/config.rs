use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;
use std::path::Path;

pub const ENV_PREFIX: &str = "DUPE_LEDGER";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Root directory to scan.
    #[serde(default)]
    pub directory: String,
    /// Persisted fingerprint registry.
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// Append-only log of every duplicate ever found.
    #[serde(default = "default_duplicates_log_path")]
    pub duplicates_log_path: String,
    /// Worker pool size; 0 means one per CPU.
    #[serde(default)]
    pub worker_threads: usize,
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
}

fn default_database_path() -> String {
    "database.json".to_string()
}

fn default_duplicates_log_path() -> String {
    "duplicates.txt".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            directory: String::new(),
            database_path: default_database_path(),
            duplicates_log_path: default_duplicates_log_path(),
            worker_threads: 0,
            ignore_patterns: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load from an optional `settings.{json,toml,...}` in the working
    /// directory, overridden by `DUPE_LEDGER_*` environment variables.
    pub fn load() -> Result<AppConfig, ConfigError> {
        let builder = Config::builder()
            .add_source(ConfigFile::with_name("settings").required(false))
            .add_source(environment())
            .build()?;
        builder.try_deserialize::<AppConfig>()
    }

    /// Load from an explicit settings file; the format follows its extension.
    pub fn load_from(path: &Path) -> Result<AppConfig, ConfigError> {
        let builder = Config::builder()
            .add_source(ConfigFile::from(path))
            .add_source(environment())
            .build()?;
        builder.try_deserialize::<AppConfig>()
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("ignore_patterns")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_json_settings_with_defaults() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("settings.json");
        fs::write(&path, r#"{"directory": "/srv/media"}"#).unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.directory, "/srv/media");
        assert_eq!(config.database_path, "database.json");
        assert_eq!(config.duplicates_log_path, "duplicates.txt");
        assert_eq!(config.worker_threads, 0);
        assert!(config.ignore_patterns.is_empty());
    }

    #[test]
    fn test_toml_settings_all_keys() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("settings.toml");
        fs::write(
            &path,
            r#"
directory = "/srv/media"
database_path = "state/db.json"
duplicates_log_path = "state/dupes.txt"
worker_threads = 4
ignore_patterns = ["*/.git", "*.tmp"]
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.database_path, "state/db.json");
        assert_eq!(config.duplicates_log_path, "state/dupes.txt");
        assert_eq!(config.worker_threads, 4);
        assert_eq!(config.ignore_patterns, vec!["*/.git", "*.tmp"]);
    }

    #[test]
    fn test_malformed_settings_is_an_error() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("settings.json");
        fs::write(&path, "{ directory: ").unwrap();
        assert!(AppConfig::load_from(&path).is_err());
    }
}
