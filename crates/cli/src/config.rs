use config::{Config, ConfigError, Environment, File};
use engine::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CliConfig {
    /// Catalog file (.json / .yaml) loaded when `--catalog` is not given.
    pub catalog: Option<PathBuf>,
    pub socket: PathBuf,
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            catalog: None,
            socket: std::env::temp_dir().join("starterctl.sock"),
            engine: EngineConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    pub json: bool,
    pub show_time: bool,
    pub show_file: bool,
    pub show_line: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
            show_time: true,
            show_file: false,
            show_line: false,
        }
    }
}

/// Layer config sources, later ones winning:
/// `starterctl.yaml`, `.starterctl.yaml`, the explicit `--config` file,
/// then `STARTERCTL_*` environment variables (`__` separates nesting,
/// e.g. `STARTERCTL_ENGINE__INITIAL_PAGE_SIZE=12`).
pub fn load_config(explicit: Option<&Path>) -> Result<CliConfig, ConfigError> {
    let mut builder = Config::builder()
        .add_source(File::with_name("starterctl.yaml").required(false))
        // Local override
        .add_source(File::with_name(".starterctl.yaml").required(false));

    if let Some(path) = explicit {
        builder = builder.add_source(File::from(path).required(true));
    }

    builder
        .add_source(
            Environment::with_prefix("STARTERCTL")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::SortMode;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_load_config_defaults() {
        let config = load_config(None);
        assert!(config.is_ok(), "Failed to load config: {:?}", config.err());

        let config = config.unwrap();
        assert_eq!(config.engine.initial_page_size, 9);
        assert_eq!(config.engine.page_increment, 15);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        std::env::set_var("STARTERCTL_ENGINE__INITIAL_PAGE_SIZE", "12");
        std::env::set_var("STARTERCTL_ENGINE__DEFAULT_SORT", "stars");
        let config = load_config(None);
        std::env::remove_var("STARTERCTL_ENGINE__INITIAL_PAGE_SIZE");
        std::env::remove_var("STARTERCTL_ENGINE__DEFAULT_SORT");

        let config = config.unwrap();
        assert_eq!(config.engine.initial_page_size, 12);
        assert_eq!(config.engine.default_sort, SortMode::MostStars);
        assert_eq!(config.engine.page_increment, 15);
    }

    #[test]
    #[serial]
    fn test_explicit_file() {
        let path = std::env::temp_dir().join(format!("starterctl_test_{}.yaml", std::process::id()));
        std::fs::write(
            &path,
            "catalog: starters.json\nengine:\n  page_increment: 30\nlogging:\n  json: true\n",
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.catalog, Some(PathBuf::from("starters.json")));
        assert_eq!(config.engine.page_increment, 30);
        assert_eq!(config.engine.initial_page_size, 9);
        assert!(config.logging.json);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    #[serial]
    fn test_missing_explicit_file_is_error() {
        assert!(load_config(Some(Path::new("/nonexistent/starterctl.yaml"))).is_err());
    }
}
