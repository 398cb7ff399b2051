//! CLI configuration.
//!
//! Layered, lowest priority first:
//! 1. built-in defaults
//! 2. `venture.toml` in the working directory, or the file given with `--config`
//! 3. `VENTURE__*` environment variables (`VENTURE__LOGGING__LEVEL=debug`)
//!
//! Command-line flags are applied on top by the caller.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use venture_criteria::BuilderOptions;

const DEFAULT_CONFIG_FILE: &str = "venture.toml";
const ENV_PREFIX: &str = "VENTURE";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub database: DatabaseConfig,
    /// Default schema file for commands that do not pass `--schema`.
    pub schema: Option<PathBuf>,
    pub builder: BuilderOptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 4,
        }
    }
}

impl AppConfig {
    /// Load configuration. An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration sources")?
            .try_deserialize()
            .context("Invalid configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use venture_criteria::UnknownOperatorPolicy;

    #[test]
    fn defaults_are_quiet_and_lenient() {
        let config = AppConfig::default();
        assert_eq!(config.logging.level, "warn");
        assert!(!config.logging.json);
        assert_eq!(config.builder.unknown_operator, UnknownOperatorPolicy::Ignore);
        assert!(config.database.url.is_none());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                "[builder]\nunknown_operator = \"reject\"\n\n[database]\nurl = \"postgres://localhost/venture\"\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.builder.unknown_operator, UnknownOperatorPolicy::Reject);
        assert_eq!(config.builder.max_filters, venture_criteria::DEFAULT_MAX_FILTERS);
        assert_eq!(config.database.url.as_deref(), Some("postgres://localhost/venture"));
        assert_eq!(config.database.max_connections, 4);
        assert_eq!(config.logging.level, "warn");
    }
}
