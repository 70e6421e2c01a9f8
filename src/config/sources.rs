use super::models::Config;
use config::{ConfigError, Environment, File, FileFormat};
use std::env;
use std::path::{Path, PathBuf};

const CONFIG_ENV_VAR: &str = "FETCHKIT_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/fetchkit.toml";
const ENV_PREFIX: &str = "FETCHKIT";
const ENV_SEPARATOR: &str = "__";

/// Path of the configuration file: `FETCHKIT_CONFIG` or the default location
pub fn default_path() -> PathBuf {
    env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load configuration with priority (lowest to highest):
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if it exists)
/// 3. Variables from a `.env` file (via dotenvy)
/// 4. System environment variables
pub fn load() -> Result<Config, ConfigError> {
    // .env may set FETCHKIT_CONFIG, so it is read before resolving the path
    read_env_file(None);
    load_from_sources(&default_path())
}

/// Same layering as [`load`] with an explicit configuration file
pub fn load_from_path(config_path: &Path) -> Result<Config, ConfigError> {
    load_layers(config_path, None)
}

/// `env_file` of `None` searches the working directory and its parents
fn load_layers(config_path: &Path, env_file: Option<&Path>) -> Result<Config, ConfigError> {
    read_env_file(env_file);
    load_from_sources(config_path)
}

fn read_env_file(env_file: Option<&Path>) {
    let result = match env_file {
        Some(path) => dotenvy::from_path(path).map(|_| ()),
        None => dotenvy::dotenv().map(|_| ()),
    };
    // A missing .env file is not an error
    if let Err(e) = result {
        if !e.not_found() {
            tracing::warn!(error = %e, "Failed to read .env file");
        }
    }
}

/// Load configuration from a specific path plus environment overrides
pub fn load_from_sources(config_path: &Path) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!(path = %config_path.display(), "Loading configuration");
        builder = builder.add_source(
            File::from(config_path.to_path_buf())
                .format(FileFormat::Toml)
                .required(false),
        );
    } else {
        tracing::debug!(
            path = %config_path.display(),
            "Configuration file not found, using defaults and environment overrides"
        );
    }

    // FETCHKIT__FETCHER__WORKERS -> fetcher.workers
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator(ENV_SEPARATOR)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    builder.build()?.try_deserialize()
}
