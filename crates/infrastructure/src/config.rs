//! Configuration loading.
//!
//! Sources, later ones winning:
//! 1. built-in defaults of [`SessionConfig`]
//! 2. `sessiongate.{toml,yaml,json}` in the working directory, or an explicit file
//! 3. `SESSIONGATE_*` environment variables (`SESSIONGATE_ROOT_PATH=/tenant/console`)

use std::path::{Path, PathBuf};

use ::config::{Config, Environment, File};
use sessiongate_domain::{DomainError, SessionConfig};
use tracing::debug;

/// Base name of the optional configuration file.
pub const CONFIG_FILE_NAME: &str = "sessiongate";

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "SESSIONGATE";

/// Errors raised while building the runtime configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A source could not be read or merged.
    #[error("failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    /// The merged configuration violates an invariant.
    #[error("invalid configuration: {0}")]
    Invalid(#[from] DomainError),

    /// The HTTP client could not be created.
    #[error("failed to create HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// No data directory is configured and the platform has none.
    #[error("no data directory available; set data_dir")]
    NoDataDir,
}

/// Loads and validates the session configuration.
///
/// With `path`, that file must exist; without it, `sessiongate.*` in the
/// working directory is used when present.
///
/// # Errors
///
/// Returns [`ConfigError::Load`] if a source is unreadable and
/// [`ConfigError::Invalid`] if the result fails validation.
pub fn load_config(path: Option<&Path>) -> Result<SessionConfig, ConfigError> {
    let file = match path {
        Some(path) => File::from(path).required(true),
        None => File::with_name(CONFIG_FILE_NAME).required(false),
    };

    let config: SessionConfig = Config::builder()
        .add_source(Config::try_from(&SessionConfig::default())?)
        .add_source(file)
        .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
        .build()?
        .try_deserialize()?;

    config.validate()?;
    debug!(
        console = %config.console_base_url,
        root = %config.root_path,
        "configuration loaded"
    );
    Ok(config)
}

/// Directory holding the profile files.
///
/// # Errors
///
/// Returns [`ConfigError::NoDataDir`] if neither the configuration nor the
/// platform provide one.
pub fn resolve_data_dir(config: &SessionConfig) -> Result<PathBuf, ConfigError> {
    config
        .data_dir
        .clone()
        .or_else(|| dirs::data_dir().map(|dir| dir.join(CONFIG_FILE_NAME)))
        .ok_or(ConfigError::NoDataDir)
}
