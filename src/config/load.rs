//! Configuration loading from files.
//!
//! The YAML file is the base layer; `MUB_*` environment variables override
//! individual keys, with `__` separating nested keys
//! (`MUB_BUILD__TIMEOUT_SECS=5`).

use std::path::{Path, PathBuf};

use super::{Config, ConfigError};

/// Default config file name, looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = "mub.yaml";

/// Turn the `--config-file` argument into an absolute path.
pub fn resolve_config_path(config_file: Option<&Path>) -> Result<PathBuf, ConfigError> {
    let config_file = config_file.unwrap_or(Path::new(CONFIG_FILE_NAME));
    if config_file.is_relative() {
        Ok(std::env::current_dir()
            .map_err(ConfigError::CwdFailure)?
            .join(config_file))
    } else {
        Ok(config_file.to_path_buf())
    }
}

impl Config {
    /// Load the config from a file path, applying environment overrides.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(true))
            .add_source(
                config::Environment::with_prefix("MUB")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;

        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }
}
