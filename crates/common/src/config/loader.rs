//! # Configuration Loader
//!
//! Figment-based configuration loading with layered support:
//! 1. Compiled defaults
//! 2. Configuration file (TOML)
//! 3. Environment variable overrides
//!
//! Command-line overrides are applied by each binary on top of the result.

use crate::error::ConfigurationError;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default configuration file name
const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Environment variable prefix for gpu-bench
pub const DEFAULT_ENV_PREFIX: &str = "GPU_BENCH";

/// Load configuration with the default options
///
/// # Configuration Layer Priority (highest to lowest)
/// 1. Environment variables (GPU_BENCH_*)
/// 2. Configuration file (config.toml or `GPU_BENCH_CONFIG_PATH`)
/// 3. Compiled defaults
///
/// Nested fields use a double underscore: `GPU_BENCH_KERNEL__SOURCE_PATH`.
pub fn load_config<T>() -> Result<T, ConfigurationError>
where
    T: Default + DeserializeOwned + Serialize,
{
    load_config_with_options::<T>(LoadOptions::default())
}

/// Load configuration from a specific file, which must exist
pub fn load_from_file<T>(path: &Path) -> Result<T, ConfigurationError>
where
    T: Default + DeserializeOwned + Serialize,
{
    let options = LoadOptions {
        config_path: Some(path.to_path_buf()),
        require_file: true,
        ..Default::default()
    };
    load_config_with_options::<T>(options)
}

/// Configuration loading options
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Optional path to configuration file
    pub config_path: Option<PathBuf>,
    /// Environment variable prefix
    pub env_prefix: String,
    /// Whether configuration file is required
    pub require_file: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            config_path: None,
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
            require_file: false,
        }
    }
}

/// Load configuration with custom options
pub fn load_config_with_options<T>(options: LoadOptions) -> Result<T, ConfigurationError>
where
    T: Default + DeserializeOwned + Serialize,
{
    debug!("Loading configuration with options: {:?}", options);

    let mut figment = Figment::new().merge(Serialized::defaults(T::default()));

    let config_path = determine_config_path(options.config_path, &options.env_prefix)?;

    if let Some(path) = &config_path {
        if path.exists() {
            info!("Loading configuration from file: {}", path.display());
            figment = add_file_provider(figment, path)?;
        } else if options.require_file {
            return Err(ConfigurationError::FileNotFound {
                path: path.display().to_string(),
            });
        } else {
            warn!(
                "Configuration file not found: {} (using defaults)",
                path.display()
            );
        }
    }

    debug!(
        "Loading environment variables with prefix: {}",
        options.env_prefix
    );
    figment = figment.merge(
        Env::prefixed(&format!("{}_", options.env_prefix))
            .split("__")
            .ignore(&["CONFIG_PATH"]),
    );

    let config: T = figment
        .extract()
        .map_err(|err| ConfigurationError::ParseError {
            details: format!("Failed to parse configuration: {err}"),
        })?;

    debug!(
        "Configuration loaded from {} sources",
        figment.metadata().count()
    );

    Ok(config)
}

/// Determine configuration file path with fallback logic
fn determine_config_path(
    override_path: Option<PathBuf>,
    env_prefix: &str,
) -> Result<Option<PathBuf>, ConfigurationError> {
    if let Some(path) = override_path {
        return Ok(Some(path));
    }

    let path_var = format!("{env_prefix}_CONFIG_PATH");
    if let Ok(env_path) = std::env::var(&path_var) {
        let path = PathBuf::from(env_path);
        debug!("Using config path from {}: {}", path_var, path.display());
        return Ok(Some(path));
    }

    let current_dir_config = std::env::current_dir()
        .map_err(|e| ConfigurationError::EnvironmentError {
            var: "current_dir".to_string(),
            details: e.to_string(),
        })?
        .join(DEFAULT_CONFIG_FILE);

    if current_dir_config.exists() {
        debug!(
            "Found config file in current directory: {}",
            current_dir_config.display()
        );
        return Ok(Some(current_dir_config));
    }

    let config_locations = [
        "/etc/gpu-bench/config.toml",
        "~/.config/gpu-bench/config.toml",
        "./config/config.toml",
    ];

    for location in &config_locations {
        // An unset HOME only rules out the tilde location.
        let Ok(path) = expand_path(location) else {
            continue;
        };
        if path.exists() {
            debug!("Found config file at: {}", path.display());
            return Ok(Some(path));
        }
    }

    debug!("No configuration file found, using defaults");
    Ok(None)
}

/// Add file provider to figment based on file extension
fn add_file_provider(figment: Figment, path: &Path) -> Result<Figment, ConfigurationError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("toml");

    match extension.to_lowercase().as_str() {
        "toml" => Ok(figment.merge(Toml::file(path))),
        _ => Err(ConfigurationError::ParseError {
            details: format!(
                "Unsupported configuration file format: {extension} (supported: toml)"
            ),
        }),
    }
}

/// Expand a leading tilde to `$HOME`
fn expand_path(path: &str) -> Result<PathBuf, ConfigurationError> {
    if !path.starts_with('~') {
        return Ok(PathBuf::from(path));
    }

    let home = std::env::var("HOME").map_err(|_| ConfigurationError::EnvironmentError {
        var: "HOME".to_string(),
        details: "HOME environment variable not set".to_string(),
    })?;

    Ok(PathBuf::from(path.replacen('~', &home, 1)))
}
