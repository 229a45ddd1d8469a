//! Configuration loading from disk and the process environment.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::RunnerConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value `{value}` for {var}: {reason}")]
    Env {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Source of environment variables.
pub trait EnvSource {
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment. Empty values count as unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).filter(|v| !v.is_empty()).cloned()
    }
}

pub const ENV_ORIGIN: &str = "APIFY_META_ORIGIN";
pub const ENV_STANDBY_PORT: &str = "ACTOR_STANDBY_PORT";
pub const ENV_WEB_SERVER_PORT: &str = "ACTOR_WEB_SERVER_PORT";
pub const ENV_STANDBY_URL: &str = "ACTOR_STANDBY_URL";
pub const ENV_TOKEN: &str = "APIFY_TOKEN";
pub const ENV_STORAGE_DIR: &str = "APIFY_LOCAL_STORAGE_DIR";
pub const ENV_INPUT_PATH: &str = "ACTOR_INPUT_PATH";

/// Command-line values; these win over both the file and the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub origin: Option<String>,
    pub port: Option<u16>,
    pub input_path: Option<PathBuf>,
}

/// Read a TOML configuration file.
pub fn load_file(path: &Path) -> Result<RunnerConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Apply the platform environment variables on top of `config`.
pub fn apply_env(config: &mut RunnerConfig, env: &dyn EnvSource) -> Result<(), ConfigError> {
    if let Some(origin) = env.var(ENV_ORIGIN) {
        config.run.origin = Some(origin);
    }

    let port_var = [ENV_STANDBY_PORT, ENV_WEB_SERVER_PORT]
        .into_iter()
        .find_map(|var| env.var(var).map(|value| (var, value)));
    if let Some((var, value)) = port_var {
        config.run.port = value.trim().parse().map_err(|e: std::num::ParseIntError| {
            ConfigError::Env {
                var,
                value: value.clone(),
                reason: e.to_string(),
            }
        })?;
    }

    if let Some(url) = env.var(ENV_STANDBY_URL) {
        config.run.public_url = Some(url);
    }
    if let Some(token) = env.var(ENV_TOKEN) {
        config.run.token = Some(token);
    }
    if let Some(dir) = env.var(ENV_STORAGE_DIR) {
        config.run.storage_dir = PathBuf::from(dir);
    }
    if let Some(path) = env.var(ENV_INPUT_PATH) {
        config.run.input_path = Some(PathBuf::from(path));
    }

    Ok(())
}

/// Load, merge and validate the configuration.
///
/// Precedence: defaults < file < environment < command line.
pub fn load_config(
    path: Option<&Path>,
    env: &dyn EnvSource,
    overrides: &ConfigOverrides,
) -> Result<RunnerConfig, ConfigError> {
    let mut config = match path {
        Some(path) => load_file(path)?,
        None => RunnerConfig::default(),
    };

    apply_env(&mut config, env)?;

    if let Some(origin) = &overrides.origin {
        config.run.origin = Some(origin.clone());
    }
    if let Some(port) = overrides.port {
        config.run.port = port;
    }
    if let Some(input) = &overrides.input_path {
        config.run.input_path = Some(input.clone());
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}
