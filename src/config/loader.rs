use std::path::{Path, PathBuf};

use crate::error::GhtknError;

use super::types::Config;

/// Environment inputs that decide where the config file lives.
#[derive(Debug, Clone, Default)]
pub struct ConfigEnv {
    pub xdg_config_home: Option<String>,
    pub home: Option<PathBuf>,
    pub app_data: Option<String>,
    pub windows: bool,
}

impl ConfigEnv {
    pub fn from_env() -> Self {
        Self {
            xdg_config_home: non_empty_var("XDG_CONFIG_HOME"),
            home: dirs::home_dir(),
            app_data: non_empty_var("APPDATA"),
            windows: cfg!(windows),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Default config file location.
///
/// Windows: `%APPDATA%\ghtkn\ghtkn.yaml`.
/// Elsewhere: `$XDG_CONFIG_HOME/ghtkn/ghtkn.yaml`, then `~/.config/ghtkn/ghtkn.yaml`.
pub fn default_config_path(env: &ConfigEnv) -> Result<PathBuf, GhtknError> {
    if env.windows {
        return match &env.app_data {
            Some(app_data) => Ok(PathBuf::from(app_data).join("ghtkn").join("ghtkn.yaml")),
            None => Err(GhtknError::config("APPDATA is required on Windows")),
        };
    }
    if let Some(xdg) = &env.xdg_config_home {
        return Ok(PathBuf::from(xdg).join("ghtkn").join("ghtkn.yaml"));
    }
    if let Some(home) = &env.home {
        return Ok(home.join(".config").join("ghtkn").join("ghtkn.yaml"));
    }
    Err(GhtknError::config(
        "XDG_CONFIG_HOME or HOME is required on Linux and macOS",
    ))
}

/// Read, parse and validate a YAML config file.
pub fn load_config(path: &Path) -> Result<Config, GhtknError> {
    let content = std::fs::read_to_string(path).map_err(|e| GhtknError::ConfigError {
        path: path.to_path_buf(),
        detail: format!("failed to read: {e}"),
    })?;
    let config: Config = serde_yaml::from_str(&content).map_err(|e| GhtknError::ConfigError {
        path: path.to_path_buf(),
        detail: format!("invalid YAML: {e}"),
    })?;
    config.validate().map_err(|e| match e {
        GhtknError::ConfigError { detail, .. } => GhtknError::ConfigError {
            path: path.to_path_buf(),
            detail,
        },
        other => other,
    })?;
    tracing::debug!(path = %path.display(), apps = config.apps.len(), "loaded config");
    Ok(config)
}
