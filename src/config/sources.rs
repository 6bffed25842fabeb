//! Config file sources: the user-level global file and the workspace files.

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use directories::BaseDirs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment selecting `config/{env}.toml` in the workspace.
pub const ENV_VAR: &str = "PUSHWISE_ENV";

/// Path to the global config file: `$XDG_CONFIG_HOME/pushwise/config.toml`
/// (or the platform equivalent).
pub fn global_config_path() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.config_dir().join("pushwise").join("config.toml"))
}

/// Add the global config file to the builder if it exists.
pub fn add_global_file(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    match global_config_path() {
        Some(path) if path.exists() => {
            debug!(config_path = %path.display(), "Using global configuration");
            Ok(builder.add_source(File::from(path.as_path()).required(false)))
        }
        _ => Ok(builder),
    }
}

/// Add workspace config files to the builder.
///
/// Precedence: config/config.toml (base) then config/{PUSHWISE_ENV}.toml.
pub fn add_workspace_files(
    mut builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let config_dir = workspace_root.join("config");
    let env_name = std::env::var(ENV_VAR).unwrap_or_else(|_| "development".to_string());

    let base_config_path = config_dir.join("config.toml");
    if base_config_path.exists() {
        builder = builder.add_source(File::from(base_config_path.as_path()).required(false));
    }

    let env_config_path = config_dir.join(format!("{}.toml", env_name));
    if env_config_path.exists() {
        builder = builder.add_source(File::from(env_config_path.as_path()).required(false));
    }

    Ok(builder)
}
