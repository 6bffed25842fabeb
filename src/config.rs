//! Configuration System
//!
//! Layered configuration for extraction, sampling, the policy service and
//! logging. Sources, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. global file (`~/.config/pushwise/config.toml`)
//! 3. workspace `config/config.toml`
//! 4. workspace `config/{PUSHWISE_ENV}.toml`
//! 5. `PUSHWISE__SECTION__KEY` environment variables

use crate::action::ActionSpaceConfig;
use crate::error::PushError;
use crate::logging::LoggingConfig;
use crate::service::ServiceConfig;
use crate::stable_set::StableSetConfig;
use config::{Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

mod merge;
mod sources;

pub use sources::{global_config_path, ENV_VAR};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PushwiseConfig {
    #[serde(default)]
    pub stable_set: StableSetConfig,

    #[serde(default)]
    pub action_space: ActionSpaceConfig,

    #[serde(default)]
    pub service: ServiceConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    StableSet(String),
    ActionSpace(String),
    Service(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::StableSet(msg) => write!(f, "stable_set: {}", msg),
            ValidationError::ActionSpace(msg) => write!(f, "action_space: {}", msg),
            ValidationError::Service(msg) => write!(f, "service: {}", msg),
            ValidationError::Logging(msg) => write!(f, "logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl PushwiseConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.stable_set.validate() {
            errors.push(ValidationError::StableSet(e));
        }
        if let Err(e) = self.action_space.validate() {
            errors.push(ValidationError::ActionSpace(e));
        }
        if let Err(e) = self.service.validate() {
            errors.push(ValidationError::Service(e));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate, folding every problem into one `ConfigError`.
    pub fn ensure_valid(&self) -> Result<(), PushError> {
        self.validate().map_err(|errors| {
            let msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            PushError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                msgs.join("\n")
            ))
        })
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, PushError> {
        toml::to_string_pretty(self).map_err(|e| PushError::Serialization(e.to_string()))
    }
}

/// Loads [`PushwiseConfig`] from the layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    pub fn load(workspace_root: &Path) -> Result<PushwiseConfig, PushError> {
        let builder = merge::builder_with_defaults()?;
        let builder = sources::add_global_file(builder)?;
        let builder = sources::add_workspace_files(builder, workspace_root)?;
        let config = builder
            .add_source(Self::environment())
            .build()?
            .try_deserialize::<PushwiseConfig>()?;
        Ok(config)
    }

    /// Load configuration from one explicit file, skipping the global and
    /// workspace files. Environment overrides still apply.
    pub fn load_from_file(path: &Path) -> Result<PushwiseConfig, PushError> {
        if !path.exists() {
            return Err(PushError::ConfigError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let config = merge::builder_with_defaults()?
            .add_source(File::from(path))
            .add_source(Self::environment())
            .build()?
            .try_deserialize::<PushwiseConfig>()?;
        Ok(config)
    }

    fn environment() -> Environment {
        Environment::with_prefix("PUSHWISE")
            .separator("__")
            .try_parsing(true)
    }
}
