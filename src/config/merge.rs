//! Merge rules: defaults first, every later source overrides.

use crate::action::ActionSpaceConfig;
use crate::stable_set::DEFAULT_STABLE_SET_RUNS;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Create a Config builder with built-in defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let action_space = ActionSpaceConfig::default();
    Config::builder()
        .set_default("stable_set.runs", DEFAULT_STABLE_SET_RUNS as u64)?
        .set_default("action_space.decay", action_space.decay)?
        .set_default("action_space.noop_weight", action_space.noop_weight)?
        .set_default("service.cache_policies", false)?
        .set_default("logging.level", "info")
}
