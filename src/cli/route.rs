//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::action::{ActionSpace, ActionSpaceConfig};
use crate::config::{ConfigLoader, PushwiseConfig};
use crate::episode::{Agent, GreedyAgent, SamplingAgent};
use crate::error::PushError;
use crate::grouping::DomainGroupBuilder;
use crate::resource::{validate_group_orders, PushGroup};
use crate::service::{Page, PolicyService};
use crate::stable_set::{ReplayCaptureSource, StableSetExtractor};
use crate::types::ActionId;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

use crate::cli::parse::{AgentKind, Commands, ConfigCommands};
use crate::cli::presentation::{
    action_rows, format_actions_json, format_actions_text, format_decoded_json,
    format_decoded_text, format_groups_json, ActionRow,
};

/// Runtime context for CLI execution: workspace and effective configuration.
pub struct RunContext {
    workspace_root: PathBuf,
    config: PushwiseConfig,
}

impl RunContext {
    /// Create run context from workspace root and optional config path.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, PushError> {
        let config = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        Self::with_config(workspace_root, config)
    }

    /// Create run context around an already loaded configuration.
    pub fn with_config(workspace_root: PathBuf, config: PushwiseConfig) -> Result<Self, PushError> {
        config.ensure_valid()?;
        Ok(Self {
            workspace_root,
            config,
        })
    }

    pub fn config(&self) -> &PushwiseConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, PushError> {
        match command {
            Commands::StableSet {
                captures,
                runs,
                trainable_hosts,
                output,
            } => self.stable_set(captures, *runs, trainable_hosts, output.as_deref()),
            Commands::Actions { groups, format } => {
                let space = self.action_space(groups, self.config.action_space.clone())?;
                let rows = action_rows(&space);
                Ok(if format == "json" {
                    format_actions_json(&rows)
                } else {
                    format_actions_text(&rows)
                })
            }
            Commands::Decode { groups, id, format } => {
                let row = self.decode(groups, *id)?;
                Ok(if format == "json" {
                    format_decoded_json(&row)
                } else {
                    format_decoded_text(&row)
                })
            }
            Commands::Policy {
                groups,
                agent,
                seed,
                url,
                pretty,
            } => self.policy(groups, *agent, *seed, url.as_deref(), *pretty),
            Commands::Config { command } => match command {
                ConfigCommands::Show { format } => {
                    if format == "json" {
                        Ok(serde_json::to_string_pretty(&self.config)?)
                    } else {
                        self.config.to_toml()
                    }
                }
                ConfigCommands::Validate => Ok("Configuration is valid".to_string()),
            },
        }
    }

    #[instrument(skip(self, captures, trainable_hosts))]
    fn stable_set(
        &self,
        captures: &[PathBuf],
        runs: Option<usize>,
        trainable_hosts: &[String],
        output: Option<&Path>,
    ) -> Result<String, PushError> {
        let captures: Vec<PathBuf> = captures.iter().map(|p| self.resolve(p)).collect();
        let mut source = ReplayCaptureSource::from_files(&captures)?;

        let mut builder = DomainGroupBuilder::new();
        if !trainable_hosts.is_empty() {
            builder = builder.with_trainable_hosts(trainable_hosts.iter().cloned());
        }
        let extractor = StableSetExtractor::new(runs.unwrap_or(captures.len()), builder);
        let stable = extractor.extract(&mut source)?;

        let document = format_groups_json(&stable.groups)?;
        match output {
            Some(path) => {
                let path = self.resolve(path);
                std::fs::write(&path, &document)?;
                info!(path = %path.display(), groups = stable.groups.len(), "Wrote push groups");
                Ok(format!(
                    "Wrote {} group(s) covering {} resource(s) from {}/{} capture(s) to {}",
                    stable.groups.len(),
                    stable.ranked.len(),
                    stable.successful_runs,
                    stable.attempted_runs,
                    path.display()
                ))
            }
            None => Ok(document),
        }
    }

    fn decode(&self, groups: &Path, id: ActionId) -> Result<ActionRow, PushError> {
        let space = self.action_space(groups, self.config.action_space.clone())?;
        let action = space.decode_action_id(id)?;
        Ok(ActionRow::from_action(&space, &action))
    }

    fn policy(
        &self,
        groups: &Path,
        agent: AgentKind,
        seed: Option<u64>,
        url: Option<&str>,
        pretty: bool,
    ) -> Result<String, PushError> {
        let groups = self.read_groups(groups)?;
        let url = url
            .map(str::to_string)
            .or_else(|| groups.first().map(|g| g.anchor().url().to_string()))
            .unwrap_or_default();
        let page = Page::new(url, groups);

        let mut action_space = self.config.action_space.clone();
        if seed.is_some() {
            action_space.seed = seed;
        }
        let service = PolicyService::new(
            self.config.service.clone(),
            action_space,
            move |_: &Page| -> Box<dyn Agent> {
                match agent {
                    AgentKind::Sample => Box::new(SamplingAgent),
                    AgentKind::Greedy => Box::new(GreedyAgent),
                }
            },
        )?;

        let policy = service.get_policy(&page)?;
        Ok(if pretty {
            policy.to_json_pretty()?
        } else {
            policy.to_json()?
        })
    }

    fn action_space(
        &self,
        groups: &Path,
        config: ActionSpaceConfig,
    ) -> Result<ActionSpace, PushError> {
        let groups = self.read_groups(groups)?;
        ActionSpace::with_config(groups, &config)
    }

    /// Read and validate a push group document.
    fn read_groups(&self, path: &Path) -> Result<Vec<PushGroup>, PushError> {
        let text = std::fs::read_to_string(self.resolve(path))?;
        let groups: Vec<PushGroup> = serde_json::from_str(&text)?;
        validate_group_orders(&groups)?;
        Ok(groups)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_root.join(path)
        }
    }
}
