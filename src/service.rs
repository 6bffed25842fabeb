//! Policy Service
//!
//! Serves a push policy per page request. Each request gets its own
//! [`ActionSpace`] over the page's shared, read-only group list, runs one
//! episode with a fresh agent, and assembles the result.
//!
//! Caching is an optional layer on top of the stateless path and is off by
//! default.

use crate::action::{ActionSpace, ActionSpaceConfig, DecayWeighting};
use crate::episode::{run_episode, Agent, Termination};
use crate::error::PushError;
use crate::policy::{assemble, Policy};
use crate::resource::PushGroup;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Policy service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServiceConfig {
    /// Reuse the first policy computed for a page url
    #[serde(default)]
    pub cache_policies: bool,

    /// Cap on consumed actions per episode
    #[serde(default)]
    pub max_steps: Option<usize>,
}

impl ServiceConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_steps == Some(0) {
            return Err("max_steps must be at least 1 when set".to_string());
        }
        Ok(())
    }
}

/// A page request: its url and the push groups known for it.
#[derive(Debug, Clone)]
pub struct Page {
    pub url: String,
    pub push_groups: Arc<[PushGroup]>,
}

impl Page {
    pub fn new(url: impl Into<String>, push_groups: impl Into<Arc<[PushGroup]>>) -> Self {
        Self {
            url: url.into(),
            push_groups: push_groups.into(),
        }
    }
}

/// Creates one agent per request.
pub trait AgentFactory: Send + Sync {
    fn create(&self, page: &Page) -> Box<dyn Agent>;
}

impl<F> AgentFactory for F
where
    F: Fn(&Page) -> Box<dyn Agent> + Send + Sync,
{
    fn create(&self, page: &Page) -> Box<dyn Agent> {
        self(page)
    }
}

/// Builds push policies for page requests.
pub struct PolicyService<F> {
    config: ServiceConfig,
    action_space: ActionSpaceConfig,
    agents: F,
    cache: Mutex<HashMap<String, Arc<Policy>>>,
}

impl<F: AgentFactory> PolicyService<F> {
    /// Fails with `ConfigError` when either configuration is invalid.
    pub fn new(
        config: ServiceConfig,
        action_space: ActionSpaceConfig,
        agents: F,
    ) -> Result<Self, PushError> {
        config
            .validate()
            .map_err(|msg| PushError::ConfigError(format!("service: {}", msg)))?;
        DecayWeighting::new(action_space.decay, action_space.noop_weight)?;
        Ok(Self {
            config,
            action_space,
            agents,
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// Policy for `page`, from the cache when caching is enabled.
    #[instrument(skip(self, page), fields(url = %page.url))]
    pub fn get_policy(&self, page: &Page) -> Result<Arc<Policy>, PushError> {
        if self.config.cache_policies {
            if let Some(policy) = self.cache.lock().get(&page.url) {
                debug!("Serving cached policy");
                return Ok(Arc::clone(policy));
            }
        }

        let policy = Arc::new(self.create_policy(page)?);
        if !self.config.cache_policies {
            return Ok(policy);
        }
        // a concurrent request may have stored its policy first
        let mut cache = self.cache.lock();
        let stored = cache.entry(page.url.clone()).or_insert(policy);
        Ok(Arc::clone(stored))
    }

    /// Compute a fresh policy for `page`, bypassing the cache.
    pub fn create_policy(&self, page: &Page) -> Result<Policy, PushError> {
        let mut space =
            ActionSpace::with_config(Arc::clone(&page.push_groups), &self.action_space)?;
        let mut agent = self.agents.create(page);
        let outcome = run_episode(&mut space, &mut agent, self.config.max_steps)?;
        let policy = assemble(&space, &outcome.actions)?;

        info!(
            url = %page.url,
            actions = space.num_actions(),
            pushes = policy.total_pushes(),
            exhausted = outcome.termination == Termination::Exhausted,
            "Created push policy"
        );
        Ok(policy)
    }

    /// Number of cached policies.
    pub fn cached(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}
