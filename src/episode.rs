//! Decision episodes
//!
//! Drives one [`ActionSpace`] with an agent until the agent picks the no-op,
//! the space is exhausted, or an optional step cap is reached.

use crate::action::{Action, ActionSpace};
use crate::error::ActionError;
use crate::types::{ActionId, NOOP_ACTION_ID};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Chooses the next action id for an episode.
///
/// The core never inspects an agent; it only decodes and applies the ids it
/// returns. An invalid id ends the episode with an error.
pub trait Agent {
    fn choose(&mut self, space: &mut ActionSpace) -> ActionId;
}

impl<A: Agent + ?Sized> Agent for Box<A> {
    fn choose(&mut self, space: &mut ActionSpace) -> ActionId {
        (**self).choose(space)
    }
}

/// Picks ids with the space's order-decaying sampler.
#[derive(Debug, Default, Clone, Copy)]
pub struct SamplingAgent;

impl Agent for SamplingAgent {
    fn choose(&mut self, space: &mut ActionSpace) -> ActionId {
        space.sample()
    }
}

/// Always pushes the lowest-order available resource; no-op once none remain.
#[derive(Debug, Default, Clone, Copy)]
pub struct GreedyAgent;

impl Agent for GreedyAgent {
    fn choose(&mut self, space: &mut ActionSpace) -> ActionId {
        let space = &*space;
        space
            .available_actions()
            .filter_map(|a| a.push(space).map(|p| (p.order(), a.id())))
            .min()
            .map(|(_, id)| id)
            .unwrap_or(NOOP_ACTION_ID)
    }
}

/// Why an episode stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The agent chose the no-op.
    NoOp,
    /// Every push-eligible resource was consumed.
    Exhausted,
    /// The configured step cap was reached.
    StepLimit,
}

/// Consumed actions of one episode, in the order they were applied.
#[derive(Debug, Clone)]
pub struct EpisodeOutcome {
    pub actions: Vec<Action>,
    pub termination: Termination,
}

/// Run one episode.
///
/// `UnknownAction` and `ActionNotAvailable` stop the episode immediately and
/// are returned to the caller; nothing is retried.
#[instrument(skip(space, agent), fields(episode = %space.episode()))]
pub fn run_episode<A>(
    space: &mut ActionSpace,
    agent: &mut A,
    max_steps: Option<usize>,
) -> Result<EpisodeOutcome, ActionError>
where
    A: Agent + ?Sized,
{
    let mut actions = Vec::new();
    let termination = loop {
        if space.is_exhausted() {
            break Termination::Exhausted;
        }
        if max_steps.is_some_and(|cap| actions.len() >= cap) {
            break Termination::StepLimit;
        }

        let id = agent.choose(space);
        let action = space.decode_action_id(id)?;
        if action.is_noop() {
            break Termination::NoOp;
        }
        space.use_action(&action)?;
        debug!(action_id = id, step = actions.len() + 1, "Applied action");
        actions.push(action);
    };

    info!(
        steps = actions.len(),
        remaining = space.remaining(),
        ?termination,
        "Episode finished"
    );
    Ok(EpisodeOutcome {
        actions,
        termination,
    })
}
