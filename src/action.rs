//! Action Space
//!
//! Dense, enumerable encoding of push decisions over a fixed push group list,
//! plus the per-episode availability state machine.
//!
//! Action ids are assigned once when the space is built: id `0` is the no-op,
//! and ids `1..=max` walk the push-eligible resources of every trainable group
//! in group order. Consuming a resource only toggles its availability; ids are
//! never renumbered, so an id keeps its meaning for the whole episode.
//!
//! An [`ActionSpace`] is episode state. It is not shared between concurrent
//! episodes; build one per episode from the same `Arc<[PushGroup]>`.

pub mod sampling;

use crate::error::{ActionError, PushError};
use crate::resource::{PushGroup, Resource};
use crate::types::{ActionId, EpisodeId, NOOP_ACTION_ID};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

pub use sampling::DecayWeighting;

static NEXT_EPISODE: AtomicU64 = AtomicU64::new(1);

/// Action space configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionSpaceConfig {
    /// Per-rank weight decay for push candidates, in (0, 1)
    #[serde(default = "default_decay")]
    pub decay: f64,

    /// Weight of the no-op relative to the earliest push candidate
    #[serde(default = "default_noop_weight")]
    pub noop_weight: f64,

    /// Fixed sampling seed; drawn from entropy when unset
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_decay() -> f64 {
    sampling::DEFAULT_DECAY
}

fn default_noop_weight() -> f64 {
    sampling::DEFAULT_NOOP_WEIGHT
}

impl Default for ActionSpaceConfig {
    fn default() -> Self {
        Self {
            decay: default_decay(),
            noop_weight: default_noop_weight(),
            seed: None,
        }
    }
}

impl ActionSpaceConfig {
    pub fn validate(&self) -> Result<(), String> {
        sampling::check(self.decay, self.noop_weight)
    }
}

/// An immutable push decision.
///
/// Indices resolve against the group list of the space that decoded the
/// action; `source` and `push` look the resources up through that space.
/// Two actions with the same id are equal.
#[derive(Debug, Clone, Copy)]
pub struct Action {
    id: ActionId,
    group_index: usize,
    source_index: usize,
    push_index: usize,
    episode: EpisodeId,
}

impl Action {
    pub fn id(&self) -> ActionId {
        self.id
    }

    pub fn is_noop(&self) -> bool {
        self.id == NOOP_ACTION_ID
    }

    pub fn group_index(&self) -> usize {
        self.group_index
    }

    pub fn source_index(&self) -> usize {
        self.source_index
    }

    pub fn push_index(&self) -> usize {
        self.push_index
    }

    /// Episode of the space this action was decoded in.
    pub fn episode(&self) -> EpisodeId {
        self.episode
    }

    /// The resource whose request triggers the push. `None` for the no-op or
    /// when `space` is not the space that decoded this action.
    pub fn source<'a>(&self, space: &'a ActionSpace) -> Option<&'a Resource> {
        self.resolve(space, self.source_index)
    }

    /// The pushed resource. `None` for the no-op or a foreign space.
    pub fn push<'a>(&self, space: &'a ActionSpace) -> Option<&'a Resource> {
        self.resolve(space, self.push_index)
    }

    fn resolve<'a>(&self, space: &'a ActionSpace, index: usize) -> Option<&'a Resource> {
        if self.is_noop() || self.episode != space.episode {
            return None;
        }
        space
            .groups
            .get(self.group_index)
            .and_then(|g| g.resources().get(index))
    }
}

impl PartialEq for Action {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Action {}

impl Hash for Action {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// A resolved source/push pair, detached from any action space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushDecision {
    pub source: Resource,
    pub push: Resource,
}

/// Codec entry for one non-no-op id.
#[derive(Debug, Clone, Copy)]
struct ActionSlot {
    group_index: usize,
    push_index: usize,
    push_order: u32,
    weight: f64,
}

/// Per-episode action space over a fixed push group list.
#[derive(Debug)]
pub struct ActionSpace {
    episode: EpisodeId,
    groups: Arc<[PushGroup]>,
    /// `slots[id - 1]` describes action `id`
    slots: Vec<ActionSlot>,
    /// (group_index, push_index) of push resources not yet consumed
    available: HashSet<(usize, usize)>,
    weighting: DecayWeighting,
    rng: ChaCha8Rng,
}

impl ActionSpace {
    /// Build a space with default weighting and an entropy seed.
    pub fn new(groups: impl Into<Arc<[PushGroup]>>) -> Self {
        Self::build(groups.into(), DecayWeighting::default(), None)
    }

    /// Build a space, enumerating push-eligible resources of trainable groups.
    ///
    /// Untrainable groups, and untrainable resources inside trainable groups,
    /// receive no action ids. Fails with `ConfigError` when the weighting in
    /// `config` would not decrease with order.
    pub fn with_config(
        groups: impl Into<Arc<[PushGroup]>>,
        config: &ActionSpaceConfig,
    ) -> Result<Self, PushError> {
        let weighting = DecayWeighting::new(config.decay, config.noop_weight)?;
        Ok(Self::build(groups.into(), weighting, config.seed))
    }

    fn build(groups: Arc<[PushGroup]>, weighting: DecayWeighting, seed: Option<u64>) -> Self {

        let mut entries: Vec<(usize, usize, u32)> = Vec::new();
        for (group_index, group) in groups.iter().enumerate() {
            if !group.trainable() {
                debug!(group = group.name(), "Skipping untrainable push group");
                continue;
            }
            let anchor_order = group.anchor().order();
            for (push_index, resource) in group.resources().iter().enumerate().skip(1) {
                if !resource.trainable() || resource.order() <= anchor_order {
                    continue;
                }
                entries.push((group_index, push_index, resource.order()));
            }
        }

        let orders: Vec<u32> = entries.iter().map(|(_, _, order)| *order).collect();
        let weights = weighting.push_weights(&orders);

        let slots: Vec<ActionSlot> = entries
            .into_iter()
            .zip(weights)
            .map(|((group_index, push_index, push_order), weight)| ActionSlot {
                group_index,
                push_index,
                push_order,
                weight,
            })
            .collect();
        let available = slots
            .iter()
            .map(|s| (s.group_index, s.push_index))
            .collect();

        let seed = seed.unwrap_or_else(rand::random);
        let episode = EpisodeId(NEXT_EPISODE.fetch_add(1, Ordering::Relaxed));
        debug!(
            %episode,
            groups = groups.len(),
            actions = slots.len() + 1,
            "Built action space"
        );

        Self {
            episode,
            groups,
            slots,
            available,
            weighting,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Reseed the sampler; `sample()` is then deterministic.
    pub fn seed(&mut self, value: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(value);
    }

    pub fn episode(&self) -> EpisodeId {
        self.episode
    }

    /// Shared group list this space was built over.
    pub fn groups(&self) -> &Arc<[PushGroup]> {
        &self.groups
    }

    /// Total number of ids, including the no-op.
    pub fn num_actions(&self) -> usize {
        self.slots.len() + 1
    }

    /// Largest valid action id.
    pub fn max_action_id(&self) -> ActionId {
        self.slots.len()
    }

    pub fn weighting(&self) -> DecayWeighting {
        self.weighting
    }

    /// Decode an id without touching availability.
    pub fn decode_action_id(&self, id: ActionId) -> Result<Action, ActionError> {
        if id == NOOP_ACTION_ID {
            return Ok(self.noop());
        }
        let slot = self.slot(id)?;
        Ok(Action {
            id,
            group_index: slot.group_index,
            source_index: 0,
            push_index: slot.push_index,
            episode: self.episode,
        })
    }

    /// The no-op action of this space.
    pub fn noop(&self) -> Action {
        Action {
            id: NOOP_ACTION_ID,
            group_index: 0,
            source_index: 0,
            push_index: 0,
            episode: self.episode,
        }
    }

    fn slot(&self, id: ActionId) -> Result<&ActionSlot, ActionError> {
        id.checked_sub(1)
            .and_then(|i| self.slots.get(i))
            .ok_or(ActionError::UnknownAction {
                id,
                max_id: self.max_action_id(),
            })
    }

    /// Draw an id from the no-op and the available push actions, favouring
    /// earlier-discovered resources.
    pub fn sample(&mut self) -> ActionId {
        let mut candidates = Vec::with_capacity(self.available.len() + 1);
        candidates.push((NOOP_ACTION_ID, self.weighting.noop_weight()));
        for (i, slot) in self.slots.iter().enumerate() {
            if self.available.contains(&(slot.group_index, slot.push_index)) {
                candidates.push((i + 1, slot.weight));
            }
        }

        match sampling::draw(&mut self.rng, &candidates) {
            Some(id) => id,
            None => {
                warn!(episode = %self.episode, "No positive sampling weight, falling back to no-op");
                NOOP_ACTION_ID
            }
        }
    }

    /// Consume the push resource of `action`.
    ///
    /// Any no-op is accepted without changing state. Fails with
    /// `ActionNotAvailable` when the resource was already consumed, when the
    /// action's group is not eligible, or when the action was decoded by a
    /// different space.
    pub fn use_action(&mut self, action: &Action) -> Result<(), ActionError> {
        if action.is_noop() {
            return Ok(());
        }
        if action.episode != self.episode {
            return Err(ActionError::not_available(
                action.id,
                format!(
                    "decoded in {} but used in {}",
                    action.episode, self.episode
                ),
            ));
        }
        let slot = *self.slot(action.id)?;
        let eligible = self
            .groups
            .get(slot.group_index)
            .is_some_and(|g| g.trainable());
        if !eligible {
            return Err(ActionError::not_available(
                action.id,
                format!("group {} is not eligible", slot.group_index),
            ));
        }
        if !self.available.remove(&(slot.group_index, slot.push_index)) {
            return Err(ActionError::not_available(
                action.id,
                "push resource already consumed",
            ));
        }
        debug!(
            episode = %self.episode,
            action_id = action.id,
            push_order = slot.push_order,
            remaining = self.available.len(),
            "Consumed push action"
        );
        Ok(())
    }

    /// Whether the push resource of `action` is still available.
    /// The no-op is always available.
    pub fn is_available(&self, action: &Action) -> bool {
        if action.is_noop() {
            return true;
        }
        if action.episode != self.episode {
            return false;
        }
        self.slot(action.id)
            .map(|s| self.available.contains(&(s.group_index, s.push_index)))
            .unwrap_or(false)
    }

    /// True once every push-eligible resource has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.available.is_empty()
    }

    /// Number of push resources not yet consumed.
    pub fn remaining(&self) -> usize {
        self.available.len()
    }

    /// Available non-no-op actions, in id order.
    pub fn available_actions(&self) -> impl Iterator<Item = Action> + '_ {
        self.slots.iter().enumerate().filter_map(move |(i, slot)| {
            self.available
                .contains(&(slot.group_index, slot.push_index))
                .then(|| Action {
                    id: i + 1,
                    group_index: slot.group_index,
                    source_index: 0,
                    push_index: slot.push_index,
                    episode: self.episode,
                })
        })
    }

    /// Available push resources, in id order.
    pub fn push_resources(&self) -> Vec<&Resource> {
        self.available_actions()
            .filter_map(|a| a.push(self))
            .collect()
    }

    /// Resolve a non-no-op action of this space into a detached decision.
    pub fn resolve(&self, action: &Action) -> Result<PushDecision, ActionError> {
        if action.episode != self.episode {
            return Err(ActionError::not_available(
                action.id,
                "action belongs to a different action space",
            ));
        }
        match (action.source(self), action.push(self)) {
            (Some(source), Some(push)) => Ok(PushDecision {
                source: source.clone(),
                push: push.clone(),
            }),
            _ => Err(ActionError::not_available(
                action.id,
                "no-op has no push resource",
            )),
        }
    }
}
