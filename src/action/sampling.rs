//! Order-decaying sampling weights.
//!
//! Push candidates are weighted `decay^rank`, where `rank` is the dense rank of
//! the push resource's `order` among all push-eligible resources of the space.
//! Weights are fixed when the space is built, so consuming resources never
//! changes the relative preference between the ones left.

use crate::error::PushError;
use crate::types::ActionId;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

pub const DEFAULT_DECAY: f64 = 0.75;
pub const DEFAULT_NOOP_WEIGHT: f64 = 0.5;

/// Exponential decay over push order, plus a constant no-op weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayWeighting {
    decay: f64,
    noop_weight: f64,
}

impl Default for DecayWeighting {
    fn default() -> Self {
        Self {
            decay: DEFAULT_DECAY,
            noop_weight: DEFAULT_NOOP_WEIGHT,
        }
    }
}

/// `decay` must lie in (0, 1) and `noop_weight` must be finite and positive.
pub(crate) fn check(decay: f64, noop_weight: f64) -> Result<(), String> {
    if !(decay > 0.0 && decay < 1.0) {
        return Err(format!("decay must be in (0, 1), got {}", decay));
    }
    if !(noop_weight.is_finite() && noop_weight > 0.0) {
        return Err(format!("noop_weight must be positive, got {}", noop_weight));
    }
    Ok(())
}

impl DecayWeighting {
    pub fn new(decay: f64, noop_weight: f64) -> Result<Self, PushError> {
        check(decay, noop_weight)
            .map_err(|msg| PushError::ConfigError(format!("action_space: {}", msg)))?;
        Ok(Self { decay, noop_weight })
    }

    pub fn decay(&self) -> f64 {
        self.decay
    }

    pub fn noop_weight(&self) -> f64 {
        self.noop_weight
    }

    /// Weight for each push order, strictly decreasing as order increases.
    pub fn push_weights(&self, orders: &[u32]) -> Vec<f64> {
        let mut distinct = orders.to_vec();
        distinct.sort_unstable();
        distinct.dedup();

        orders
            .iter()
            .map(|order| {
                let rank = distinct.binary_search(order).unwrap_or(0);
                self.decay.powi(rank as i32)
            })
            .collect()
    }
}

/// Draw one id from weighted candidates.
///
/// Returns `None` when no candidate carries positive weight.
pub fn draw<R: Rng + ?Sized>(rng: &mut R, candidates: &[(ActionId, f64)]) -> Option<ActionId> {
    let dist = WeightedIndex::new(candidates.iter().map(|(_, w)| *w)).ok()?;
    Some(candidates[dist.sample(rng)].0)
}
