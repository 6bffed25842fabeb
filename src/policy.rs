//! Push Policy
//!
//! The output artifact of an episode: for each source url, the ordered set of
//! urls to push when that source is requested.

use crate::action::{Action, ActionSpace, PushDecision};
use crate::error::ActionError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Source url → push urls, in the order the pushes were chosen.
///
/// Serializes as `{"push": {"<source>": ["<push>", ...]}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    #[serde(default)]
    push: BTreeMap<String, Vec<String>>,
}

impl Policy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `push` to the targets of `source`.
    ///
    /// Returns false, leaving the policy unchanged, when the pair is already present.
    pub fn add_push(&mut self, source: impl Into<String>, push: impl Into<String>) -> bool {
        let push = push.into();
        let targets = self.push.entry(source.into()).or_default();
        if targets.contains(&push) {
            return false;
        }
        targets.push(push);
        true
    }

    /// Push targets for `source`, empty when it has none.
    pub fn push_targets(&self, source: &str) -> &[String] {
        self.push.get(source).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, source: &str, push: &str) -> bool {
        self.push_targets(source).iter().any(|p| p == push)
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.push.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.push.iter().map(|(s, p)| (s.as_str(), p.as_slice()))
    }

    /// Number of sources with at least one push.
    pub fn len(&self) -> usize {
        self.push.len()
    }

    pub fn is_empty(&self) -> bool {
        self.push.is_empty()
    }

    pub fn total_pushes(&self) -> usize {
        self.push.values().map(Vec::len).sum()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Fold resolved decisions into a policy, preserving their order.
pub fn assemble_decisions<'a, I>(decisions: I) -> Policy
where
    I: IntoIterator<Item = &'a PushDecision>,
{
    let mut policy = Policy::new();
    for decision in decisions {
        policy.add_push(decision.source.url(), decision.push.url());
    }
    policy
}

/// Fold consumed actions of `space` into a policy.
///
/// No-op actions are skipped. Actions decoded by another space are rejected
/// with `ActionNotAvailable`. Neither the space nor the actions are modified.
pub fn assemble(space: &ActionSpace, actions: &[Action]) -> Result<Policy, ActionError> {
    let decisions = actions
        .iter()
        .filter(|a| !a.is_noop())
        .map(|a| space.resolve(a))
        .collect::<Result<Vec<_>, _>>()?;
    let policy = assemble_decisions(&decisions);
    debug!(
        sources = policy.len(),
        pushes = policy.total_pushes(),
        "Assembled push policy"
    );
    Ok(policy)
}
