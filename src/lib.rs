//! Pushwise: Learned Server Push
//!
//! Turns repeated page-load captures into a stable, ordered set of push
//! groups, encodes every (source, push) decision over those groups as a flat
//! integer action space for a learning agent, and folds the actions an agent
//! takes into a push policy.

pub mod action;
pub mod cli;
pub mod config;
pub mod episode;
pub mod error;
pub mod grouping;
pub mod logging;
pub mod policy;
pub mod resource;
pub mod service;
pub mod stable_set;
pub mod types;

pub use action::{Action, ActionSpace, ActionSpaceConfig, PushDecision};
pub use episode::{run_episode, Agent, EpisodeOutcome, GreedyAgent, SamplingAgent, Termination};
pub use error::{ActionError, CaptureError, PushError, ResourceError};
pub use grouping::DomainGroupBuilder;
pub use policy::{assemble, Policy};
pub use resource::{PushGroup, Resource};
pub use service::{Page, PolicyService, ServiceConfig};
pub use stable_set::{Capture, CaptureSource, StableSet, StableSetExtractor};
pub use types::{ActionId, ResourceType, NOOP_ACTION_ID};
