//! Shared identifiers and resource classification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense action identifier. `0` is always the no-op action.
pub type ActionId = usize;

/// The reserved no-op action identifier.
pub const NOOP_ACTION_ID: ActionId = 0;

/// Kind of page asset, as reported by the capture pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Document,
    Script,
    Stylesheet,
    Image,
    Font,
    /// Anything the capture pipeline reports that is not listed above
    #[default]
    #[serde(other)]
    Other,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Document => "document",
            ResourceType::Script => "script",
            ResourceType::Stylesheet => "stylesheet",
            ResourceType::Image => "image",
            ResourceType::Font => "font",
            ResourceType::Other => "other",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle identifying the episode (action space instance) an action was decoded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EpisodeId(pub(crate) u64);

impl EpisodeId {
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EpisodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "episode-{}", self.0)
    }
}
