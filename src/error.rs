//! Error types for push-decision extraction, encoding and policy assembly.

use crate::types::ActionId;
use thiserror::Error;

/// Malformed resource or group data, raised at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    #[error("Invalid resource: url must not be empty")]
    EmptyUrl,

    #[error("Invalid resource {url}: order {order} is negative")]
    NegativeOrder { url: String, order: i64 },

    #[error("Invalid resource {url}: order {order} does not fit in a rank")]
    OrderOverflow { url: String, order: i64 },

    #[error("Invalid group {group}: a push group needs at least an anchor resource")]
    EmptyGroup { group: String },

    #[error(
        "Invalid group {group}: resource {url} (order {order}) must load after {previous} (order {previous_order})"
    )]
    GroupOrder {
        group: String,
        url: String,
        order: u32,
        previous: String,
        previous_order: u32,
    },

    #[error("Invalid group list: order {order} is used by both {first} and {second}")]
    DuplicateOrder {
        order: u32,
        first: String,
        second: String,
    },
}

/// Errors raised by the action codec and availability state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("Unknown action: id {id} is outside [0, {max_id}]")]
    UnknownAction { id: ActionId, max_id: ActionId },

    #[error("Action {id} not available: {reason}")]
    ActionNotAvailable { id: ActionId, reason: String },
}

impl ActionError {
    pub(crate) fn not_available(id: ActionId, reason: impl Into<String>) -> Self {
        ActionError::ActionNotAvailable {
            id,
            reason: reason.into(),
        }
    }
}

/// Failure reported by a capture source.
///
/// An empty capture is not an error; it is skipped by the extractor.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Capture {attempt} failed: {message}")]
    Failed { attempt: usize, message: String },

    #[error("Capture I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Capture parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Top-level error for the service, configuration and command-line layers.
#[derive(Debug, Error)]
pub enum PushError {
    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error(transparent)]
    Action(#[from] ActionError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<config::ConfigError> for PushError {
    fn from(err: config::ConfigError) -> Self {
        PushError::ConfigError(err.to_string())
    }
}

impl From<serde_json::Error> for PushError {
    fn from(err: serde_json::Error) -> Self {
        PushError::Serialization(err.to_string())
    }
}
