//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::PushError;

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &PushError) -> String {
    match e {
        PushError::Action(inner) => format!("Invalid action: {}", inner),
        PushError::Resource(inner) => format!("Invalid push groups: {}", inner),
        other => other.to_string(),
    }
}
