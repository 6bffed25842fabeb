//! CLI domain: parse, route, output, and presentation only.
//! No domain orchestration; single route table dispatches to domain services.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{AgentKind, Cli, Commands, ConfigCommands};
pub use presentation::{
    action_rows, format_actions_json, format_actions_text, format_decoded_json,
    format_decoded_text, format_groups_json, ActionRow,
};
pub use route::RunContext;
