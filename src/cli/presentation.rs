//! CLI presentation: text and json formatters per command.

use crate::action::{Action, ActionSpace};
use crate::error::PushError;
use crate::resource::PushGroup;
use crate::types::ActionId;
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use serde::Serialize;
use serde_json::json;

/// One decoded action, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionRow {
    pub id: ActionId,
    pub group: Option<String>,
    pub source: Option<String>,
    pub push: Option<String>,
    pub order: Option<u32>,
}

impl ActionRow {
    pub fn from_action(space: &ActionSpace, action: &Action) -> Self {
        let group = if action.is_noop() {
            None
        } else {
            space
                .groups()
                .get(action.group_index())
                .map(|g| g.name().to_string())
        };
        let push = action.push(space);
        Self {
            id: action.id(),
            group,
            source: action.source(space).map(|r| r.url().to_string()),
            push: push.map(|r| r.url().to_string()),
            order: push.map(|r| r.order()),
        }
    }
}

/// Every action of `space`, no-op first.
pub fn action_rows(space: &ActionSpace) -> Vec<ActionRow> {
    (0..=space.max_action_id())
        .filter_map(|id| space.decode_action_id(id).ok())
        .map(|action| ActionRow::from_action(space, &action))
        .collect()
}

fn cell(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "-".to_string())
}

pub fn format_actions_text(rows: &[ActionRow]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Id", "Group", "Source", "Push", "Order"]);
    for row in rows {
        let id = if row.id == 0 {
            "0 (no-op)".to_string()
        } else {
            row.id.to_string()
        };
        table.add_row(vec![
            id,
            cell(&row.group),
            cell(&row.source),
            cell(&row.push),
            row.order.map(|o| o.to_string()).unwrap_or_else(|| "-".to_string()),
        ]);
    }
    format!(
        "{}\n\nTotal: {} action(s) plus no-op",
        table,
        rows.len().saturating_sub(1)
    )
}

pub fn format_actions_json(rows: &[ActionRow]) -> String {
    let out = json!({ "actions": rows, "total": rows.len().saturating_sub(1) });
    serde_json::to_string_pretty(&out).unwrap_or_else(|_| "{}".to_string())
}

pub fn format_decoded_text(row: &ActionRow) -> String {
    if row.id == 0 {
        return "Action 0: no-op (push nothing)".to_string();
    }
    format!(
        "Action {}\n  Group: {}\n  Source: {}\n  Push: {}\n  Order: {}",
        row.id,
        cell(&row.group),
        cell(&row.source),
        cell(&row.push),
        row.order.map(|o| o.to_string()).unwrap_or_else(|| "-".to_string()),
    )
}

pub fn format_decoded_json(row: &ActionRow) -> String {
    serde_json::to_string_pretty(row).unwrap_or_else(|_| "{}".to_string())
}

pub fn format_groups_json(groups: &[PushGroup]) -> Result<String, PushError> {
    Ok(serde_json::to_string_pretty(groups)?)
}
