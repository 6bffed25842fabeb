//! Integration tests for the command-line route table

use super::test_utils::{capture, resource, sample_groups, write_json};
use clap::Parser;
use pushwise::cli::{map_error, Cli, RunContext};
use pushwise::config::PushwiseConfig;
use pushwise::error::{ActionError, PushError, ResourceError};
use pushwise::policy::Policy;
use pushwise::resource::PushGroup;
use tempfile::TempDir;

fn run(workspace: &TempDir, args: &[&str]) -> Result<String, PushError> {
    let mut argv = vec!["pushwise"];
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv).unwrap();
    let context =
        RunContext::with_config(workspace.path().to_path_buf(), PushwiseConfig::default())?;
    context.execute(&cli.command)
}

fn workspace_with_groups() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    write_json(temp_dir.path(), "groups.json", &sample_groups());
    temp_dir
}

#[test]
fn test_stable_set_prints_groups() {
    let temp_dir = TempDir::new().unwrap();
    let load = ["http://a.com/", "http://a.com/app.js", "http://cdn.net/lib.js"];
    write_json(temp_dir.path(), "run1.json", &capture(&load));
    write_json(temp_dir.path(), "run2.json", &capture(&load));

    let output = run(&temp_dir, &["stable-set", "run1.json", "run2.json"]).unwrap();
    let groups: Vec<PushGroup> = serde_json::from_str(&output).unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].name(), "a.com");
    assert_eq!(groups[1].anchor().url(), "http://cdn.net/lib.js");
}

#[test]
fn test_stable_set_writes_output_file() {
    let temp_dir = TempDir::new().unwrap();
    write_json(temp_dir.path(), "run1.json", &capture(&["http://a.com/", "http://a.com/x.js"]));

    let output = run(
        &temp_dir,
        &["stable-set", "run1.json", "--output", "groups.json"],
    )
    .unwrap();
    assert!(output.starts_with("Wrote 1 group(s)"));

    let text = std::fs::read_to_string(temp_dir.path().join("groups.json")).unwrap();
    let groups: Vec<PushGroup> = serde_json::from_str(&text).unwrap();
    assert_eq!(groups[0].len(), 2);
}

#[test]
fn test_actions_json_lists_every_id() {
    let temp_dir = workspace_with_groups();
    let output = run(&temp_dir, &["actions", "--groups", "groups.json", "--format", "json"]).unwrap();
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(value["total"], 3);
    assert_eq!(value["actions"][3]["push"], "http://cdn.net/font.woff");
    assert_eq!(value["actions"][3]["source"], "http://cdn.net/lib.js");
}

#[test]
fn test_actions_text_table() {
    let temp_dir = workspace_with_groups();
    let output = run(&temp_dir, &["actions", "--groups", "groups.json"]).unwrap();
    assert!(output.contains("no-op"));
    assert!(output.contains("http://a.com/app.css"));
}

#[test]
fn test_decode() {
    let temp_dir = workspace_with_groups();
    let output = run(&temp_dir, &["decode", "--groups", "groups.json", "2"]).unwrap();
    assert!(output.contains("Push: http://a.com/app.css"));
    assert!(output.contains("Order: 3"));

    let err = run(&temp_dir, &["decode", "--groups", "groups.json", "9"]).unwrap_err();
    assert!(matches!(
        err,
        PushError::Action(ActionError::UnknownAction { id: 9, max_id: 3 })
    ));
    assert!(map_error(&err).starts_with("Invalid action"));
}

#[test]
fn test_greedy_policy_command() {
    let temp_dir = workspace_with_groups();
    let output = run(
        &temp_dir,
        &["policy", "--groups", "groups.json", "--agent", "greedy"],
    )
    .unwrap();
    let policy = Policy::from_json(&output).unwrap();
    assert_eq!(
        policy.push_targets("http://a.com/"),
        ["http://a.com/app.js", "http://a.com/app.css"]
    );
    assert_eq!(policy.total_pushes(), 3);
}

#[test]
fn test_seeded_policy_command_is_repeatable() {
    let temp_dir = workspace_with_groups();
    let args = ["policy", "--groups", "groups.json", "--seed", "41"];
    assert_eq!(run(&temp_dir, &args).unwrap(), run(&temp_dir, &args).unwrap());
}

#[test]
fn test_duplicate_orders_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let groups = vec![
        PushGroup::new(0, "a", vec![resource("http://a/", 0), resource("http://a/1", 1)]).unwrap(),
        PushGroup::new(1, "b", vec![resource("http://b/", 1)]).unwrap(),
    ];
    write_json(temp_dir.path(), "groups.json", &groups);

    let err = run(&temp_dir, &["actions", "--groups", "groups.json"]).unwrap_err();
    assert!(matches!(
        err,
        PushError::Resource(ResourceError::DuplicateOrder { order: 1, .. })
    ));
}

#[test]
fn test_config_show() {
    let temp_dir = TempDir::new().unwrap();
    let output = run(&temp_dir, &["config", "show"]).unwrap();
    assert!(output.contains("[stable_set]"));
    assert!(output.contains("runs = 10"));

    let output = run(&temp_dir, &["config", "show", "--format", "json"]).unwrap();
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(value["action_space"]["decay"], 0.75);
}

#[test]
fn test_invalid_config_rejected_by_context() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = PushwiseConfig::default();
    config.stable_set.runs = 0;
    let result = RunContext::with_config(temp_dir.path().to_path_buf(), config);
    assert!(matches!(result, Err(PushError::ConfigError(_))));
}
