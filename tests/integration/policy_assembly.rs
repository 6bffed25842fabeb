//! End-to-end tests: captures to groups to actions to a push policy

use super::test_utils::capture;
use pushwise::action::{ActionSpace, ActionSpaceConfig};
use pushwise::episode::{run_episode, GreedyAgent};
use pushwise::grouping::DomainGroupBuilder;
use pushwise::policy::{assemble, assemble_decisions, Policy};
use pushwise::stable_set::{ReplayCaptureSource, StableSetExtractor};

const LOAD: [&str; 5] = [
    "http://a.com/",
    "http://a.com/app.js",
    "http://cdn.net/lib.js",
    "http://a.com/app.css",
    "http://cdn.net/font.woff",
];

fn extracted_space() -> ActionSpace {
    let mut source = ReplayCaptureSource::new((0..3).map(|_| capture(&LOAD)));
    let groups = StableSetExtractor::new(3, DomainGroupBuilder::new())
        .extract(&mut source)
        .unwrap()
        .into_groups();
    ActionSpace::with_config(
        groups,
        &ActionSpaceConfig {
            seed: Some(8),
            ..ActionSpaceConfig::default()
        },
    ).unwrap()
}

#[test]
fn test_greedy_policy_from_captures() {
    let mut space = extracted_space();
    assert_eq!(space.num_actions(), 4);

    let outcome = run_episode(&mut space, &mut GreedyAgent, None).unwrap();
    let policy = assemble(&space, &outcome.actions).unwrap();

    assert_eq!(
        policy.push_targets("http://a.com/"),
        ["http://a.com/app.js", "http://a.com/app.css"]
    );
    assert_eq!(
        policy.push_targets("http://cdn.net/lib.js"),
        ["http://cdn.net/font.woff"]
    );
    assert_eq!(policy.total_pushes(), 3);
}

#[test]
fn test_noops_and_order_of_choice() {
    let space = extracted_space();
    let actions = vec![
        space.decode_action_id(2).unwrap(),
        space.noop(),
        space.decode_action_id(1).unwrap(),
    ];
    let policy = assemble(&space, &actions).unwrap();
    assert_eq!(
        policy.push_targets("http://a.com/"),
        ["http://a.com/app.css", "http://a.com/app.js"]
    );
    assert!(policy.push_targets("http://cdn.net/lib.js").is_empty());
}

#[test]
fn test_decisions_outlive_the_space() {
    let decisions = {
        let space = extracted_space();
        (1..=3)
            .map(|id| space.resolve(&space.decode_action_id(id).unwrap()).unwrap())
            .collect::<Vec<_>>()
    };
    let policy = assemble_decisions(&decisions);
    assert_eq!(policy.len(), 2);
    assert!(policy.contains("http://cdn.net/lib.js", "http://cdn.net/font.woff"));
}

#[test]
fn test_policy_document_reloads() {
    let mut space = extracted_space();
    let outcome = run_episode(&mut space, &mut GreedyAgent, None).unwrap();
    let policy = assemble(&space, &outcome.actions).unwrap();

    let document = policy.to_json_pretty().unwrap();
    let value: serde_json::Value = serde_json::from_str(&document).unwrap();
    assert_eq!(value["push"]["http://a.com/"][0], "http://a.com/app.js");
    assert_eq!(Policy::from_json(&document).unwrap(), policy);
}
