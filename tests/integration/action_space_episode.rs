//! Integration tests for the action codec, sampler and episode driver

use super::test_utils::{resource, sample_groups};
use pushwise::action::{ActionSpace, ActionSpaceConfig};
use pushwise::episode::{run_episode, GreedyAgent, SamplingAgent, Termination};
use pushwise::error::ActionError;
use pushwise::resource::PushGroup;
use pushwise::NOOP_ACTION_ID;

fn seeded(seed: u64) -> ActionSpaceConfig {
    ActionSpaceConfig {
        seed: Some(seed),
        ..ActionSpaceConfig::default()
    }
}

#[test]
fn test_codec_enumerates_groups_then_pushes() {
    let space = ActionSpace::with_config(sample_groups(), &seeded(1)).unwrap();
    assert_eq!(space.num_actions(), 4);
    assert_eq!(space.max_action_id(), 3);

    let pushes: Vec<(&str, &str)> = (1..=3)
        .map(|id| {
            let action = space.decode_action_id(id).unwrap();
            (
                action.source(&space).unwrap().url(),
                action.push(&space).unwrap().url(),
            )
        })
        .collect();
    assert_eq!(
        pushes,
        vec![
            ("http://a.com/", "http://a.com/app.js"),
            ("http://a.com/", "http://a.com/app.css"),
            ("http://cdn.net/lib.js", "http://cdn.net/font.woff"),
        ]
    );

    let noop = space.decode_action_id(NOOP_ACTION_ID).unwrap();
    assert!(noop.is_noop());
    assert!(noop.push(&space).is_none());
    assert!(matches!(
        space.decode_action_id(4),
        Err(ActionError::UnknownAction { id: 4, max_id: 3 })
    ));
}

#[test]
fn test_untrainable_group_has_no_actions() {
    let mut groups = sample_groups();
    groups.push(
        PushGroup::new(
            2,
            "ads.example",
            vec![
                resource("http://ads.example/tag.js", 5).with_trainable(false),
                resource("http://ads.example/pixel.gif", 6),
            ],
        )
        .unwrap(),
    );
    let space = ActionSpace::with_config(groups, &seeded(1)).unwrap();
    assert_eq!(space.num_actions(), 4);
    assert!(space
        .push_resources()
        .iter()
        .all(|r| !r.url().starts_with("http://ads.example")));
}

#[test]
fn test_same_seed_same_samples() {
    let mut left = ActionSpace::with_config(sample_groups(), &seeded(99)).unwrap();
    let mut right = ActionSpace::with_config(sample_groups(), &seeded(99)).unwrap();
    let a: Vec<_> = (0..64).map(|_| left.sample()).collect();
    let b: Vec<_> = (0..64).map(|_| right.sample()).collect();
    assert_eq!(a, b);
    assert!(a.iter().all(|&id| id <= 3));
}

#[test]
fn test_consumed_actions_are_never_sampled() {
    let mut space = ActionSpace::with_config(sample_groups(), &seeded(5)).unwrap();
    let first = space.decode_action_id(1).unwrap();
    space.use_action(&first).unwrap();
    assert!(!space.is_available(&first));

    for _ in 0..500 {
        assert_ne!(space.sample(), 1);
    }
    assert!(matches!(
        space.use_action(&first),
        Err(ActionError::ActionNotAvailable { id: 1, .. })
    ));
}

#[test]
fn test_greedy_episode_consumes_by_order() {
    let mut space = ActionSpace::with_config(sample_groups(), &seeded(3)).unwrap();
    let outcome = run_episode(&mut space, &mut GreedyAgent, None).unwrap();
    assert_eq!(outcome.termination, Termination::Exhausted);

    let ids: Vec<_> = outcome.actions.iter().map(|a| a.id()).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[test]
fn test_sampling_episode_is_reproducible() {
    let mut left = ActionSpace::with_config(sample_groups(), &seeded(2024)).unwrap();
    let mut right = ActionSpace::with_config(sample_groups(), &seeded(2024)).unwrap();

    let a = run_episode(&mut left, &mut SamplingAgent, None).unwrap();
    let b = run_episode(&mut right, &mut SamplingAgent, None).unwrap();

    let ids = |o: &pushwise::EpisodeOutcome| o.actions.iter().map(|a| a.id()).collect::<Vec<_>>();
    assert_eq!(ids(&a), ids(&b));
    assert_eq!(a.termination, b.termination);
}

#[test]
fn test_actions_do_not_cross_spaces() {
    let first = ActionSpace::with_config(sample_groups(), &seeded(1)).unwrap();
    let mut second = ActionSpace::with_config(sample_groups(), &seeded(1)).unwrap();
    let stale = first.decode_action_id(2).unwrap();

    assert!(!second.is_available(&stale));
    assert!(matches!(
        second.use_action(&stale),
        Err(ActionError::ActionNotAvailable { id: 2, .. })
    ));
    assert_eq!(second.remaining(), 3);
}
