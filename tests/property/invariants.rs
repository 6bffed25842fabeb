//! Property tests for action-space and policy invariants

use proptest::prelude::*;
use pushwise::action::{ActionSpace, ActionSpaceConfig};
use pushwise::episode::{run_episode, GreedyAgent, Termination};
use pushwise::error::ActionError;
use pushwise::policy::assemble;
use pushwise::resource::{PushGroup, Resource};

/// Groups with globally increasing orders; `(size, trainable)` per group.
fn build_groups(shape: &[(usize, bool)]) -> Vec<PushGroup> {
    let mut order = 0i64;
    let mut groups = Vec::new();
    for (g, &(size, trainable)) in shape.iter().enumerate() {
        let mut resources = Vec::new();
        for i in 0..size {
            let mut resource = Resource::new(format!("http://h{}.test/r{}", g, i), order).unwrap();
            if i == 0 {
                resource = resource.with_trainable(trainable);
            }
            resources.push(resource);
            order += 1;
        }
        groups.push(PushGroup::new(g, format!("h{}.test", g), resources).unwrap());
    }
    groups
}

fn shape_strategy() -> impl Strategy<Value = Vec<(usize, bool)>> {
    proptest::collection::vec((1usize..5, any::<bool>()), 0..6)
}

fn seeded(seed: u64) -> ActionSpaceConfig {
    ActionSpaceConfig {
        seed: Some(seed),
        ..ActionSpaceConfig::default()
    }
}

/// Action count is one no-op plus every non-anchor resource of trainable groups
#[test]
fn test_action_count_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&shape_strategy(), |shape| {
            let expected = 1 + shape
                .iter()
                .filter(|(_, trainable)| *trainable)
                .map(|(size, _)| size - 1)
                .sum::<usize>();
            let space = ActionSpace::with_config(build_groups(&shape), &seeded(0)).unwrap();

            prop_assert_eq!(space.num_actions(), expected);
            prop_assert_eq!(space.remaining(), expected - 1);
            let unknown = matches!(
                space.decode_action_id(expected),
                Err(ActionError::UnknownAction { .. })
            );
            prop_assert!(unknown);
            Ok(())
        })
        .unwrap();
}

/// Greedy episodes consume every push once, in ascending order
#[test]
fn test_greedy_exhaustion_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(shape_strategy(), any::<u64>()), |(shape, seed)| {
            let mut space = ActionSpace::with_config(build_groups(&shape), &seeded(seed)).unwrap();
            let pushes = space.remaining();
            let outcome = run_episode(&mut space, &mut GreedyAgent, None).unwrap();

            prop_assert_eq!(outcome.actions.len(), pushes);
            prop_assert!(space.is_exhausted());
            if pushes > 0 {
                prop_assert_eq!(outcome.termination, Termination::Exhausted);
            }

            let orders: Vec<u32> = outcome
                .actions
                .iter()
                .map(|a| a.push(&space).unwrap().order())
                .collect();
            prop_assert!(orders.windows(2).all(|w| w[0] < w[1]));

            let policy = assemble(&space, &outcome.actions).unwrap();
            prop_assert_eq!(policy.total_pushes(), pushes);
            prop_assert_eq!(&policy, &assemble(&space, &outcome.actions).unwrap());
            Ok(())
        })
        .unwrap();
}

/// Consumed actions are never sampled again and cannot be reused
#[test]
fn test_consumed_never_resampled_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(shape_strategy(), any::<u64>(), proptest::collection::vec(any::<usize>(), 0..8)),
            |(shape, seed, picks)| {
                let mut space = ActionSpace::with_config(build_groups(&shape), &seeded(seed)).unwrap();
                let max_id = space.max_action_id();
                prop_assume!(max_id > 0);

                let mut consumed = Vec::new();
                for pick in picks {
                    let id = 1 + pick % max_id;
                    let action = space.decode_action_id(id).unwrap();
                    if space.use_action(&action).is_ok() {
                        consumed.push(id);
                    } else {
                        prop_assert!(consumed.contains(&id));
                    }
                }

                for _ in 0..50 {
                    let id = space.sample();
                    prop_assert!(!consumed.contains(&id));
                    prop_assert!(id <= max_id);
                }
                prop_assert_eq!(space.remaining(), max_id - consumed.len());
                Ok(())
            },
        )
        .unwrap();
}
