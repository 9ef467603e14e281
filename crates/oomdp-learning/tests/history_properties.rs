use oomdp_core::{EpisodeAnalysis, State};
use oomdp_learning::EpisodeHistory;
use proptest::prelude::*;
use proptest::test_runner::Config as ProptestConfig;
use std::collections::VecDeque;

/// `None` pushes an episode, `Some(n)` sets the capacity to `n`
fn arb_ops() -> impl Strategy<Value = Vec<Option<usize>>> {
    prop::collection::vec(prop::option::weighted(0.2, 0usize..6), 0..60)
}

proptest! {
    #![proptest_config(ProptestConfig {
        failure_persistence: None,
        ..ProptestConfig::default()
    })]

    #[test]
    fn history_keeps_newest_episodes_in_order(initial in 0usize..6, ops in arb_ops()) {
        let mut history = EpisodeHistory::new(initial);
        let mut capacity = initial.max(1);
        let mut expected = VecDeque::new();

        for op in ops {
            match op {
                None => {
                    let episode = EpisodeAnalysis::new(State::new());
                    expected.push_back(episode.id);
                    history.push(episode);
                }
                Some(n) => {
                    capacity = n.max(1);
                    history.set_capacity(n);
                }
            }
            while expected.len() > capacity {
                expected.pop_front();
            }

            prop_assert_eq!(history.capacity(), capacity);
            prop_assert!(history.len() <= capacity);
            let kept: Vec<_> = history.iter().map(|e| e.id).collect();
            prop_assert_eq!(kept, expected.iter().copied().collect::<Vec<_>>());
        }
    }
}
