//! Example: Q-learning in a walled grid world

use std::sync::Arc;

use oomdp_core::AttributeSelection;
use oomdp_domains::{GoalReached, GoalReward, GridWorld};
use oomdp_learning::{GreedyQPolicy, QLearning, QLearningConfig};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // 5x5 grid with a partial wall down the middle
    let world = GridWorld::new(5, 5)
        .with_walls([(2, 0), (2, 1), (2, 2), (2, 3)])
        .with_slip(0.1)
        .with_seed(42);
    let domain = world.domain()?;
    let start = GridWorld::state(&domain, (0, 0), &[(4, 0)])?;

    let config = QLearningConfig {
        gamma: 0.95,
        learning_rate: 0.2,
        epsilon: 0.1,
        max_episode_size: 200,
        max_episodes_for_planning: 300,
        episodes_to_store: 10,
        seed: Some(42),
        ..QLearningConfig::default()
    };
    let mut learner = QLearning::new(
        Arc::clone(&domain),
        Arc::new(GoalReward::default()),
        Arc::new(GoalReached),
        AttributeSelection::all_observable(),
        &config,
    )?;

    let report = learner.plan_from_state(&start)?;
    println!(
        "Planned {} episodes, {} states in table",
        report.episodes_run,
        learner.table_size()
    );

    for (i, episode) in learner.stored_episodes().iter().enumerate() {
        println!(
            "Episode {}: Steps = {}, Total Reward = {:.2}",
            i + 1,
            episode.len(),
            episode.total_reward()
        );
    }

    // Follow the learned values without exploration
    learner.set_policy(Box::new(GreedyQPolicy));
    let episode = learner.run_learning_episode(&start)?;
    println!("\nGreedy run ({} steps):", episode.len());
    for action in episode.actions() {
        println!("  {action}");
    }
    println!("Value of start state: {:.3}", learner.value(&start)?);

    Ok(())
}
