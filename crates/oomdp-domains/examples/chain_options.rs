//! Example: primitive moves and a multi-step option on a chain

use std::sync::Arc;

use oomdp_core::AttributeSelection;
use oomdp_domains::Chain;
use oomdp_learning::{QLearning, QLearningConfig};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "debug".into()))
        .init();

    let config = QLearningConfig {
        gamma: 0.9,
        learning_rate: 0.5,
        epsilon: 0.2,
        max_episodes_for_planning: 50,
        max_delta_for_termination: 1e-4,
        seed: Some(7),
        ..QLearningConfig::default()
    };

    let chain = Chain::new(8);
    let domain = chain.domain_with_option(3, config.gamma)?;
    let start = Chain::state(&domain, 0)?;

    let mut learner = QLearning::new(
        domain,
        Arc::new(chain.reward()),
        Arc::new(chain.terminal()),
        AttributeSelection::all_observable(),
        &config,
    )?;
    let report = learner.plan_from_state(&start)?;
    println!(
        "Episodes: {}, converged: {}, last max delta: {:.5}",
        report.episodes_run, report.converged, report.last_max_delta
    );

    for qv in learner.q_values(&start)? {
        println!("Q(start, {}) = {:.4}", qv.action, qv.q);
    }

    Ok(())
}
