//! Tabular Q-learning with option-aware TD(0) updates

use std::sync::Arc;
use tracing::{debug, info, trace};

use oomdp_core::{
    ActionKind, AttributeSelection, Domain, EpisodeAnalysis, EpisodeStatus, GroundedAction,
    HashedState, Result, RewardFunction, State, StateHashFactory, TerminalFunction,
};

use crate::{EpisodeHistory, EpsilonGreedy, Policy, QComputable, QLearningConfig, QTable, QValue};

/// Outcome of one planning call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanningReport {
    /// Learning episodes actually run
    pub episodes_run: usize,
    /// Whether the run stopped on the convergence threshold
    pub converged: bool,
    /// Largest value change of the final episode
    pub last_max_delta: f64,
}

/// Q-learning control engine
///
/// Owns the value table and the episode history. The behavior policy only
/// borrows the table while choosing an action.
pub struct QLearning {
    domain: Arc<Domain>,
    reward: Arc<dyn RewardFunction>,
    terminal: Arc<dyn TerminalFunction>,
    gamma: f64,
    learning_rate: f64,
    max_episode_size: usize,
    table: QTable,
    policy: Box<dyn Policy>,
    episode_step_counter: usize,
    num_episodes_for_planning: usize,
    max_delta_for_termination: f64,
    max_delta_in_last_episode: f64,
    history: EpisodeHistory,
}

impl QLearning {
    /// Create an engine; the default policy is epsilon-greedy
    pub fn new(
        domain: Arc<Domain>,
        reward: Arc<dyn RewardFunction>,
        terminal: Arc<dyn TerminalFunction>,
        selection: AttributeSelection,
        config: &QLearningConfig,
    ) -> Result<Self> {
        config.validate()?;
        let policy: Box<dyn Policy> = match config.seed {
            Some(seed) => Box::new(EpsilonGreedy::with_seed(config.epsilon, seed)),
            None => Box::new(EpsilonGreedy::new(config.epsilon)),
        };
        let table = QTable::new(
            Arc::clone(&domain),
            StateHashFactory::new(selection),
            config.q_init,
        );
        let mut engine = Self {
            domain,
            reward,
            terminal,
            gamma: config.gamma,
            learning_rate: config.learning_rate,
            max_episode_size: config.max_episode_size,
            table,
            policy,
            episode_step_counter: 0,
            num_episodes_for_planning: 1,
            max_delta_for_termination: 0.0,
            max_delta_in_last_episode: f64::INFINITY,
            history: EpisodeHistory::new(1),
        };
        engine.set_max_episodes_for_planning(config.max_episodes_for_planning);
        engine.set_max_delta_for_termination(config.max_delta_for_termination);
        engine.set_episodes_to_store(config.episodes_to_store);
        debug!(
            gamma = engine.gamma,
            learning_rate = engine.learning_rate,
            max_episode_size = engine.max_episode_size,
            "Q-learning engine created"
        );
        Ok(engine)
    }

    /// Domain the engine learns in
    #[must_use]
    pub fn domain(&self) -> &Arc<Domain> {
        &self.domain
    }

    /// Replace the behavior policy
    pub fn set_policy(&mut self, policy: Box<dyn Policy>) {
        self.policy = policy;
    }

    /// Episode budget of [`QLearning::plan_from_state`]; 0 becomes 1
    pub fn set_max_episodes_for_planning(&mut self, n: usize) {
        if n == 0 {
            debug!("episode budget of 0 clamped to 1");
        }
        self.num_episodes_for_planning = n.max(1);
    }

    /// Convergence threshold; non-positive values become 0, which disables
    /// early stopping
    pub fn set_max_delta_for_termination(&mut self, m: f64) {
        self.max_delta_for_termination = if m > 0.0 {
            m
        } else {
            if m != 0.0 {
                debug!(threshold = m, "convergence threshold clamped to 0");
            }
            0.0
        };
    }

    /// Capacity of the episode history; 0 becomes 1. Shrinking drops the
    /// oldest stored episodes.
    pub fn set_episodes_to_store(&mut self, n: usize) {
        if n == 0 {
            debug!("history capacity of 0 clamped to 1");
        }
        self.history.set_capacity(n);
    }

    /// Values of every applicable action in `state`
    pub fn q_values(&mut self, state: &State) -> Result<Vec<QValue>> {
        self.table.q_values(state)
    }

    /// Value of `action` in `state`; fails if the action is not in the
    /// state's action set
    pub fn q_value(&mut self, state: &State, action: &GroundedAction) -> Result<QValue> {
        self.table.q_value(state, action)
    }

    /// Largest action value of `state`, 0 when no action applies
    pub fn value(&mut self, state: &State) -> Result<f64> {
        let hashed = self.table.hash(state)?;
        Ok(self.table.max_q(&hashed))
    }

    /// Primitive steps taken in the last episode
    #[must_use]
    pub fn last_num_steps(&self) -> usize {
        self.episode_step_counter
    }

    /// Largest value change of the last episode
    #[must_use]
    pub fn last_max_delta(&self) -> f64 {
        self.max_delta_in_last_episode
    }

    /// Most recently completed episode
    #[must_use]
    pub fn last_learning_episode(&self) -> Option<&EpisodeAnalysis> {
        self.history.last()
    }

    /// Retained episodes, oldest first
    #[must_use]
    pub fn stored_episodes(&self) -> &EpisodeHistory {
        &self.history
    }

    /// Number of abstract states in the value table
    #[must_use]
    pub fn table_size(&self) -> usize {
        self.table.len()
    }

    /// Forget every learned value
    pub fn reset_values(&mut self) {
        self.table.clear();
        debug!("value table cleared");
    }

    /// Run one episode from `initial_state`, updating values as it goes
    pub fn run_learning_episode(&mut self, initial_state: &State) -> Result<EpisodeAnalysis> {
        let mut episode = EpisodeAnalysis::new(initial_state.clone());
        let mut current = self.table.hash(initial_state)?;
        self.episode_step_counter = 0;
        self.max_delta_in_last_episode = 0.0;

        while !self.terminal.is_terminal(current.state())
            && self.episode_step_counter < self.max_episode_size
        {
            let action = self
                .policy
                .select_action(current.state(), &mut self.table)?;
            let slot = self.table.locate(&current, &action)?;

            let outcome = action.execute_in(current.state())?;
            let next = self.table.hash(&outcome.state)?;
            let max_q = if self.terminal.is_terminal(next.state()) {
                0.0
            } else {
                self.table.max_q(&next)
            };

            let (reward, discount, steps) = match outcome.kind {
                ActionKind::Primitive => {
                    let r = self.reward.reward(current.state(), &action, next.state());
                    (r.value(), self.gamma, 1)
                }
                ActionKind::Option {
                    cumulative_reward,
                    steps,
                } => {
                    let n = i32::try_from(steps).unwrap_or(i32::MAX);
                    (cumulative_reward, self.gamma.powi(n), steps)
                }
            };
            // An option that took no step still consumes the step budget
            self.episode_step_counter += steps.max(1);
            episode.record_transition_to(next.state().clone(), action.clone(), reward);

            let q = self.table.value_at_mut(&slot)?;
            let old = *q;
            *q = old + self.learning_rate * (reward + discount * max_q - old);
            let delta = (*q - old).abs();
            self.max_delta_in_last_episode = self.max_delta_in_last_episode.max(delta);

            trace!(
                action = %action,
                reward,
                steps,
                old,
                new = *q,
                "TD update"
            );
            current = next;
        }

        let status = if self.terminal.is_terminal(current.state()) {
            EpisodeStatus::Terminal
        } else {
            EpisodeStatus::StepBudgetExhausted
        };
        episode.finish(status);
        debug!(
            steps = self.episode_step_counter,
            total_reward = episode.total_reward(),
            max_delta = self.max_delta_in_last_episode,
            ?status,
            "learning episode finished"
        );
        self.history.push(episode.clone());
        Ok(episode)
    }

    /// Run learning episodes from `initial_state` until the budget is spent
    /// or an episode changes no value by more than the threshold
    pub fn plan_from_state(&mut self, initial_state: &State) -> Result<PlanningReport> {
        let mut report = PlanningReport {
            episodes_run: 0,
            converged: false,
            last_max_delta: f64::INFINITY,
        };
        for _ in 0..self.num_episodes_for_planning {
            self.run_learning_episode(initial_state)?;
            report.episodes_run += 1;
            report.last_max_delta = self.max_delta_in_last_episode;
            if self.max_delta_for_termination > 0.0
                && self.max_delta_in_last_episode <= self.max_delta_for_termination
            {
                report.converged = true;
                break;
            }
        }
        info!(
            episodes = report.episodes_run,
            converged = report.converged,
            last_max_delta = report.last_max_delta,
            states = self.table.len(),
            "planning finished"
        );
        Ok(report)
    }

    /// Hash a state with the engine's attribute selection
    pub fn hash(&self, state: &State) -> Result<HashedState> {
        self.table.hash(state)
    }
}
