//! N-state chain
//!
//! A single walker moves along positions `0..n`. Entering the last position
//! pays 1 and ends the episode; every other transition pays 0.

use std::sync::Arc;

use oomdp_core::{
    Action, ActionSignature, Attribute, Domain, DomainBuilder, GroundedAction, MacroOption,
    OomdpError, Result, Reward, RewardFunction, State, TerminalFunction,
};

/// Walker object class
pub const CLASS_WALKER: &str = "walker";
/// Position attribute
pub const ATT_POS: &str = "pos";

/// Chain of `length` positions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chain {
    length: usize,
}

impl Chain {
    /// Chain with `length` positions; fewer than 2 is raised to 2
    #[must_use]
    pub fn new(length: usize) -> Self {
        Self {
            length: length.max(2),
        }
    }

    /// Number of positions
    #[must_use]
    pub fn length(&self) -> usize {
        self.length
    }

    /// Last position
    #[must_use]
    pub fn goal(&self) -> usize {
        self.length - 1
    }

    fn builder(&self) -> (DomainBuilder, Arc<dyn Action>) {
        let last = i64::try_from(self.goal()).unwrap_or(i64::MAX);
        let forward: Arc<dyn Action> = Arc::new(Step {
            signature: ActionSignature::new("forward", &[CLASS_WALKER]),
            forward: true,
            goal: self.goal(),
        });
        let builder = Domain::builder()
            .attribute(Attribute::discrete_range(ATT_POS, 0, last, 1))
            .object_class(CLASS_WALKER, &[ATT_POS])
            .shared_action(Arc::clone(&forward))
            .action(Step {
                signature: ActionSignature::new("back", &[CLASS_WALKER]),
                forward: false,
                goal: self.goal(),
            });
        (builder, forward)
    }

    /// Domain with the primitive `forward` and `back` moves
    pub fn domain(&self) -> Result<Arc<Domain>> {
        self.builder().0.build()
    }

    /// Domain that also offers `run`, an option taking `run_length`
    /// forward steps
    pub fn domain_with_option(&self, run_length: usize, gamma: f64) -> Result<Arc<Domain>> {
        let (builder, forward) = self.builder();
        let mut run = MacroOption::new(
            ActionSignature::new("run", &[CLASS_WALKER]),
            Arc::new(ChainReward { goal: self.goal() }),
            Arc::new(ChainEnd { goal: self.goal() }),
            gamma,
        );
        for _ in 0..run_length {
            run = run.then(Arc::clone(&forward), &[0])?;
        }
        builder.action(run).build()
    }

    /// State with the walker at `pos`
    pub fn state(domain: &Domain, pos: usize) -> Result<State> {
        let walker = domain
            .new_object("walker0", CLASS_WALKER)?
            .with_value(ATT_POS, pos)?;
        State::new().with_object(walker)
    }

    /// Reward paying 1 on entering the last position
    #[must_use]
    pub fn reward(&self) -> ChainReward {
        ChainReward { goal: self.goal() }
    }

    /// Terminal test for the last position
    #[must_use]
    pub fn terminal(&self) -> ChainEnd {
        ChainEnd { goal: self.goal() }
    }
}

fn walker_pos(state: &State) -> Option<usize> {
    state
        .objects_of_class(CLASS_WALKER)
        .next()
        .and_then(|o| o.discrete(ATT_POS).ok())
}

struct Step {
    signature: ActionSignature,
    forward: bool,
    goal: usize,
}

impl Action for Step {
    fn signature(&self) -> &ActionSignature {
        &self.signature
    }

    fn perform(&self, mut state: State, params: &[String]) -> Result<State> {
        let name = params
            .first()
            .ok_or_else(|| OomdpError::SchemaViolation("step needs a walker".into()))?;
        let walker = state.object_mut(name)?;
        let pos = walker.discrete(ATT_POS)?;
        let next = if self.forward {
            (pos + 1).min(self.goal)
        } else {
            pos.saturating_sub(1)
        };
        walker.set_value(ATT_POS, next)?;
        Ok(state)
    }
}

/// Pays 1 when a transition enters the last position
#[derive(Debug, Clone, Copy)]
pub struct ChainReward {
    goal: usize,
}

impl RewardFunction for ChainReward {
    fn reward(&self, state: &State, _action: &GroundedAction, next_state: &State) -> Reward {
        let entered = walker_pos(next_state) == Some(self.goal)
            && walker_pos(state) != Some(self.goal);
        Reward(if entered { 1.0 } else { 0.0 })
    }
}

/// Terminal at the last position
#[derive(Debug, Clone, Copy)]
pub struct ChainEnd {
    goal: usize,
}

impl TerminalFunction for ChainEnd {
    fn is_terminal(&self, state: &State) -> bool {
        walker_pos(state) == Some(self.goal)
    }
}
