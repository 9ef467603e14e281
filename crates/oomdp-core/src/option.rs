//! Temporally extended actions ("options")

use std::sync::Arc;
use tracing::trace;

use crate::{
    Action, ActionKind, ActionOutcome, ActionSignature, GroundedAction, OomdpError, Result,
    Reward, RewardFunction, State, TerminalFunction,
};

/// One primitive step of a [`MacroOption`]
#[derive(Clone)]
struct OptionStep {
    action: Arc<dyn Action>,
    /// Option parameter index bound to each of the step's parameters
    slots: Vec<usize>,
}

/// An option that runs a fixed sequence of steps, stopping early when a
/// terminal state is reached
///
/// Each step binds a subset of the option's own parameters, so the option
/// grounds like any other action and follows identifier remapping.
pub struct MacroOption {
    signature: ActionSignature,
    steps: Vec<OptionStep>,
    reward: Arc<dyn RewardFunction>,
    terminal: Arc<dyn TerminalFunction>,
    gamma: f64,
}

impl MacroOption {
    /// Create an option with no steps yet
    pub fn new(
        signature: ActionSignature,
        reward: Arc<dyn RewardFunction>,
        terminal: Arc<dyn TerminalFunction>,
        gamma: f64,
    ) -> Self {
        Self {
            signature,
            steps: Vec::new(),
            reward,
            terminal,
            gamma,
        }
    }

    /// Append a step binding `action`'s parameters to option parameters
    /// `slots`
    pub fn then(mut self, action: Arc<dyn Action>, slots: &[usize]) -> Result<Self> {
        let step_sig = action.signature();
        if slots.len() != step_sig.arity() {
            return Err(OomdpError::SchemaViolation(format!(
                "step {} of option {} needs {} slots, got {}",
                step_sig.name,
                self.signature.name,
                step_sig.arity(),
                slots.len()
            )));
        }
        for (&slot, class) in slots.iter().zip(&step_sig.parameter_classes) {
            match self.signature.parameter_classes.get(slot) {
                Some(option_class) if option_class == class => {}
                _ => {
                    return Err(OomdpError::SchemaViolation(format!(
                        "option {} slot {slot} cannot feed a {class} parameter of {}",
                        self.signature.name, step_sig.name
                    )))
                }
            }
        }
        self.steps.push(OptionStep {
            action,
            slots: slots.to_vec(),
        });
        Ok(self)
    }

    /// Number of steps in the sequence
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the option has no steps
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    fn ground_step(&self, step: &OptionStep, params: &[String]) -> Result<GroundedAction> {
        let bound = step
            .slots
            .iter()
            .map(|&i| {
                params.get(i).cloned().ok_or_else(|| {
                    OomdpError::SchemaViolation(format!(
                        "option {} is missing parameter {i}",
                        self.signature.name
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(GroundedAction::new(Arc::clone(&step.action), bound))
    }
}

impl Action for MacroOption {
    fn signature(&self) -> &ActionSignature {
        &self.signature
    }

    fn applicable(&self, state: &State, params: &[String]) -> bool {
        match self.steps.first() {
            Some(step) => self
                .ground_step(step, params)
                .map(|g| g.applicable_in(state))
                .unwrap_or(false),
            None => false,
        }
    }

    fn perform(&self, state: State, params: &[String]) -> Result<State> {
        Ok(self.execute(&state, params)?.state)
    }

    fn execute(&self, state: &State, params: &[String]) -> Result<ActionOutcome> {
        let mut current = state.clone();
        let mut cumulative = Reward(0.0);
        let mut discount = 1.0;
        let mut steps = 0;

        if self.applicable(state, params) {
            for step in &self.steps {
                if self.terminal.is_terminal(&current) {
                    break;
                }
                let grounded = self.ground_step(step, params)?;
                let outcome = grounded.execute_in(&current)?;
                let (r, n) = match outcome.kind {
                    ActionKind::Primitive => (
                        self.reward.reward(&current, &grounded, &outcome.state),
                        1,
                    ),
                    ActionKind::Option {
                        cumulative_reward,
                        steps,
                    } => (Reward(cumulative_reward), steps),
                };
                cumulative = cumulative + r * discount;
                discount *= self.gamma.powi(i32::try_from(n).unwrap_or(i32::MAX));
                steps += n;
                current = outcome.state;
            }
        }

        let cumulative_reward = cumulative.value();
        trace!(
            option = %self.signature.name,
            steps,
            cumulative_reward,
            "option finished"
        );
        Ok(ActionOutcome {
            state: current,
            kind: ActionKind::Option {
                cumulative_reward,
                steps,
            },
        })
    }

    fn is_primitive(&self) -> bool {
        false
    }
}
