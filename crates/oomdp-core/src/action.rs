//! Parameterized actions, outcome distributions and grounded actions

use itertools::Itertools;
use rand::Rng;
use rand_distr::{Distribution, WeightedIndex};
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::{ObjectMatching, OomdpError, Result, State};

/// Tolerance used when checking that outcome probabilities sum to one
pub const PROBABILITY_TOLERANCE: f64 = 1e-9;

/// What an executed action reports about the time it consumed
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActionKind {
    /// Exactly one MDP time step
    Primitive,
    /// Temporally extended action run to completion
    Option {
        /// Discounted reward accumulated over the option's primitive steps
        cumulative_reward: f64,
        /// Number of primitive steps consumed
        steps: usize,
    },
}

/// Result of executing an action in a state
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    /// Resulting state
    pub state: State,
    /// Time and reward bookkeeping of the execution
    pub kind: ActionKind,
}

impl ActionOutcome {
    /// Outcome of a single primitive step
    #[must_use]
    pub fn primitive(state: State) -> Self {
        Self {
            state,
            kind: ActionKind::Primitive,
        }
    }
}

/// One weighted outcome of an action
#[derive(Debug, Clone)]
pub struct TransitionProbability {
    /// Outcome state
    pub state: State,
    /// Probability of the outcome
    pub probability: f64,
}

impl TransitionProbability {
    /// Create a weighted outcome
    #[must_use]
    pub fn new(state: State, probability: f64) -> Self {
        Self { state, probability }
    }
}

/// Name and parameter layout of an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSignature {
    /// Action name, unique within a domain
    pub name: String,
    /// Object class required by each parameter
    pub parameter_classes: Vec<String>,
    /// Order group label of each parameter; parameters sharing a label are
    /// interchangeable
    pub order_groups: Vec<String>,
}

impl ActionSignature {
    /// Signature where every parameter sits in its own order group
    pub fn new<S: AsRef<str>>(name: impl Into<String>, parameter_classes: &[S]) -> Self {
        let name = name.into();
        let parameter_classes: Vec<String> = parameter_classes
            .iter()
            .map(|c| c.as_ref().to_string())
            .collect();
        let order_groups = (0..parameter_classes.len())
            .map(|i| format!("{name}.P{i}"))
            .collect();
        Self {
            name,
            parameter_classes,
            order_groups,
        }
    }

    /// Signature from a comma-delimited class list such as `"block,block"`
    pub fn parse(name: impl Into<String>, parameter_classes: &str) -> Self {
        let classes: Vec<&str> = if parameter_classes.is_empty() {
            Vec::new()
        } else {
            parameter_classes.split(',').collect()
        };
        Self::new(name, &classes)
    }

    /// Signature with explicit order groups
    pub fn with_order_groups<S: AsRef<str>, G: AsRef<str>>(
        name: impl Into<String>,
        parameter_classes: &[S],
        order_groups: &[G],
    ) -> Result<Self> {
        let mut signature = Self::new(name, parameter_classes);
        if order_groups.len() != signature.parameter_classes.len() {
            return Err(OomdpError::SchemaViolation(format!(
                "action {} declares {} parameters but {} order groups",
                signature.name,
                signature.parameter_classes.len(),
                order_groups.len()
            )));
        }
        signature.order_groups = order_groups.iter().map(|g| g.as_ref().to_string()).collect();
        Ok(signature)
    }

    /// Number of parameters
    #[must_use]
    pub fn arity(&self) -> usize {
        self.parameter_classes.len()
    }
}

/// An action definition
///
/// Primitive actions implement [`Action::perform`] on an already cloned
/// state. Temporally extended actions override [`Action::execute`] and
/// report [`ActionKind::Option`].
pub trait Action: Send + Sync {
    /// Name and parameter layout
    fn signature(&self) -> &ActionSignature;

    /// Action name
    fn name(&self) -> &str {
        &self.signature().name
    }

    /// Whether the action can fire in `state` with these parameters
    fn applicable(&self, _state: &State, _params: &[String]) -> bool {
        true
    }

    /// Apply the action's effect to `state`, which the caller already cloned
    fn perform(&self, state: State, params: &[String]) -> Result<State>;

    /// Execute on a copy of `state`; an inapplicable action leaves the copy
    /// untouched
    fn execute(&self, state: &State, params: &[String]) -> Result<ActionOutcome> {
        let next = state.clone();
        if !self.applicable(state, params) {
            return Ok(ActionOutcome::primitive(next));
        }
        Ok(ActionOutcome::primitive(self.perform(next, params)?))
    }

    /// Outcome distribution; deterministic actions yield a single outcome
    /// with probability 1.0
    fn transitions(&self, state: &State, params: &[String]) -> Result<Vec<TransitionProbability>> {
        let outcome = self.execute(state, params)?;
        Ok(vec![TransitionProbability::new(outcome.state, 1.0)])
    }

    /// Whether one execution is exactly one time step
    fn is_primitive(&self) -> bool {
        true
    }
}

/// Check that an outcome distribution is well formed
pub fn validate_transitions(transitions: &[TransitionProbability]) -> Result<()> {
    if transitions.is_empty() {
        return Err(OomdpError::InvalidTransitions("no outcomes".into()));
    }
    if let Some(t) = transitions.iter().find(|t| t.probability < 0.0) {
        return Err(OomdpError::InvalidTransitions(format!(
            "negative probability {}",
            t.probability
        )));
    }
    let total: f64 = transitions.iter().map(|t| t.probability).sum();
    if (total - 1.0).abs() > PROBABILITY_TOLERANCE {
        return Err(OomdpError::InvalidTransitions(format!(
            "probabilities sum to {total}"
        )));
    }
    Ok(())
}

/// Draw one outcome from a distribution
pub fn sample_transition<R: Rng + ?Sized>(
    transitions: Vec<TransitionProbability>,
    rng: &mut R,
) -> Result<State> {
    validate_transitions(&transitions)?;
    let weights: Vec<f64> = transitions.iter().map(|t| t.probability).collect();
    let dist = WeightedIndex::new(&weights)
        .map_err(|e| OomdpError::InvalidTransitions(e.to_string()))?;
    let idx = dist.sample(rng);
    transitions
        .into_iter()
        .nth(idx)
        .map(|t| t.state)
        .ok_or_else(|| OomdpError::InvalidTransitions("sampled index out of range".into()))
}

/// An action bound to concrete object identifiers
#[derive(Clone)]
pub struct GroundedAction {
    /// The action definition
    pub action: Arc<dyn Action>,
    /// One object identifier per parameter slot
    pub params: Vec<String>,
}

impl GroundedAction {
    /// Bind without checking against a state
    pub fn new(action: Arc<dyn Action>, params: Vec<String>) -> Self {
        Self { action, params }
    }

    /// Bind and check arity and parameter classes against `state`
    pub fn bind(action: Arc<dyn Action>, params: Vec<String>, state: &State) -> Result<Self> {
        let signature = action.signature();
        if params.len() != signature.arity() {
            return Err(OomdpError::SchemaViolation(format!(
                "action {} takes {} parameters, got {}",
                signature.name,
                signature.arity(),
                params.len()
            )));
        }
        for (param, class) in params.iter().zip(&signature.parameter_classes) {
            let object = state.object(param)?;
            if object.class_name() != class {
                return Err(OomdpError::SchemaViolation(format!(
                    "action {} expects a {class} but {param} is a {}",
                    signature.name,
                    object.class_name()
                )));
            }
        }
        Ok(Self { action, params })
    }

    /// Action name
    #[must_use]
    pub fn name(&self) -> &str {
        self.action.name()
    }

    /// Whether the underlying action is primitive
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        self.action.is_primitive()
    }

    /// Whether the action can fire in `state`
    #[must_use]
    pub fn applicable_in(&self, state: &State) -> bool {
        self.action.applicable(state, &self.params)
    }

    /// Execute in `state`, leaving `state` untouched
    pub fn execute_in(&self, state: &State) -> Result<ActionOutcome> {
        self.action.execute(state, &self.params)
    }

    /// Outcome distribution in `state`
    pub fn transitions(&self, state: &State) -> Result<Vec<TransitionProbability>> {
        self.action.transitions(state, &self.params)
    }

    /// Draw one outcome from the action's distribution in `state`
    pub fn sample_transition<R: Rng + ?Sized>(&self, state: &State, rng: &mut R) -> Result<State> {
        sample_transition(self.transitions(state)?, rng)
    }

    /// Rebind parameters through an identifier matching
    pub fn translate(&self, matching: &ObjectMatching) -> Result<Self> {
        let params = self
            .params
            .iter()
            .map(|p| {
                matching
                    .get(p)
                    .cloned()
                    .ok_or_else(|| OomdpError::NoMatching(format!("object {p} is unmatched")))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(Arc::clone(&self.action), params))
    }

    /// Parameters with identifiers sorted inside each order group, so that
    /// symmetric bindings share one form
    #[must_use]
    pub fn canonical_params(&self) -> Vec<String> {
        let groups = &self.action.signature().order_groups;
        let mut params = self.params.clone();
        let mut seen: HashSet<&str> = HashSet::new();
        for group in groups {
            if !seen.insert(group.as_str()) {
                continue;
            }
            let slots: Vec<usize> = groups
                .iter()
                .enumerate()
                .filter(|(_, g)| *g == group)
                .map(|(i, _)| i)
                .collect();
            let mut names: Vec<String> = slots
                .iter()
                .filter_map(|&i| self.params.get(i).cloned())
                .collect();
            names.sort();
            for (slot, name) in slots.into_iter().zip(names) {
                if let Some(p) = params.get_mut(slot) {
                    *p = name;
                }
            }
        }
        params
    }

    /// Same action with the same parameters up to order-group permutation
    #[must_use]
    pub fn is_equivalent(&self, other: &Self) -> bool {
        self.name() == other.name() && self.canonical_params() == other.canonical_params()
    }
}

impl PartialEq for GroundedAction {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name() && self.params == other.params
    }
}

impl Eq for GroundedAction {}

impl Hash for GroundedAction {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name().hash(state);
        self.params.hash(state);
    }
}

impl fmt::Debug for GroundedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroundedAction")
            .field("action", &self.name())
            .field("params", &self.params)
            .finish()
    }
}

impl fmt::Display for GroundedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.params.join(", "))
    }
}

/// Every applicable grounding of `action` in `state`, one per equivalence
/// class of bindings. A binding never uses the same object twice.
pub fn ground_action(action: &Arc<dyn Action>, state: &State) -> Vec<GroundedAction> {
    let signature = action.signature();
    if signature.arity() == 0 {
        let grounded = GroundedAction::new(Arc::clone(action), Vec::new());
        return if grounded.applicable_in(state) {
            vec![grounded]
        } else {
            Vec::new()
        };
    }

    let candidates: Vec<Vec<String>> = signature
        .parameter_classes
        .iter()
        .map(|class| {
            state
                .objects_of_class(class)
                .map(|o| o.name().to_string())
                .collect()
        })
        .collect();

    let mut seen: HashSet<Vec<String>> = HashSet::new();
    candidates
        .into_iter()
        .multi_cartesian_product()
        .filter(|binding| binding.iter().all_unique())
        .map(|binding| GroundedAction::new(Arc::clone(action), binding))
        .filter(|grounded| seen.insert(grounded.canonical_params()))
        .filter(|grounded| grounded.applicable_in(state))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Attribute, ObjectClass, ObjectInstance};

    struct Noop(ActionSignature);

    impl Action for Noop {
        fn signature(&self) -> &ActionSignature {
            &self.0
        }

        fn perform(&self, state: State, _params: &[String]) -> Result<State> {
            Ok(state)
        }
    }

    fn blocks(n: usize) -> State {
        let class = Arc::new(ObjectClass::new(
            "block",
            vec![Arc::new(Attribute::discrete_range("h", 0, 3, 1))],
        ));
        let mut state = State::new();
        for i in 0..n {
            state
                .add_object(ObjectInstance::new(format!("b{i}"), Arc::clone(&class)))
                .unwrap();
        }
        state
    }

    #[test]
    fn parse_assigns_distinct_order_groups() {
        let sig = ActionSignature::parse("stack", "block,block");
        assert_eq!(sig.parameter_classes, vec!["block", "block"]);
        assert_eq!(sig.order_groups, vec!["stack.P0", "stack.P1"]);
        assert_eq!(ActionSignature::parse("wait", "").arity(), 0);
    }

    #[test]
    fn ordered_parameters_enumerate_every_permutation() {
        let action: Arc<dyn Action> =
            Arc::new(Noop(ActionSignature::new("stack", &["block", "block"])));
        assert_eq!(ground_action(&action, &blocks(3)).len(), 6);
    }

    #[test]
    fn shared_order_group_deduplicates_symmetric_bindings() {
        let sig =
            ActionSignature::with_order_groups("pair", &["block", "block"], &["g", "g"]).unwrap();
        let action: Arc<dyn Action> = Arc::new(Noop(sig));
        let grounded = ground_action(&action, &blocks(3));
        assert_eq!(grounded.len(), 3);
        let swapped = GroundedAction::new(Arc::clone(&action), vec!["b1".into(), "b0".into()]);
        assert!(grounded.iter().any(|g| g.is_equivalent(&swapped)));
    }

    #[test]
    fn deterministic_transitions_have_one_certain_outcome() {
        let action: Arc<dyn Action> = Arc::new(Noop(ActionSignature::new("wait", &[] as &[&str])));
        let transitions = action.transitions(&blocks(1), &[]).unwrap();
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].probability, 1.0);
    }

    #[test]
    fn malformed_distribution_is_rejected() {
        let bad = vec![
            TransitionProbability::new(State::new(), 0.5),
            TransitionProbability::new(State::new(), 0.4),
        ];
        assert!(matches!(
            validate_transitions(&bad),
            Err(OomdpError::InvalidTransitions(_))
        ));
    }

    /// Raises a block; `b1` is locked
    struct Raise(ActionSignature);

    impl Action for Raise {
        fn signature(&self) -> &ActionSignature {
            &self.0
        }

        fn applicable(&self, _state: &State, params: &[String]) -> bool {
            params.first().map_or(false, |p| p != "b1")
        }

        fn perform(&self, mut state: State, params: &[String]) -> Result<State> {
            state.object_mut(&params[0])?.set_value("h", 2usize)?;
            Ok(state)
        }
    }

    #[test]
    fn inapplicable_action_leaves_state_unchanged() {
        let action: Arc<dyn Action> = Arc::new(Raise(ActionSignature::new("raise", &["block"])));
        let state = blocks(3);

        let locked = GroundedAction::new(Arc::clone(&action), vec!["b1".into()]);
        assert!(!locked.applicable_in(&state));
        let outcome = locked.execute_in(&state).unwrap();
        assert_eq!(outcome.state, state);
        assert_eq!(outcome.kind, ActionKind::Primitive);

        let free = GroundedAction::new(Arc::clone(&action), vec!["b0".into()]);
        let raised = free.execute_in(&state).unwrap().state;
        assert_ne!(raised, state);
        assert_eq!(raised.object("b0").unwrap().discrete("h").unwrap(), 2);
    }

    #[test]
    fn enumeration_skips_inapplicable_bindings() {
        let action: Arc<dyn Action> = Arc::new(Raise(ActionSignature::new("raise", &["block"])));
        let grounded = ground_action(&action, &blocks(3));
        let params: Vec<&str> = grounded.iter().map(|g| g.params[0].as_str()).collect();
        assert_eq!(params, vec!["b0", "b2"]);
    }

    #[test]
    fn bind_rejects_wrong_class() {
        let action: Arc<dyn Action> = Arc::new(Noop(ActionSignature::new("move", &["agent"])));
        let err = GroundedAction::bind(action, vec!["b0".into()], &blocks(1)).unwrap_err();
        assert!(matches!(err, OomdpError::SchemaViolation(_)));
    }
}
