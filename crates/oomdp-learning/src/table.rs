//! Tabular action-value storage keyed by abstract state

use indexmap::IndexMap;
use std::sync::Arc;
use tracing::trace;

use oomdp_core::{
    Domain, GroundedAction, HashedState, OomdpError, Result, State, StateHashFactory, StateKey,
};

/// Value estimate of one grounded action
#[derive(Debug, Clone, PartialEq)]
pub struct QValue {
    /// The grounded action
    pub action: GroundedAction,
    /// Current estimate
    pub q: f64,
}

/// Read access to action values, creating entries on first visit
pub trait QComputable {
    /// Values of every applicable action in `state`, bound to `state`'s
    /// identifiers
    fn q_values(&mut self, state: &State) -> Result<Vec<QValue>>;

    /// Value of one action in `state`; absent actions are an error
    fn q_value(&mut self, state: &State, action: &GroundedAction) -> Result<QValue>;
}

/// Table entry: the representative state plus its action values
#[derive(Debug, Clone)]
struct StateNode {
    state: HashedState,
    q_entry: Vec<QValue>,
}

/// Location of one value inside the table
#[derive(Debug, Clone)]
pub struct QSlot {
    key: StateKey,
    index: usize,
}

/// Map from abstract state to action values
///
/// Entries are created once, at first visit, with every applicable grounded
/// action set to the initial value, and are never reinitialized. Actions in
/// an entry are bound to the identifiers of the state that created it.
#[derive(Debug)]
pub struct QTable {
    domain: Arc<Domain>,
    hashing: StateHashFactory,
    q_init: f64,
    index: IndexMap<StateKey, StateNode>,
}

impl QTable {
    /// Create an empty table
    #[must_use]
    pub fn new(domain: Arc<Domain>, hashing: StateHashFactory, q_init: f64) -> Self {
        Self {
            domain,
            hashing,
            q_init,
            index: IndexMap::new(),
        }
    }

    /// Hash a state with the table's attribute selection
    pub fn hash(&self, state: &State) -> Result<HashedState> {
        self.hashing.hash_state(state)
    }

    /// Number of abstract states seen
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether no state has been seen
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Forget every entry
    pub fn clear(&mut self) {
        self.index.clear();
    }

    /// Whether an entry exists for `state`
    #[must_use]
    pub fn contains(&self, state: &HashedState) -> bool {
        self.index.contains_key(state.key())
    }

    fn node<'a>(
        index: &'a mut IndexMap<StateKey, StateNode>,
        domain: &Domain,
        q_init: f64,
        state: &HashedState,
    ) -> &'a mut StateNode {
        index.entry(state.key().clone()).or_insert_with(|| {
            let q_entry: Vec<QValue> = domain
                .grounded_actions(state.state())
                .into_iter()
                .map(|action| QValue { action, q: q_init })
                .collect();
            trace!(actions = q_entry.len(), "new table entry");
            StateNode {
                state: state.clone(),
                q_entry,
            }
        })
    }

    /// Values of `state`, with actions rebound to `state`'s identifiers
    pub fn q_values_hashed(&mut self, state: &HashedState) -> Result<Vec<QValue>> {
        let node = Self::node(&mut self.index, &self.domain, self.q_init, state);
        if node.q_entry.iter().all(|qv| qv.action.params.is_empty()) {
            return Ok(node.q_entry.clone());
        }
        let matching = self
            .hashing
            .match_objects(node.state.state(), state.state())?;
        node.q_entry
            .iter()
            .map(|qv| {
                Ok(QValue {
                    action: qv.action.translate(&matching)?,
                    q: qv.q,
                })
            })
            .collect()
    }

    /// Find where the value of `action` in `state` lives, creating the
    /// entry if needed
    pub fn locate(&mut self, state: &HashedState, action: &GroundedAction) -> Result<QSlot> {
        let node = Self::node(&mut self.index, &self.domain, self.q_init, state);
        let action = if action.params.is_empty() {
            action.clone()
        } else {
            let matching = self
                .hashing
                .match_objects(state.state(), node.state.state())?;
            action.translate(&matching)?
        };
        let index = node
            .q_entry
            .iter()
            .position(|qv| qv.action.is_equivalent(&action))
            .ok_or_else(|| OomdpError::MissingActionValue {
                action: action.to_string(),
                state: state.state().to_string(),
            })?;
        Ok(QSlot {
            key: state.key().clone(),
            index,
        })
    }

    /// Value stored at a slot
    pub fn value_at(&self, slot: &QSlot) -> Result<f64> {
        self.index
            .get(&slot.key)
            .and_then(|node| node.q_entry.get(slot.index))
            .map(|qv| qv.q)
            .ok_or_else(|| OomdpError::MissingActionValue {
                action: format!("#{}", slot.index),
                state: "unknown".into(),
            })
    }

    /// Mutable value stored at a slot
    pub fn value_at_mut(&mut self, slot: &QSlot) -> Result<&mut f64> {
        self.index
            .get_mut(&slot.key)
            .and_then(|node| node.q_entry.get_mut(slot.index))
            .map(|qv| &mut qv.q)
            .ok_or_else(|| OomdpError::MissingActionValue {
                action: format!("#{}", slot.index),
                state: "unknown".into(),
            })
    }

    /// Largest action value of `state`; 0 when the state has no actions
    pub fn max_q(&mut self, state: &HashedState) -> f64 {
        Self::node(&mut self.index, &self.domain, self.q_init, state)
            .q_entry
            .iter()
            .map(|qv| qv.q)
            .reduce(f64::max)
            .unwrap_or(0.0)
    }
}

impl QComputable for QTable {
    fn q_values(&mut self, state: &State) -> Result<Vec<QValue>> {
        let hashed = self.hash(state)?;
        self.q_values_hashed(&hashed)
    }

    fn q_value(&mut self, state: &State, action: &GroundedAction) -> Result<QValue> {
        let hashed = self.hash(state)?;
        let slot = self.locate(&hashed, action)?;
        Ok(QValue {
            action: action.clone(),
            q: self.value_at(&slot)?,
        })
    }
}
