//! State abstraction keys and identifier matching between equivalent states

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};

use crate::{ObjectClass, ObjectMatching, Result, State, Value};

/// Per-class attribute subsets that participate in state keys
///
/// Classes that are not listed contribute all of their non-hidden
/// attributes. Listing a class with no attributes aggregates its objects
/// down to their count. Hidden attributes never participate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeSelection {
    classes: IndexMap<String, Vec<String>>,
}

impl AttributeSelection {
    /// Selection that keys on every non-hidden attribute
    #[must_use]
    pub fn all_observable() -> Self {
        Self::default()
    }

    /// Restrict `class` to the named attributes
    #[must_use]
    pub fn with_class<S: AsRef<str>>(mut self, class: impl Into<String>, attributes: &[S]) -> Self {
        self.classes.insert(
            class.into(),
            attributes.iter().map(|a| a.as_ref().to_string()).collect(),
        );
        self
    }

    /// Attribute positions of `class` that participate in keys
    pub fn indices_for(&self, class: &ObjectClass) -> Result<Vec<usize>> {
        match self.classes.get(&class.name) {
            None => Ok(class.observable_indices()),
            Some(names) => {
                let mut indices = Vec::with_capacity(names.len());
                for name in names {
                    let idx = class.attribute_index(name)?;
                    if !class.attributes[idx].hidden {
                        indices.push(idx);
                    }
                }
                Ok(indices)
            }
        }
    }
}

/// Order-invariant abstraction key of a state
///
/// Per class (sorted by name) the sorted multiset of selected attribute
/// tuples. Permuting identifiers of identical objects leaves it unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateKey(Vec<(String, Vec<Vec<Value>>)>);

impl StateKey {
    /// Number of objects covered by the key
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.0.iter().map(|(_, objects)| objects.len()).sum()
    }
}

/// A state paired with its precomputed key
///
/// Equality and hashing use only the key, so this is the value-table key
/// type. It is immutable once built.
#[derive(Debug, Clone)]
pub struct HashedState {
    state: State,
    key: StateKey,
}

impl HashedState {
    /// The wrapped state
    #[must_use]
    pub fn state(&self) -> &State {
        &self.state
    }

    /// The abstraction key
    #[must_use]
    pub fn key(&self) -> &StateKey {
        &self.key
    }

    /// Unwrap into the state
    #[must_use]
    pub fn into_state(self) -> State {
        self.state
    }
}

impl PartialEq for HashedState {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for HashedState {}

impl Hash for HashedState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

/// Computes keys and matchings under an [`AttributeSelection`]
#[derive(Debug, Clone, Default)]
pub struct StateHashFactory {
    selection: AttributeSelection,
}

impl StateHashFactory {
    /// Factory keyed on the given selection
    #[must_use]
    pub fn new(selection: AttributeSelection) -> Self {
        Self { selection }
    }

    /// The selection in use
    #[must_use]
    pub fn selection(&self) -> &AttributeSelection {
        &self.selection
    }

    /// Compute the key of a state
    pub fn key_of(&self, state: &State) -> Result<StateKey> {
        let indices = self.class_indices(state)?;
        let mut classes: BTreeMap<&str, Vec<Vec<Value>>> = BTreeMap::new();
        for object in state.objects() {
            let idx = &indices[object.class_name()];
            classes
                .entry(object.class_name())
                .or_default()
                .push(object.values_at(idx));
        }
        Ok(StateKey(
            classes
                .into_iter()
                .map(|(class, mut objects)| {
                    objects.sort();
                    (class.to_string(), objects)
                })
                .collect(),
        ))
    }

    /// Snapshot a state together with its key
    pub fn hash_state(&self, state: &State) -> Result<HashedState> {
        Ok(HashedState {
            key: self.key_of(state)?,
            state: state.clone(),
        })
    }

    /// Map each object of `source` onto an object of `reference` with the
    /// same class and the same selected attribute values
    pub fn match_objects(&self, source: &State, reference: &State) -> Result<ObjectMatching> {
        let mut indices = self.class_indices(source)?;
        indices.extend(self.class_indices(reference)?);
        source.match_objects_by(reference, |object| {
            indices
                .get(object.class_name())
                .map(|idx| object.values_at(idx))
                .unwrap_or_default()
        })
    }

    fn class_indices<'a>(&self, state: &'a State) -> Result<HashMap<&'a str, Vec<usize>>> {
        let mut indices = HashMap::new();
        for object in state.objects() {
            if !indices.contains_key(object.class_name()) {
                indices.insert(object.class_name(), self.selection.indices_for(object.class())?);
            }
        }
        Ok(indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Attribute, ObjectInstance, OomdpError};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn block_class() -> Arc<ObjectClass> {
        Arc::new(ObjectClass::new(
            "block",
            vec![
                Arc::new(Attribute::discrete("color", ["red", "green", "blue"])),
                Arc::new(Attribute::discrete_range("height", 0, 5, 1)),
                Arc::new(Attribute::real_unbounded("mass").hidden()),
            ],
        ))
    }

    fn block(name: &str, color: usize, height: usize, mass: f64) -> ObjectInstance {
        ObjectInstance::new(name, block_class())
            .with_value("color", color)
            .and_then(|b| b.with_value("height", height))
            .and_then(|b| b.with_value("mass", mass))
            .unwrap()
    }

    fn state(blocks: Vec<ObjectInstance>) -> State {
        let mut s = State::new();
        for b in blocks {
            s.add_object(b).unwrap();
        }
        s
    }

    #[test]
    fn permuted_identifiers_share_a_key() {
        let factory = StateHashFactory::default();
        let s1 = state(vec![block("a", 0, 1, 1.0), block("b", 2, 3, 1.0)]);
        let s2 = state(vec![block("q", 2, 3, 5.0), block("r", 0, 1, 7.0)]);
        assert_eq!(factory.key_of(&s1).unwrap(), factory.key_of(&s2).unwrap());
        assert_eq!(factory.hash_state(&s1).unwrap(), factory.hash_state(&s2).unwrap());
    }

    #[test]
    fn value_change_changes_key() {
        let factory = StateHashFactory::default();
        let s1 = state(vec![block("a", 0, 1, 0.0)]);
        let s2 = state(vec![block("a", 0, 2, 0.0)]);
        assert_ne!(factory.key_of(&s1).unwrap(), factory.key_of(&s2).unwrap());
    }

    #[test]
    fn extra_object_changes_key() {
        let factory = StateHashFactory::default();
        let s1 = state(vec![block("a", 0, 1, 0.0)]);
        let s2 = state(vec![block("a", 0, 1, 0.0), block("b", 0, 1, 0.0)]);
        assert_ne!(factory.key_of(&s1).unwrap(), factory.key_of(&s2).unwrap());
    }

    #[test]
    fn selection_aggregates_ignored_attributes() {
        let factory =
            StateHashFactory::new(AttributeSelection::all_observable().with_class("block", &["color"]));
        let s1 = state(vec![block("a", 1, 0, 0.0)]);
        let s2 = state(vec![block("a", 1, 4, 0.0)]);
        assert_eq!(factory.key_of(&s1).unwrap(), factory.key_of(&s2).unwrap());

        let matching = factory.match_objects(&s2, &s1).unwrap();
        assert_eq!(matching["a"], "a");
    }

    #[test]
    fn unknown_selected_attribute_is_reported() {
        let factory =
            StateHashFactory::new(AttributeSelection::all_observable().with_class("block", &["size"]));
        let s = state(vec![block("a", 0, 0, 0.0)]);
        assert!(matches!(
            factory.key_of(&s),
            Err(OomdpError::UnknownAttribute { .. })
        ));
    }

    #[test]
    fn matching_is_a_class_consistent_bijection() {
        let factory = StateHashFactory::default();
        let s1 = state(vec![
            block("a", 0, 1, 0.0),
            block("b", 0, 1, 0.0),
            block("c", 2, 0, 0.0),
        ]);
        let s2 = state(vec![
            block("x", 2, 0, 0.0),
            block("y", 0, 1, 0.0),
            block("z", 0, 1, 0.0),
        ]);
        let matching = factory.match_objects(&s1, &s2).unwrap();
        assert_eq!(matching["c"], "x");
        let mut targets: Vec<&String> = matching.values().collect();
        targets.sort();
        assert_eq!(targets, vec!["x", "y", "z"]);
    }
}
