//! States composed of object instances

use std::collections::{HashMap, VecDeque};
use std::fmt;

use crate::{ObjectInstance, OomdpError, Result, Value};

/// Identifier remapping from the objects of one state to another
pub type ObjectMatching = HashMap<String, String>;

/// An ordered collection of object instances with unique identifiers
///
/// `Clone` is a deep copy of every instance; actions always work on a clone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct State {
    objects: Vec<ObjectInstance>,
}

impl State {
    /// Create an empty state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object, rejecting duplicate identifiers
    pub fn add_object(&mut self, object: ObjectInstance) -> Result<()> {
        if self.objects.iter().any(|o| o.name() == object.name()) {
            return Err(OomdpError::DuplicateObject(object.name().to_string()));
        }
        self.objects.push(object);
        Ok(())
    }

    /// Builder-style variant of [`State::add_object`]
    pub fn with_object(mut self, object: ObjectInstance) -> Result<Self> {
        self.add_object(object)?;
        Ok(self)
    }

    /// Remove an object by identifier
    pub fn remove_object(&mut self, name: &str) -> Result<ObjectInstance> {
        let idx = self.position(name)?;
        Ok(self.objects.remove(idx))
    }

    /// Look up an object by identifier
    pub fn object(&self, name: &str) -> Result<&ObjectInstance> {
        let idx = self.position(name)?;
        Ok(&self.objects[idx])
    }

    /// Mutable lookup of an object by identifier
    pub fn object_mut(&mut self, name: &str) -> Result<&mut ObjectInstance> {
        let idx = self.position(name)?;
        Ok(&mut self.objects[idx])
    }

    /// All objects in insertion order
    #[must_use]
    pub fn objects(&self) -> &[ObjectInstance] {
        &self.objects
    }

    /// Objects belonging to a class, in insertion order
    pub fn objects_of_class<'a>(
        &'a self,
        class: &'a str,
    ) -> impl Iterator<Item = &'a ObjectInstance> + 'a {
        self.objects.iter().filter(move |o| o.class_name() == class)
    }

    /// Number of objects
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the state holds no objects
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Match every object of `self` to an object of `reference` with the same
    /// class and identical non-hidden attribute values.
    pub fn object_matching_to(&self, reference: &State) -> Result<ObjectMatching> {
        self.match_objects_by(reference, ObjectInstance::observable_values)
    }

    /// Match objects of `self` to objects of `reference` whose class and
    /// `key` agree. The result is a bijection or an error.
    pub fn match_objects_by<F>(&self, reference: &State, key: F) -> Result<ObjectMatching>
    where
        F: Fn(&ObjectInstance) -> Vec<Value>,
    {
        if self.len() != reference.len() {
            return Err(OomdpError::NoMatching(format!(
                "object counts differ ({} vs {})",
                self.len(),
                reference.len()
            )));
        }

        let mut pool: HashMap<(&str, Vec<Value>), VecDeque<&str>> = HashMap::new();
        for object in &reference.objects {
            pool.entry((object.class_name(), key(object)))
                .or_default()
                .push_back(object.name());
        }

        let mut matching = ObjectMatching::with_capacity(self.len());
        for object in &self.objects {
            let candidate = pool
                .get_mut(&(object.class_name(), key(object)))
                .and_then(VecDeque::pop_front)
                .ok_or_else(|| {
                    OomdpError::NoMatching(format!("no counterpart for object {}", object.name()))
                })?;
            matching.insert(object.name().to_string(), candidate.to_string());
        }

        Ok(matching)
    }

    fn position(&self, name: &str) -> Result<usize> {
        self.objects
            .iter()
            .position(|o| o.name() == name)
            .ok_or_else(|| OomdpError::UnknownObject(name.to_string()))
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for object in &self.objects {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{object}")?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Attribute, ObjectClass};
    use std::sync::Arc;

    fn block_class() -> Arc<ObjectClass> {
        Arc::new(ObjectClass::new(
            "block",
            vec![
                Arc::new(Attribute::discrete("color", ["red", "blue"])),
                Arc::new(Attribute::real_unbounded("wear").hidden()),
            ],
        ))
    }

    fn block(name: &str, color: &str, wear: f64) -> ObjectInstance {
        let mut b = ObjectInstance::new(name, block_class());
        b.set_named("color", color).unwrap();
        b.set_value("wear", wear).unwrap();
        b
    }

    #[test]
    fn duplicate_identifiers_are_rejected() {
        let mut state = State::new();
        state.add_object(block("b0", "red", 0.0)).unwrap();
        assert!(matches!(
            state.add_object(block("b0", "blue", 0.0)),
            Err(OomdpError::DuplicateObject(_))
        ));
    }

    #[test]
    fn clone_is_independent() {
        let state = State::new().with_object(block("b0", "red", 0.0)).unwrap();
        let mut copy = state.clone();
        copy.object_mut("b0").unwrap().set_named("color", "blue").unwrap();
        assert_eq!(state.object("b0").unwrap().discrete("color").unwrap(), 0);
        assert_eq!(copy.object("b0").unwrap().discrete("color").unwrap(), 1);
    }

    #[test]
    fn matching_ignores_identifiers_and_hidden_values() {
        let s1 = State::new()
            .with_object(block("a", "red", 1.0))
            .and_then(|s| s.with_object(block("b", "blue", 2.0)))
            .unwrap();
        let s2 = State::new()
            .with_object(block("x", "blue", 9.0))
            .and_then(|s| s.with_object(block("y", "red", 3.0)))
            .unwrap();

        let matching = s1.object_matching_to(&s2).unwrap();
        assert_eq!(matching["a"], "y");
        assert_eq!(matching["b"], "x");
    }

    #[test]
    fn matching_fails_on_differing_values() {
        let s1 = State::new().with_object(block("a", "red", 0.0)).unwrap();
        let s2 = State::new().with_object(block("a", "blue", 0.0)).unwrap();
        assert!(matches!(
            s1.object_matching_to(&s2),
            Err(OomdpError::NoMatching(_))
        ));
    }
}
