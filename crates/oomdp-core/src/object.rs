//! Object classes and object instances

use std::fmt;
use std::sync::Arc;

use crate::{Attribute, OomdpError, Result, Value};

/// A named set of attribute schemas
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectClass {
    /// Class name
    pub name: String,
    /// Attributes in declaration order
    pub attributes: Vec<Arc<Attribute>>,
}

impl ObjectClass {
    /// Create a class over the given attributes
    pub fn new(name: impl Into<String>, attributes: Vec<Arc<Attribute>>) -> Self {
        Self {
            name: name.into(),
            attributes,
        }
    }

    /// Position of an attribute within the class
    pub fn attribute_index(&self, attribute: &str) -> Result<usize> {
        self.attributes
            .iter()
            .position(|a| a.name == attribute)
            .ok_or_else(|| OomdpError::UnknownAttribute {
                class: self.name.clone(),
                attribute: attribute.to_string(),
            })
    }

    /// Positions of all attributes not flagged hidden
    #[must_use]
    pub fn observable_indices(&self) -> Vec<usize> {
        self.attributes
            .iter()
            .enumerate()
            .filter(|(_, a)| !a.hidden)
            .map(|(i, _)| i)
            .collect()
    }
}

/// A concrete object living in a state
///
/// The identifier is unique inside one state but carries no meaning across
/// states: two states can name structurally identical objects differently.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectInstance {
    name: String,
    class: Arc<ObjectClass>,
    values: Vec<Value>,
}

impl ObjectInstance {
    /// Create an object with every attribute at its default value
    pub fn new(name: impl Into<String>, class: Arc<ObjectClass>) -> Self {
        let values = class.attributes.iter().map(|a| a.default_value()).collect();
        Self {
            name: name.into(),
            class,
            values,
        }
    }

    /// Object identifier
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Object class
    #[must_use]
    pub fn class(&self) -> &Arc<ObjectClass> {
        &self.class
    }

    /// Name of the object class
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class.name
    }

    /// Get an attribute value
    pub fn value(&self, attribute: &str) -> Result<Value> {
        let idx = self.class.attribute_index(attribute)?;
        Ok(self.values[idx])
    }

    /// Get an attribute value as a discrete index
    pub fn discrete(&self, attribute: &str) -> Result<usize> {
        self.value(attribute)?.as_discrete().ok_or_else(|| {
            OomdpError::SchemaViolation(format!("{attribute} of {} is not discrete", self.name))
        })
    }

    /// Get an attribute value as a real number
    pub fn real(&self, attribute: &str) -> Result<f64> {
        Ok(self.value(attribute)?.as_f64())
    }

    /// Set an attribute value, checking it against the schema
    pub fn set_value(&mut self, attribute: &str, value: impl Into<Value>) -> Result<()> {
        let idx = self.class.attribute_index(attribute)?;
        let value = value.into();
        self.class.attributes[idx].check(&value)?;
        self.values[idx] = value;
        Ok(())
    }

    /// Set a discrete attribute by value name
    pub fn set_named(&mut self, attribute: &str, value_name: &str) -> Result<()> {
        let idx = self.class.attribute_index(attribute)?;
        let value = self.class.attributes[idx].discrete_index(value_name)?;
        self.values[idx] = Value::Discrete(value);
        Ok(())
    }

    /// Builder-style setter
    pub fn with_value(mut self, attribute: &str, value: impl Into<Value>) -> Result<Self> {
        self.set_value(attribute, value)?;
        Ok(self)
    }

    /// Values at the given attribute positions
    #[must_use]
    pub fn values_at(&self, indices: &[usize]) -> Vec<Value> {
        indices.iter().map(|&i| self.values[i]).collect()
    }

    /// Values of every non-hidden attribute
    #[must_use]
    pub fn observable_values(&self) -> Vec<Value> {
        self.values_at(&self.class.observable_indices())
    }
}

impl fmt::Display for ObjectInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.class.name)?;
        for (attr, value) in self.class.attributes.iter().zip(&self.values) {
            write!(f, " {}={}", attr.name, value)?;
        }
        Ok(())
    }
}
