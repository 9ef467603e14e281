//! Attribute schemas and attribute values

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{OomdpError, Result};

/// The kind of values an attribute holds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeKind {
    /// Enumerated discrete values, stored by index into the value names
    Discrete {
        /// Value names ordered by their index
        values: Vec<String>,
    },
    /// Real value bounded to `[low, high]`
    Real {
        /// Lower limit
        low: f64,
        /// Upper limit
        high: f64,
    },
    /// Real value without bounds
    RealUnbounded,
}

/// An attribute declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    /// Attribute name, unique within its domain
    pub name: String,
    /// Kind of values held
    pub kind: AttributeKind,
    /// Hidden attributes live in the state but are invisible to the learner
    pub hidden: bool,
}

impl Attribute {
    /// Create a discrete attribute from a list of value names
    pub fn discrete<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            kind: AttributeKind::Discrete {
                values: values.into_iter().map(Into::into).collect(),
            },
            hidden: false,
        }
    }

    /// Create a discrete attribute whose values are the integers `low..=high` by `step`
    pub fn discrete_range(name: impl Into<String>, low: i64, high: i64, step: usize) -> Self {
        let step = step.max(1);
        let values = (low..=high).step_by(step).map(|v| v.to_string());
        Self::discrete(name, values)
    }

    /// Create a bounded real attribute
    pub fn real(name: impl Into<String>, low: f64, high: f64) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::Real { low, high },
            hidden: false,
        }
    }

    /// Create an unbounded real attribute
    pub fn real_unbounded(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::RealUnbounded,
            hidden: false,
        }
    }

    /// Mark the attribute hidden
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Limits of the attribute; discrete attributes span `[0, n-1]`
    #[must_use]
    pub fn limits(&self) -> Option<(f64, f64)> {
        match &self.kind {
            AttributeKind::Discrete { values } => {
                Some((0.0, values.len().saturating_sub(1) as f64))
            }
            AttributeKind::Real { low, high } => Some((*low, *high)),
            AttributeKind::RealUnbounded => None,
        }
    }

    /// Index of a named discrete value
    pub fn discrete_index(&self, value: &str) -> Result<usize> {
        let position = match &self.kind {
            AttributeKind::Discrete { values } => values.iter().position(|v| v == value),
            _ => None,
        };
        position.ok_or_else(|| {
            OomdpError::SchemaViolation(format!(
                "{value} is not a value of attribute {}",
                self.name
            ))
        })
    }

    /// Check that a value fits this attribute's kind and limits
    pub fn check(&self, value: &Value) -> Result<()> {
        match (&self.kind, value) {
            (AttributeKind::Discrete { values }, Value::Discrete(i)) if *i < values.len() => Ok(()),
            (AttributeKind::Real { low, high }, Value::Real(v))
                if v.0 >= *low && v.0 <= *high =>
            {
                Ok(())
            }
            (AttributeKind::RealUnbounded, Value::Real(_)) => Ok(()),
            _ => Err(OomdpError::SchemaViolation(format!(
                "value {value} does not fit attribute {}",
                self.name
            ))),
        }
    }

    /// Default value used when an object is created
    #[must_use]
    pub fn default_value(&self) -> Value {
        match &self.kind {
            AttributeKind::Discrete { .. } => Value::Discrete(0),
            AttributeKind::Real { low, .. } => Value::Real(OrderedFloat(*low)),
            AttributeKind::RealUnbounded => Value::Real(OrderedFloat(0.0)),
        }
    }
}

/// A concrete attribute value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Value {
    /// Index of a discrete value
    Discrete(usize),
    /// Real value
    Real(OrderedFloat<f64>),
}

impl Value {
    /// Create a real value
    #[must_use]
    pub fn real(v: f64) -> Self {
        Self::Real(OrderedFloat(v))
    }

    /// Numeric view of the value
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Discrete(i) => *i as f64,
            Self::Real(v) => v.0,
        }
    }

    /// Discrete index, if discrete
    #[must_use]
    pub fn as_discrete(&self) -> Option<usize> {
        match self {
            Self::Discrete(i) => Some(*i),
            Self::Real(_) => None,
        }
    }
}

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        Self::Discrete(i)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::real(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discrete(i) => write!(f, "#{i}"),
            Self::Real(v) => write!(f, "{}", v.0),
        }
    }
}
