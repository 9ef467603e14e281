//! Domain schemas: attributes, object classes and actions

use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::{
    ground_action, Action, Attribute, GroundedAction, ObjectClass, ObjectInstance, OomdpError,
    Result, State,
};

/// Immutable snapshot of a domain's schema
pub struct Domain {
    attributes: IndexMap<String, Arc<Attribute>>,
    classes: IndexMap<String, Arc<ObjectClass>>,
    actions: IndexMap<String, Arc<dyn Action>>,
}

impl Domain {
    /// Start building a domain
    #[must_use]
    pub fn builder() -> DomainBuilder {
        DomainBuilder::default()
    }

    /// Look up an attribute by name
    pub fn attribute(&self, name: &str) -> Result<&Arc<Attribute>> {
        self.attributes.get(name).ok_or_else(|| OomdpError::UnknownAttribute {
            class: "*".into(),
            attribute: name.to_string(),
        })
    }

    /// Look up an object class by name
    pub fn object_class(&self, name: &str) -> Result<&Arc<ObjectClass>> {
        self.classes
            .get(name)
            .ok_or_else(|| OomdpError::UnknownClass(name.to_string()))
    }

    /// Look up an action by name
    pub fn action(&self, name: &str) -> Result<&Arc<dyn Action>> {
        self.actions
            .get(name)
            .ok_or_else(|| OomdpError::UnknownAction(name.to_string()))
    }

    /// All attributes in declaration order
    pub fn attributes(&self) -> impl Iterator<Item = &Arc<Attribute>> {
        self.attributes.values()
    }

    /// All object classes in declaration order
    pub fn object_classes(&self) -> impl Iterator<Item = &Arc<ObjectClass>> {
        self.classes.values()
    }

    /// All actions in registration order
    pub fn actions(&self) -> impl Iterator<Item = &Arc<dyn Action>> {
        self.actions.values()
    }

    /// Create an object of a declared class at default values
    pub fn new_object(&self, name: impl Into<String>, class: &str) -> Result<ObjectInstance> {
        Ok(ObjectInstance::new(name, Arc::clone(self.object_class(class)?)))
    }

    /// Ground an action by name, checking parameters against `state`
    pub fn ground(&self, action: &str, params: &[&str], state: &State) -> Result<GroundedAction> {
        GroundedAction::bind(
            Arc::clone(self.action(action)?),
            params.iter().map(|p| (*p).to_string()).collect(),
            state,
        )
    }

    /// Every applicable grounded action in `state`, actions in registration
    /// order, symmetric bindings collapsed
    #[must_use]
    pub fn grounded_actions(&self, state: &State) -> Vec<GroundedAction> {
        self.actions
            .values()
            .flat_map(|action| ground_action(action, state))
            .collect()
    }
}

impl fmt::Debug for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Domain")
            .field("attributes", &self.attributes.keys().collect::<Vec<_>>())
            .field("classes", &self.classes.keys().collect::<Vec<_>>())
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Accumulates schema elements and validates them into a [`Domain`]
#[derive(Default)]
pub struct DomainBuilder {
    attributes: Vec<Attribute>,
    classes: Vec<(String, Vec<String>)>,
    actions: Vec<Arc<dyn Action>>,
}

impl DomainBuilder {
    /// Declare an attribute
    #[must_use]
    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Declare an object class over previously or later declared attributes
    #[must_use]
    pub fn object_class<S: AsRef<str>>(mut self, name: impl Into<String>, attributes: &[S]) -> Self {
        self.classes.push((
            name.into(),
            attributes.iter().map(|a| a.as_ref().to_string()).collect(),
        ));
        self
    }

    /// Register an action
    #[must_use]
    pub fn action(self, action: impl Action + 'static) -> Self {
        self.shared_action(Arc::new(action))
    }

    /// Register an action that is also referenced elsewhere, e.g. by an option
    #[must_use]
    pub fn shared_action(mut self, action: Arc<dyn Action>) -> Self {
        self.actions.push(action);
        self
    }

    /// Validate and freeze the schema
    pub fn build(self) -> Result<Arc<Domain>> {
        let mut attributes: IndexMap<String, Arc<Attribute>> = IndexMap::new();
        for attribute in self.attributes {
            if attributes.contains_key(&attribute.name) {
                return Err(OomdpError::SchemaViolation(format!(
                    "attribute {} declared twice",
                    attribute.name
                )));
            }
            attributes.insert(attribute.name.clone(), Arc::new(attribute));
        }

        let mut classes: IndexMap<String, Arc<ObjectClass>> = IndexMap::new();
        for (name, attribute_names) in self.classes {
            if classes.contains_key(&name) {
                return Err(OomdpError::SchemaViolation(format!(
                    "object class {name} declared twice"
                )));
            }
            let class_attributes = attribute_names
                .iter()
                .map(|a| {
                    attributes.get(a).cloned().ok_or_else(|| OomdpError::UnknownAttribute {
                        class: name.clone(),
                        attribute: a.clone(),
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            classes.insert(name.clone(), Arc::new(ObjectClass::new(name, class_attributes)));
        }

        let mut actions: IndexMap<String, Arc<dyn Action>> = IndexMap::new();
        for action in self.actions {
            let signature = action.signature();
            if actions.contains_key(&signature.name) {
                return Err(OomdpError::SchemaViolation(format!(
                    "action {} registered twice",
                    signature.name
                )));
            }
            if signature.order_groups.len() != signature.arity() {
                return Err(OomdpError::SchemaViolation(format!(
                    "action {} has mismatched order groups",
                    signature.name
                )));
            }
            if let Some(missing) = signature
                .parameter_classes
                .iter()
                .find(|c| !classes.contains_key(*c))
            {
                return Err(OomdpError::SchemaViolation(format!(
                    "action {} takes undeclared class {missing}",
                    signature.name
                )));
            }
            actions.insert(signature.name.clone(), action);
        }

        debug!(
            attributes = attributes.len(),
            classes = classes.len(),
            actions = actions.len(),
            "domain built"
        );
        Ok(Arc::new(Domain {
            attributes,
            classes,
            actions,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ActionSignature;

    struct Touch(ActionSignature);

    impl Action for Touch {
        fn signature(&self) -> &ActionSignature {
            &self.0
        }

        fn perform(&self, state: State, _params: &[String]) -> Result<State> {
            Ok(state)
        }
    }

    #[test]
    fn builds_and_grounds() {
        let domain = Domain::builder()
            .attribute(Attribute::discrete_range("x", 0, 3, 1))
            .object_class("ball", &["x"])
            .action(Touch(ActionSignature::new("touch", &["ball"])))
            .build()
            .unwrap();

        let mut state = State::new();
        state.add_object(domain.new_object("b0", "ball").unwrap()).unwrap();
        state.add_object(domain.new_object("b1", "ball").unwrap()).unwrap();

        let grounded = domain.grounded_actions(&state);
        assert_eq!(grounded.len(), 2);
        assert_eq!(grounded[0].to_string(), "touch(b0)");
        assert!(domain.ground("touch", &["b1"], &state).is_ok());
    }

    #[test]
    fn action_over_undeclared_class_is_rejected() {
        let result = Domain::builder()
            .action(Touch(ActionSignature::new("touch", &["ball"])))
            .build();
        assert!(matches!(result, Err(OomdpError::SchemaViolation(_))));
    }

    #[test]
    fn duplicate_attribute_is_rejected() {
        let result = Domain::builder()
            .attribute(Attribute::real_unbounded("x"))
            .attribute(Attribute::real_unbounded("x"))
            .build();
        assert!(matches!(result, Err(OomdpError::SchemaViolation(_))));
    }

    #[test]
    fn class_over_unknown_attribute_is_rejected() {
        let result = Domain::builder().object_class("ball", &["x"]).build();
        assert!(matches!(result, Err(OomdpError::UnknownAttribute { .. })));
    }
}
