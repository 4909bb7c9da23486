use metaedit_model::{PropertyValueBag, Record};
use serde::{Deserialize, Serialize};

use crate::condition::{Condition, Conjunction};

/// A field placed in a legend. Without a visible condition the field is always
/// shown; without an editable condition it is always editable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    visible_condition: Option<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    editable_condition: Option<Condition>,
}

impl Property {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visible_condition: None,
            editable_condition: None,
        }
    }

    #[must_use]
    pub fn with_visible_condition(mut self, condition: Condition) -> Self {
        self.visible_condition = Some(condition);
        self
    }

    #[must_use]
    pub fn with_editable_condition(mut self, condition: Condition) -> Self {
        self.editable_condition = Some(condition);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn visible_condition(&self) -> Option<&Condition> {
        self.visible_condition.as_ref()
    }

    pub fn visible_condition_mut(&mut self) -> Option<&mut Condition> {
        self.visible_condition.as_mut()
    }

    pub fn set_visible_condition(&mut self, condition: Option<Condition>) {
        self.visible_condition = condition;
    }

    pub fn editable_condition(&self) -> Option<&Condition> {
        self.editable_condition.as_ref()
    }

    pub fn set_editable_condition(&mut self, condition: Option<Condition>) {
        self.editable_condition = condition;
    }

    pub fn is_visible(&self, record: Option<&dyn Record>, input: Option<&PropertyValueBag>) -> bool {
        self.visible_condition
            .as_ref()
            .map_or(true, |c| c.is_visible(record, input))
    }

    pub fn is_editable(&self, record: Option<&dyn Record>, input: Option<&PropertyValueBag>) -> bool {
        self.editable_condition
            .as_ref()
            .map_or(true, |c| c.is_visible(record, input))
    }

    /// Fold another placement of the same field into this one: the field is
    /// visible whenever either placement would be.
    pub(crate) fn merge_visibility(&mut self, other: &Property) {
        let Some(incoming) = other.visible_condition.as_ref() else {
            self.visible_condition = None;
            return;
        };
        let Some(current) = self.visible_condition.as_mut() else {
            return;
        };
        if current == incoming {
            return;
        }
        match current {
            Condition::Chain(chain) if chain.conjunction() == Conjunction::Or => {
                if !chain.contains(incoming) {
                    chain.add_condition(incoming.clone());
                }
            }
            _ => {
                let previous = current.clone();
                *current = Condition::or(vec![previous, incoming.clone()]);
            }
        }
    }
}
