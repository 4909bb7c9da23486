//! Visibility conditions.
//!
//! One closed set of condition kinds serves two evaluation modes:
//!
//! - **weighted** ([`Condition::match_count`]): used to pick a palette. Each
//!   matching leaf contributes its weight; the palette with the highest total
//!   wins.
//! - **boolean** ([`Condition::is_visible`]): used for sub-palette fields and
//!   other per-property visibility.
//!
//! Property lookups prefer the pending input bag over the record's committed
//! value (see [`effective_value`]).

use metaedit_model::value::{is_truthy, loose_eq, strict_eq};
use metaedit_model::{effective_value, PropertyValueBag, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{Display, Formatter};

/// Outcome of a weighted evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchResult {
    NoMatch,
    Match(u32),
}

impl MatchResult {
    pub fn is_match(self) -> bool {
        matches!(self, Self::Match(_))
    }

    pub fn score(self) -> Option<u32> {
        match self {
            Self::Match(score) => Some(score),
            Self::NoMatch => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Conjunction {
    #[default]
    And,
    Or,
}

fn default_weight() -> u32 {
    1
}

fn is_default_weight(weight: &u32) -> bool {
    *weight == 1
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    /// The unconditional palette condition (`default` selector); matches with
    /// score 0 so any specific palette outranks it.
    Default,
    Boolean {
        value: bool,
        #[serde(default = "default_weight", skip_serializing_if = "is_default_weight")]
        weight: u32,
    },
    PropertyTrue {
        property: String,
        #[serde(default, skip_serializing_if = "is_false")]
        strict: bool,
        #[serde(default = "default_weight", skip_serializing_if = "is_default_weight")]
        weight: u32,
    },
    PropertyFalse {
        property: String,
        #[serde(default, skip_serializing_if = "is_false")]
        strict: bool,
        #[serde(default = "default_weight", skip_serializing_if = "is_default_weight")]
        weight: u32,
    },
    PropertyValue {
        property: String,
        value: Value,
        #[serde(default, skip_serializing_if = "is_false")]
        strict: bool,
        #[serde(default = "default_weight", skip_serializing_if = "is_default_weight")]
        weight: u32,
    },
    /// Negation; contributes a score of 1 when the inner condition fails.
    Not { condition: Box<Condition> },
    Chain(ConditionChain),
}

impl Condition {
    pub fn boolean(value: bool) -> Self {
        Self::Boolean {
            value,
            weight: default_weight(),
        }
    }

    pub fn property_true(property: impl Into<String>) -> Self {
        Self::PropertyTrue {
            property: property.into(),
            strict: false,
            weight: default_weight(),
        }
    }

    pub fn property_false(property: impl Into<String>) -> Self {
        Self::PropertyFalse {
            property: property.into(),
            strict: false,
            weight: default_weight(),
        }
    }

    pub fn property_value(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::PropertyValue {
            property: property.into(),
            value: value.into(),
            strict: false,
            weight: default_weight(),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(condition: Condition) -> Self {
        Self::Not {
            condition: Box::new(condition),
        }
    }

    pub fn and(conditions: Vec<Condition>) -> Self {
        Self::Chain(ConditionChain::with_conditions(Conjunction::And, conditions))
    }

    pub fn or(conditions: Vec<Condition>) -> Self {
        Self::Chain(ConditionChain::with_conditions(Conjunction::Or, conditions))
    }

    /// Switch a property condition to typed comparison.
    #[must_use]
    pub fn strict(mut self) -> Self {
        match &mut self {
            Self::PropertyTrue { strict, .. }
            | Self::PropertyFalse { strict, .. }
            | Self::PropertyValue { strict, .. } => *strict = true,
            _ => {}
        }
        self
    }

    #[must_use]
    pub fn with_weight(mut self, weight: u32) -> Self {
        self.set_weight(weight);
        self
    }

    /// Weight of a leaf; `None` for kinds without one.
    pub fn weight(&self) -> Option<u32> {
        match self {
            Self::Boolean { weight, .. }
            | Self::PropertyTrue { weight, .. }
            | Self::PropertyFalse { weight, .. }
            | Self::PropertyValue { weight, .. } => Some(*weight),
            Self::Default | Self::Not { .. } | Self::Chain(_) => None,
        }
    }

    /// Returns false when this kind carries no weight.
    pub fn set_weight(&mut self, new_weight: u32) -> bool {
        match self {
            Self::Boolean { weight, .. }
            | Self::PropertyTrue { weight, .. }
            | Self::PropertyFalse { weight, .. }
            | Self::PropertyValue { weight, .. } => {
                *weight = new_weight;
                true
            }
            Self::Default | Self::Not { .. } | Self::Chain(_) => false,
        }
    }

    pub fn as_chain(&self) -> Option<&ConditionChain> {
        match self {
            Self::Chain(chain) => Some(chain),
            _ => None,
        }
    }

    pub fn as_chain_mut(&mut self) -> Option<&mut ConditionChain> {
        match self {
            Self::Chain(chain) => Some(chain),
            _ => None,
        }
    }

    /// Weighted evaluation.
    pub fn match_count(
        &self,
        record: Option<&dyn Record>,
        input: Option<&PropertyValueBag>,
    ) -> MatchResult {
        let leaf = |holds: bool, weight: u32| {
            if holds {
                MatchResult::Match(weight)
            } else {
                MatchResult::NoMatch
            }
        };

        match self {
            Self::Default => MatchResult::Match(0),
            Self::Boolean { value, weight } => leaf(*value, *weight),
            Self::PropertyTrue { weight, .. }
            | Self::PropertyFalse { weight, .. }
            | Self::PropertyValue { weight, .. } => leaf(self.holds(record, input), *weight),
            Self::Not { condition } => leaf(!condition.match_count(record, input).is_match(), 1),
            Self::Chain(chain) => chain.match_count(record, input),
        }
    }

    /// Boolean evaluation.
    pub fn is_visible(&self, record: Option<&dyn Record>, input: Option<&PropertyValueBag>) -> bool {
        match self {
            Self::Default => true,
            Self::Boolean { value, .. } => *value,
            Self::PropertyTrue { .. } | Self::PropertyFalse { .. } | Self::PropertyValue { .. } => {
                self.holds(record, input)
            }
            Self::Not { condition } => !condition.is_visible(record, input),
            Self::Chain(chain) => chain.is_visible(record, input),
        }
    }

    fn holds(&self, record: Option<&dyn Record>, input: Option<&PropertyValueBag>) -> bool {
        match self {
            Self::PropertyTrue {
                property, strict, ..
            } => {
                let current = effective_value(property, record, input);
                if *strict {
                    current == Some(&Value::Bool(true))
                } else {
                    is_truthy(current)
                }
            }
            Self::PropertyFalse {
                property, strict, ..
            } => {
                let current = effective_value(property, record, input);
                if *strict {
                    current == Some(&Value::Bool(false))
                } else {
                    !is_truthy(current)
                }
            }
            Self::PropertyValue {
                property,
                value,
                strict,
                ..
            } => {
                let current = effective_value(property, record, input);
                if *strict {
                    strict_eq(current, Some(value))
                } else {
                    loose_eq(current, Some(value))
                }
            }
            _ => false,
        }
    }
}

impl From<ConditionChain> for Condition {
    fn from(chain: ConditionChain) -> Self {
        Self::Chain(chain)
    }
}

impl Display for Condition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Default => f.write_str("default"),
            Self::Boolean { value, .. } => write!(f, "{value}"),
            Self::PropertyTrue { property, .. } => f.write_str(property),
            Self::PropertyFalse { property, .. } => write!(f, "!{property}"),
            Self::PropertyValue {
                property,
                value,
                strict,
                ..
            } => {
                let op = if *strict { "===" } else { "==" };
                write!(f, "{property} {op} {value}")
            }
            Self::Not { condition } => write!(f, "!({condition})"),
            Self::Chain(chain) => write!(f, "{chain}"),
        }
    }
}

/// Ordered AND/OR composition of conditions. The conjunction is fixed at
/// construction; members are evaluated in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ConditionChain {
    #[serde(default)]
    conjunction: Conjunction,
    #[serde(default)]
    conditions: Vec<Condition>,
}

impl ConditionChain {
    pub fn new(conjunction: Conjunction) -> Self {
        Self {
            conjunction,
            conditions: Vec::new(),
        }
    }

    pub fn with_conditions(conjunction: Conjunction, conditions: Vec<Condition>) -> Self {
        Self {
            conjunction,
            conditions,
        }
    }

    pub fn conjunction(&self) -> Conjunction {
        self.conjunction
    }

    pub fn add_condition(&mut self, condition: Condition) {
        self.conditions.push(condition);
    }

    /// Removes the first member equal to `condition`.
    pub fn remove_condition(&mut self, condition: &Condition) -> bool {
        match self.conditions.iter().position(|c| c == condition) {
            Some(idx) => {
                self.conditions.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, condition: &Condition) -> bool {
        self.conditions.contains(condition)
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn conditions_mut(&mut self) -> &mut [Condition] {
        &mut self.conditions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Condition> {
        self.conditions.iter()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// AND: sum of all member scores, `NoMatch` as soon as one member fails.
    /// OR: sum of the matching members' scores, `NoMatch` if none match.
    /// An empty chain never matches.
    pub fn match_count(
        &self,
        record: Option<&dyn Record>,
        input: Option<&PropertyValueBag>,
    ) -> MatchResult {
        let mut total: Option<u32> = None;
        for condition in &self.conditions {
            match condition.match_count(record, input) {
                MatchResult::Match(score) => {
                    total = Some(total.unwrap_or(0).saturating_add(score));
                }
                MatchResult::NoMatch if self.conjunction == Conjunction::And => {
                    return MatchResult::NoMatch;
                }
                MatchResult::NoMatch => {}
            }
        }
        total.map_or(MatchResult::NoMatch, MatchResult::Match)
    }

    pub fn is_visible(&self, record: Option<&dyn Record>, input: Option<&PropertyValueBag>) -> bool {
        match self.conjunction {
            Conjunction::And => self.conditions.iter().all(|c| c.is_visible(record, input)),
            Conjunction::Or => self.conditions.iter().any(|c| c.is_visible(record, input)),
        }
    }
}

impl<'a> IntoIterator for &'a ConditionChain {
    type Item = &'a Condition;
    type IntoIter = std::slice::Iter<'a, Condition>;

    fn into_iter(self) -> Self::IntoIter {
        self.conditions.iter()
    }
}

impl Display for ConditionChain {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let sep = match self.conjunction {
            Conjunction::And => " & ",
            Conjunction::Or => " | ",
        };
        write!(f, "(")?;
        for (idx, condition) in self.conditions.iter().enumerate() {
            if idx > 0 {
                f.write_str(sep)?;
            }
            write!(f, "{condition}")?;
        }
        write!(f, ")")
    }
}
