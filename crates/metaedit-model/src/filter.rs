//! Provider filter rules.
//!
//! A filter is an ordered list of [`FilterRule`]s that must all hold (implicit
//! AND at the top level). Rules serialize with an `operation` tag so they keep
//! the array-of-rules shape container metadata is written in:
//!
//! ```json
//! [{"operation": "=", "property": "pid", "value": 1},
//!  {"operation": "OR", "children": [
//!     {"operation": "=", "property": "type", "value": "regular"},
//!     {"operation": "IN", "property": "type", "values": ["root", "forward"]}]}]
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::model::Record;
use crate::value::{compare_values, display_value, like_matches, loose_eq};

/// Comparison operators available to leaf rules and relationship templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ComparisonOperator {
    #[default]
    #[serde(rename = "=")]
    Equals,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "LIKE")]
    Like,
    #[serde(rename = "IN")]
    In,
}

impl ComparisonOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "=",
            Self::GreaterThan => ">",
            Self::LessThan => "<",
            Self::Like => "LIKE",
            Self::In => "IN",
        }
    }

    /// Evaluate `lhs <op> rhs` with loose value semantics.
    pub fn evaluate(self, lhs: Option<&Value>, rhs: &Value) -> bool {
        match self {
            Self::Equals => loose_eq(lhs, Some(rhs)),
            Self::GreaterThan => compare_values(lhs, Some(rhs)) == Some(Ordering::Greater),
            Self::LessThan => compare_values(lhs, Some(rhs)) == Some(Ordering::Less),
            Self::Like => like_matches(lhs, &display_value(rhs)),
            Self::In => match rhs {
                Value::Array(candidates) => candidates.iter().any(|c| loose_eq(lhs, Some(c))),
                single => loose_eq(lhs, Some(single)),
            },
        }
    }
}

impl FromStr for ComparisonOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "=" | "==" => Ok(Self::Equals),
            ">" => Ok(Self::GreaterThan),
            "<" => Ok(Self::LessThan),
            "LIKE" => Ok(Self::Like),
            "IN" => Ok(Self::In),
            other => Err(format!("unknown comparison operator `{other}`")),
        }
    }
}

impl Display for ComparisonOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One node of a provider filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation")]
pub enum FilterRule {
    #[serde(rename = "AND")]
    And { children: Vec<FilterRule> },
    #[serde(rename = "OR")]
    Or { children: Vec<FilterRule> },
    #[serde(rename = "=")]
    Equals { property: String, value: Value },
    #[serde(rename = ">")]
    GreaterThan { property: String, value: Value },
    #[serde(rename = "<")]
    LessThan { property: String, value: Value },
    #[serde(rename = "IN")]
    In { property: String, values: Vec<Value> },
    #[serde(rename = "LIKE")]
    Like { property: String, value: String },
}

impl FilterRule {
    pub fn equals(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Equals {
            property: property.into(),
            value: value.into(),
        }
    }

    pub fn and(children: Vec<FilterRule>) -> Self {
        Self::And { children }
    }

    pub fn or(children: Vec<FilterRule>) -> Self {
        Self::Or { children }
    }

    /// Build a leaf rule from an operator (as used by relationship templates).
    pub fn compare(op: ComparisonOperator, property: impl Into<String>, value: Value) -> Self {
        let property = property.into();
        match op {
            ComparisonOperator::Equals => Self::Equals { property, value },
            ComparisonOperator::GreaterThan => Self::GreaterThan { property, value },
            ComparisonOperator::LessThan => Self::LessThan { property, value },
            ComparisonOperator::Like => Self::Like {
                property,
                value: display_value(&value),
            },
            ComparisonOperator::In => Self::In {
                property,
                values: match value {
                    Value::Array(values) => values,
                    single => vec![single],
                },
            },
        }
    }

    /// Does `record` satisfy this rule? An empty AND holds, an empty OR does not.
    pub fn matches(&self, record: &dyn Record) -> bool {
        match self {
            Self::And { children } => children.iter().all(|c| c.matches(record)),
            Self::Or { children } => children.iter().any(|c| c.matches(record)),
            Self::Equals { property, value } => {
                ComparisonOperator::Equals.evaluate(record.property(property), value)
            }
            Self::GreaterThan { property, value } => {
                ComparisonOperator::GreaterThan.evaluate(record.property(property), value)
            }
            Self::LessThan { property, value } => {
                ComparisonOperator::LessThan.evaluate(record.property(property), value)
            }
            Self::In { property, values } => values
                .iter()
                .any(|v| loose_eq(record.property(property), Some(v))),
            Self::Like { property, value } => like_matches(record.property(property), value),
        }
    }

    /// Property names this rule reads.
    pub fn properties(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_properties(&mut out);
        out
    }

    fn collect_properties<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::And { children } | Self::Or { children } => {
                for child in children {
                    child.collect_properties(out);
                }
            }
            Self::Equals { property, .. }
            | Self::GreaterThan { property, .. }
            | Self::LessThan { property, .. }
            | Self::In { property, .. }
            | Self::Like { property, .. } => {
                if !out.contains(&property.as_str()) {
                    out.push(property);
                }
            }
        }
    }
}

/// Top-level filters are implicit conjunctions.
pub fn matches_all(rules: &[FilterRule], record: &dyn Record) -> bool {
    rules.iter().all(|rule| rule.matches(record))
}

impl Display for FilterRule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        fn group(f: &mut Formatter<'_>, children: &[FilterRule], sep: &str) -> std::fmt::Result {
            write!(f, "(")?;
            for (idx, child) in children.iter().enumerate() {
                if idx > 0 {
                    write!(f, " {sep} ")?;
                }
                write!(f, "{child}")?;
            }
            write!(f, ")")
        }

        match self {
            Self::And { children } => group(f, children, "AND"),
            Self::Or { children } => group(f, children, "OR"),
            Self::Equals { property, value } => write!(f, "{property} = {value}"),
            Self::GreaterThan { property, value } => write!(f, "{property} > {value}"),
            Self::LessThan { property, value } => write!(f, "{property} < {value}"),
            Self::In { property, values } => {
                write!(f, "{property} IN {}", Value::Array(values.clone()))
            }
            Self::Like { property, value } => write!(f, "{property} LIKE {value:?}"),
        }
    }
}

/// Fluent construction of filter rule lists.
///
/// ```
/// use metaedit_model::{FilterBuilder, FilterRule};
///
/// let rules = FilterBuilder::new()
///     .and_property_equals("pid", 1)
///     .and_any_of(|b| b.and_property_equals("type", "regular").and_property_equals("type", "root"))
///     .build();
/// assert_eq!(rules.len(), 2);
/// assert!(matches!(rules[1], FilterRule::Or { .. }));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterBuilder {
    rules: Vec<FilterRule>,
}

impl FilterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rules(rules: Vec<FilterRule>) -> Self {
        Self { rules }
    }

    #[must_use]
    pub fn and_rule(mut self, rule: FilterRule) -> Self {
        self.rules.push(rule);
        self
    }

    #[must_use]
    pub fn and_rules(mut self, rules: impl IntoIterator<Item = FilterRule>) -> Self {
        self.rules.extend(rules);
        self
    }

    #[must_use]
    pub fn and_property_equals(self, property: &str, value: impl Into<Value>) -> Self {
        self.and_rule(FilterRule::equals(property, value))
    }

    #[must_use]
    pub fn and_property_greater_than(self, property: &str, value: impl Into<Value>) -> Self {
        self.and_rule(FilterRule::GreaterThan {
            property: property.to_string(),
            value: value.into(),
        })
    }

    #[must_use]
    pub fn and_property_less_than(self, property: &str, value: impl Into<Value>) -> Self {
        self.and_rule(FilterRule::LessThan {
            property: property.to_string(),
            value: value.into(),
        })
    }

    #[must_use]
    pub fn and_property_value_in(self, property: &str, values: Vec<Value>) -> Self {
        self.and_rule(FilterRule::In {
            property: property.to_string(),
            values,
        })
    }

    #[must_use]
    pub fn and_property_like(self, property: &str, pattern: &str) -> Self {
        self.and_rule(FilterRule::Like {
            property: property.to_string(),
            value: pattern.to_string(),
        })
    }

    /// Add a disjunction; the closure's rules become the OR's children.
    #[must_use]
    pub fn and_any_of(self, group: impl FnOnce(FilterBuilder) -> FilterBuilder) -> Self {
        let children = group(FilterBuilder::new()).rules;
        self.and_rule(FilterRule::or(children))
    }

    /// Add a nested conjunction.
    #[must_use]
    pub fn and_all_of(self, group: impl FnOnce(FilterBuilder) -> FilterBuilder) -> Self {
        let children = group(FilterBuilder::new()).rules;
        self.and_rule(FilterRule::and(children))
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn build(self) -> Vec<FilterRule> {
        self.rules
    }

    /// Collapse into a single rule (a lone rule is returned unwrapped).
    pub fn build_rule(mut self) -> FilterRule {
        if self.rules.len() == 1 {
            if let Some(rule) = self.rules.pop() {
                return rule;
            }
        }
        FilterRule::and(self.rules)
    }
}
