//! Declarative parent/child and root conditions.
//!
//! A condition is written as a *template*: filter rules that name properties of
//! a known record instead of values. Instantiating the template against a
//! concrete record yields a provider [`FilterRule`] list:
//!
//! ```text
//! template  [{"local": "id", "remote": "pid"}]
//! parent    {"id": 1}
//! filter    pid = 1
//! ```
//!
//! Setters describe the inverse direction: which child properties to write so
//! that the child satisfies the filter for its new parent.

use metaedit_model::{matches_all, ComparisonOperator, FilterRule, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RelationshipError;

/// Operation of a template node: a comparison or a nested group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TemplateOperation {
    #[default]
    #[serde(rename = "=", alias = "==")]
    Equals,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "LIKE", alias = "like")]
    Like,
    #[serde(rename = "IN", alias = "in")]
    In,
    #[serde(rename = "AND", alias = "and")]
    And,
    #[serde(rename = "OR", alias = "or")]
    Or,
}

impl TemplateOperation {
    fn comparison(self) -> Option<ComparisonOperator> {
        match self {
            Self::Equals => Some(ComparisonOperator::Equals),
            Self::GreaterThan => Some(ComparisonOperator::GreaterThan),
            Self::LessThan => Some(ComparisonOperator::LessThan),
            Self::Like => Some(ComparisonOperator::Like),
            Self::In => Some(ComparisonOperator::In),
            Self::And | Self::Or => None,
        }
    }

    fn is_default(&self) -> bool {
        *self == Self::Equals
    }
}

/// One node of a filter template.
///
/// Leaf shapes:
/// - `{local, remote}`: `remote` of the searched record equals `local` of the
///   known record (a *link*).
/// - `{remote, remote_value}` / `{property, value}`: the searched record's
///   property equals a literal.
/// - `{local, value}`: `local` of the searched record equals a literal.
///
/// Group shape: `{operation: AND|OR, children}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterTemplateRule {
    #[serde(default, skip_serializing_if = "TemplateOperation::is_default")]
    pub operation: TemplateOperation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FilterTemplateRule>,
}

/// A leaf template resolved to the parts needed for instantiation.
enum Leaf<'a> {
    Link { local: &'a str, remote: &'a str },
    Literal { property: &'a str, value: &'a Value },
}

impl FilterTemplateRule {
    /// `{local, remote}`.
    pub fn link(local: impl Into<String>, remote: impl Into<String>) -> Self {
        Self {
            local: Some(local.into()),
            remote: Some(remote.into()),
            ..Self::default()
        }
    }

    /// `{property, value}`.
    pub fn literal(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            property: Some(property.into()),
            value: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn all_of(children: Vec<FilterTemplateRule>) -> Self {
        Self {
            operation: TemplateOperation::And,
            children,
            ..Self::default()
        }
    }

    pub fn any_of(children: Vec<FilterTemplateRule>) -> Self {
        Self {
            operation: TemplateOperation::Or,
            children,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_operation(mut self, operation: TemplateOperation) -> Self {
        self.operation = operation;
        self
    }

    pub fn is_group(&self) -> bool {
        self.operation.comparison().is_none()
    }

    fn leaf(&self) -> Result<Leaf<'_>, RelationshipError> {
        let target = self.remote.as_deref().or(self.property.as_deref());
        let literal = self.remote_value.as_ref().or(self.value.as_ref());

        match (target, self.local.as_deref(), literal) {
            (Some(remote), Some(local), _) => Ok(Leaf::Link { local, remote }),
            (Some(property), None, Some(value)) => Ok(Leaf::Literal { property, value }),
            (None, Some(property), Some(value)) => Ok(Leaf::Literal { property, value }),
            _ => Err(RelationshipError::config(format!(
                "filter rule {} names neither a link nor a literal",
                serde_json::to_string(self).unwrap_or_default()
            ))),
        }
    }

    /// Instantiate against the known record.
    pub fn instantiate(&self, known: Option<&dyn Record>) -> Result<FilterRule, RelationshipError> {
        let Some(op) = self.operation.comparison() else {
            if self.children.is_empty() {
                return Err(RelationshipError::config("filter group without children"));
            }
            let children = self
                .children
                .iter()
                .map(|child| child.instantiate(known))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(match self.operation {
                TemplateOperation::Or => FilterRule::or(children),
                _ => FilterRule::and(children),
            });
        };

        match self.leaf()? {
            Leaf::Link { local, remote } => {
                let known = known.ok_or_else(|| RelationshipError::MissingParent {
                    property: local.to_string(),
                })?;
                let value = known.property(local).cloned().unwrap_or(Value::Null);
                Ok(FilterRule::compare(op, remote, value))
            }
            Leaf::Literal { property, value } => Ok(FilterRule::compare(op, property, value.clone())),
        }
    }

    /// Evaluate the rule pairwise: links compare `parent[local]` with
    /// `child[remote]`, literals compare the child's property.
    pub fn holds_between(&self, parent: &dyn Record, child: &dyn Record) -> bool {
        let Some(op) = self.operation.comparison() else {
            return match self.operation {
                TemplateOperation::Or => self.children.iter().any(|c| c.holds_between(parent, child)),
                _ => self.children.iter().all(|c| c.holds_between(parent, child)),
            };
        };

        match self.leaf() {
            Ok(Leaf::Link { local, remote }) => {
                let expected = parent.property(local).cloned().unwrap_or(Value::Null);
                op.evaluate(child.property(remote), &expected)
            }
            Ok(Leaf::Literal { property, value }) => op.evaluate(child.property(property), value),
            Err(err) => {
                tracing::debug!(%err, "skipping malformed rule");
                false
            }
        }
    }

    /// The inverse of a forward rule: links are swapped, literals (which
    /// constrain the child) are dropped.
    fn inverted(&self) -> Option<Self> {
        if self.is_group() {
            let children: Vec<_> = self.children.iter().filter_map(Self::inverted).collect();
            return (!children.is_empty()).then(|| Self {
                operation: self.operation,
                children,
                ..Self::default()
            });
        }
        match self.leaf() {
            Ok(Leaf::Link { local, remote }) => {
                Some(Self::link(remote, local).with_operation(self.operation))
            }
            _ => None,
        }
    }

    fn collect_searched_properties(&self, out: &mut Vec<String>) {
        if self.is_group() {
            for child in &self.children {
                child.collect_searched_properties(out);
            }
            return;
        }
        let name = match self.leaf() {
            Ok(Leaf::Link { remote, .. }) => remote,
            Ok(Leaf::Literal { property, .. }) => property,
            Err(_) => return,
        };
        if !out.iter().any(|p| p == name) {
            out.push(name.to_string());
        }
    }
}

fn instantiate_all(
    rules: &[FilterTemplateRule],
    known: Option<&dyn Record>,
) -> Result<Vec<FilterRule>, RelationshipError> {
    rules.iter().map(|rule| rule.instantiate(known)).collect()
}

/// How to write one child property when linking it to a parent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipSetter {
    #[serde(default, alias = "property", skip_serializing_if = "Option::is_none")]
    pub to_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// A setter resolved to one of its two valid shapes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SetterKind<'a> {
    /// `child[to] = parent[from]`
    Link { to: &'a str, from: &'a str },
    /// `child[to] = value`
    Literal { to: &'a str, value: &'a Value },
}

impl RelationshipSetter {
    pub fn link(to_field: impl Into<String>, from_field: impl Into<String>) -> Self {
        Self {
            to_field: Some(to_field.into()),
            from_field: Some(from_field.into()),
            value: None,
        }
    }

    pub fn literal(to_field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            to_field: Some(to_field.into()),
            from_field: None,
            value: Some(value.into()),
        }
    }

    pub fn kind(&self) -> Result<SetterKind<'_>, RelationshipError> {
        match (self.to_field.as_deref(), self.from_field.as_deref(), self.value.as_ref()) {
            (Some(to), Some(from), None) => Ok(SetterKind::Link { to, from }),
            (Some(to), None, Some(value)) => Ok(SetterKind::Literal { to, value }),
            _ => Err(RelationshipError::config(format!(
                "setter {} must be {{to_field, from_field}} or {{to_field, value}}",
                serde_json::to_string(self).unwrap_or_default()
            ))),
        }
    }
}

fn check_provider(expected: &str, record: &dyn Record) -> Result<(), RelationshipError> {
    if record.provider_name() == expected {
        Ok(())
    } else {
        Err(RelationshipError::provider_mismatch(expected, record.provider_name()))
    }
}

fn require_setters(setters: &[RelationshipSetter], what: &str) -> Result<(), RelationshipError> {
    if setters.is_empty() {
        return Err(RelationshipError::config(format!("{what} has no setters")));
    }
    Ok(())
}

/// Relation between records of a source (parent) and a destination (child)
/// provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentChildCondition {
    #[serde(rename = "from", alias = "source")]
    source: String,
    #[serde(rename = "to", alias = "destination")]
    destination: String,
    #[serde(default)]
    filter: Vec<FilterTemplateRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inverse: Option<Vec<FilterTemplateRule>>,
    #[serde(default)]
    setters: Vec<RelationshipSetter>,
}

impl ParentChildCondition {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            filter: Vec::new(),
            inverse: None,
            setters: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Vec<FilterTemplateRule>) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub fn with_inverse(mut self, inverse: Vec<FilterTemplateRule>) -> Self {
        self.inverse = Some(inverse);
        self
    }

    #[must_use]
    pub fn with_setters(mut self, setters: Vec<RelationshipSetter>) -> Self {
        self.setters = setters;
        self
    }

    pub fn source_name(&self) -> &str {
        &self.source
    }

    pub fn destination_name(&self) -> &str {
        &self.destination
    }

    pub fn filter_template(&self) -> &[FilterTemplateRule] {
        &self.filter
    }

    pub fn setters(&self) -> &[RelationshipSetter] {
        &self.setters
    }

    /// The explicit inverse template, or one derived by swapping the forward
    /// links.
    pub fn inverse_template(&self) -> Vec<FilterTemplateRule> {
        match &self.inverse {
            Some(inverse) => inverse.clone(),
            None => self.filter.iter().filter_map(FilterTemplateRule::inverted).collect(),
        }
    }

    /// Filter selecting the children of `parent`.
    pub fn build_filter(&self, parent: &dyn Record) -> Result<Vec<FilterRule>, RelationshipError> {
        instantiate_all(&self.filter, Some(parent))
    }

    /// Filter selecting the parent of `child`.
    pub fn inverse_filter_for(&self, child: &dyn Record) -> Result<Vec<FilterRule>, RelationshipError> {
        let template = self.inverse_template();
        if template.is_empty() {
            return Err(RelationshipError::config(format!(
                "relationship {} -> {} has no inverse filter",
                self.source, self.destination
            )));
        }
        instantiate_all(&template, Some(child))
    }

    /// Make `child` a child of `parent`.
    pub fn apply_to(&self, parent: &dyn Record, child: &mut dyn Record) -> Result<(), RelationshipError> {
        require_setters(&self.setters, &format!("relationship {} -> {}", self.source, self.destination))?;
        check_provider(&self.source, parent)?;
        check_provider(&self.destination, &*child)?;

        for setter in &self.setters {
            match setter.kind()? {
                SetterKind::Link { to, from } => {
                    let value = parent.property(from).cloned().unwrap_or(Value::Null);
                    child.set_property(to, value);
                }
                SetterKind::Literal { to, value } => child.set_property(to, value.clone()),
            }
        }
        Ok(())
    }

    /// Give `destination` the same parent as `source` (a sibling).
    pub fn copy_from(&self, source: &dyn Record, destination: &mut dyn Record) -> Result<(), RelationshipError> {
        require_setters(&self.setters, &format!("relationship {} -> {}", self.source, self.destination))?;
        check_provider(&self.destination, source)?;
        check_provider(&self.destination, &*destination)?;

        for setter in &self.setters {
            match setter.kind()? {
                SetterKind::Link { to, .. } => {
                    let value = source.property(to).cloned().unwrap_or(Value::Null);
                    destination.set_property(to, value);
                }
                SetterKind::Literal { to, value } => destination.set_property(to, value.clone()),
            }
        }
        Ok(())
    }

    /// Is `child` a child of `parent` under this condition?
    pub fn matches(&self, parent: &dyn Record, child: &dyn Record) -> bool {
        if parent.provider_name() != self.source || child.provider_name() != self.destination {
            return false;
        }
        self.filter.iter().all(|rule| rule.holds_between(parent, child))
    }

    /// Child-side properties the forward filter reads.
    pub fn needed_properties(&self) -> Vec<String> {
        let mut out = Vec::new();
        for rule in &self.filter {
            rule.collect_searched_properties(&mut out);
        }
        out
    }

    pub(crate) fn validate(&self) -> Result<(), RelationshipError> {
        let what = format!("relationship {} -> {}", self.source, self.destination);
        require_setters(&self.setters, &what)?;
        for setter in &self.setters {
            setter.kind()?;
        }
        if self.filter.is_empty() {
            return Err(RelationshipError::config(format!("{what} has no filter")));
        }
        Ok(())
    }
}

/// Which records of a provider are tree roots, and how to make one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootCondition {
    provider: String,
    #[serde(default)]
    filter: Vec<FilterTemplateRule>,
    #[serde(default)]
    setters: Vec<RelationshipSetter>,
}

impl RootCondition {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            filter: Vec::new(),
            setters: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Vec<FilterTemplateRule>) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub fn with_setters(mut self, setters: Vec<RelationshipSetter>) -> Self {
        self.setters = setters;
        self
    }

    pub fn provider_name(&self) -> &str {
        &self.provider
    }

    pub fn setters(&self) -> &[RelationshipSetter] {
        &self.setters
    }

    /// Filter selecting every root record.
    pub fn filter(&self) -> Result<Vec<FilterRule>, RelationshipError> {
        instantiate_all(&self.filter, None)
    }

    pub fn matches(&self, record: &dyn Record) -> bool {
        if record.provider_name() != self.provider {
            return false;
        }
        match self.filter() {
            Ok(filter) => matches_all(&filter, record),
            Err(err) => {
                tracing::debug!(%err, provider = %self.provider, "root filter cannot be built");
                false
            }
        }
    }

    /// Turn `record` into a root. Only literal setters are allowed.
    pub fn apply_to(&self, record: &mut dyn Record) -> Result<(), RelationshipError> {
        require_setters(&self.setters, &format!("root condition of {}", self.provider))?;
        check_provider(&self.provider, &*record)?;

        for setter in &self.setters {
            match setter.kind()? {
                SetterKind::Literal { to, value } => record.set_property(to, value.clone()),
                SetterKind::Link { to, .. } => {
                    return Err(RelationshipError::config(format!(
                        "root setter for `{to}` cannot copy from another field"
                    )));
                }
            }
        }
        Ok(())
    }

    pub(crate) fn validate(&self) -> Result<(), RelationshipError> {
        let what = format!("root condition of {}", self.provider);
        require_setters(&self.setters, &what)?;
        if self.filter.is_empty() {
            return Err(RelationshipError::config(format!("{what} has no filter")));
        }
        for setter in &self.setters {
            if let SetterKind::Link { to, .. } = setter.kind()? {
                return Err(RelationshipError::config(format!(
                    "root setter for `{to}` cannot copy from another field"
                )));
            }
        }
        self.filter()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metaedit_model::Model;
    use serde_json::json;

    fn pages() -> ParentChildCondition {
        ParentChildCondition::new("tl_page", "tl_page")
            .with_filter(vec![FilterTemplateRule::link("id", "pid")])
            .with_setters(vec![RelationshipSetter::link("pid", "id")])
    }

    #[test]
    fn link_rule_reads_the_known_record() {
        let parent = Model::with_id("tl_page", 1);
        assert_eq!(pages().build_filter(&parent).unwrap(), vec![FilterRule::equals("pid", 1)]);
    }

    #[test]
    fn literal_shapes() {
        let known = Model::with_id("tl_page", 7);
        let remote_value = FilterTemplateRule {
            remote: Some("type".into()),
            remote_value: Some(json!("root")),
            ..FilterTemplateRule::default()
        };
        let local_value = FilterTemplateRule {
            local: Some("published".into()),
            value: Some(json!(1)),
            ..FilterTemplateRule::default()
        };
        assert_eq!(
            remote_value.instantiate(Some(&known)).unwrap(),
            FilterRule::equals("type", "root")
        );
        assert_eq!(local_value.instantiate(None).unwrap(), FilterRule::equals("published", 1));
        assert_eq!(
            FilterTemplateRule::literal("sorting", 10)
                .with_operation(TemplateOperation::GreaterThan)
                .instantiate(None)
                .unwrap(),
            FilterRule::GreaterThan {
                property: "sorting".into(),
                value: json!(10)
            }
        );
    }

    #[test]
    fn group_rules_nest() {
        let template = FilterTemplateRule::any_of(vec![
            FilterTemplateRule::link("id", "pid"),
            FilterTemplateRule::literal("type", "root"),
        ]);
        let parent = Model::with_id("tl_page", 3);
        assert_eq!(
            template.instantiate(Some(&parent)).unwrap(),
            FilterRule::or(vec![FilterRule::equals("pid", 3), FilterRule::equals("type", "root")])
        );
    }

    #[test]
    fn link_without_known_record_is_missing_parent() {
        let err = FilterTemplateRule::link("id", "pid").instantiate(None).unwrap_err();
        assert_eq!(err, RelationshipError::MissingParent { property: "id".into() });
    }

    #[test]
    fn rule_without_property_is_a_configuration_error() {
        let empty = FilterTemplateRule::default();
        assert!(matches!(empty.instantiate(None), Err(RelationshipError::Configuration(_))));
        let group = FilterTemplateRule::all_of(vec![]);
        assert!(matches!(group.instantiate(None), Err(RelationshipError::Configuration(_))));
    }

    #[test]
    fn apply_then_match_round_trips() {
        let condition = pages();
        let parent = Model::with_id("tl_page", 1);
        let mut child = Model::with_id("tl_page", 2).with_property("pid", 0);

        assert!(!condition.matches(&parent, &child));
        condition.apply_to(&parent, &mut child).unwrap();
        assert_eq!(child.property("pid"), Some(&json!(1)));
        assert!(condition.matches(&parent, &child));

        let filter = condition.build_filter(&parent).unwrap();
        assert!(matches_all(&filter, &child));
    }

    #[test]
    fn inverse_is_derived_by_swapping_links() {
        let condition = ParentChildCondition::new("tl_news_archive", "tl_news")
            .with_filter(vec![
                FilterTemplateRule::link("id", "pid"),
                FilterTemplateRule::literal("ptable", "tl_news_archive"),
            ])
            .with_setters(vec![
                RelationshipSetter::link("pid", "id"),
                RelationshipSetter::literal("ptable", "tl_news_archive"),
            ]);
        let child = Model::with_id("tl_news", 9).with_property("pid", 4);
        assert_eq!(condition.inverse_filter_for(&child).unwrap(), vec![FilterRule::equals("id", 4)]);
        assert_eq!(condition.needed_properties(), ["pid", "ptable"]);
    }

    #[test]
    fn explicit_inverse_wins() {
        let condition = pages().with_inverse(vec![
            FilterTemplateRule::link("pid", "id"),
            FilterTemplateRule::literal("type", "regular"),
        ]);
        let child = Model::with_id("tl_page", 2).with_property("pid", 1);
        assert_eq!(
            condition.inverse_filter_for(&child).unwrap(),
            vec![FilterRule::equals("id", 1), FilterRule::equals("type", "regular")]
        );
    }

    #[test]
    fn copy_from_takes_the_siblings_parent() {
        let condition = ParentChildCondition::new("tl_article", "tl_content")
            .with_filter(vec![FilterTemplateRule::link("id", "pid")])
            .with_setters(vec![
                RelationshipSetter::link("pid", "id"),
                RelationshipSetter::literal("ptable", "tl_article"),
            ]);
        let sibling = Model::with_id("tl_content", 1).with_property("pid", 5);
        let mut pasted = Model::with_id("tl_content", 2);
        condition.copy_from(&sibling, &mut pasted).unwrap();
        assert_eq!(pasted.property("pid"), Some(&json!(5)));
        assert_eq!(pasted.property("ptable"), Some(&json!("tl_article")));
    }

    #[test]
    fn providers_are_guarded() {
        let condition = ParentChildCondition::new("tl_article", "tl_content")
            .with_filter(vec![FilterTemplateRule::link("id", "pid")])
            .with_setters(vec![RelationshipSetter::link("pid", "id")]);
        let wrong_parent = Model::with_id("tl_page", 1);
        let mut child = Model::with_id("tl_content", 2);
        assert_eq!(
            condition.apply_to(&wrong_parent, &mut child).unwrap_err(),
            RelationshipError::ProviderMismatch {
                expected: "tl_article".into(),
                actual: "tl_page".into()
            }
        );
        let parent = Model::with_id("tl_article", 1).with_property("pid", 1);
        assert!(!condition.matches(&wrong_parent, &child));
        assert!(!condition.matches(&parent, &Model::with_id("tl_page", 2).with_property("pid", 1)));
    }

    #[test]
    fn setter_shapes_are_checked() {
        let parent = Model::with_id("tl_page", 1);
        let mut child = Model::with_id("tl_page", 2);

        let empty = ParentChildCondition::new("tl_page", "tl_page");
        assert!(matches!(empty.apply_to(&parent, &mut child), Err(RelationshipError::Configuration(_))));

        let ambiguous = pages().with_setters(vec![RelationshipSetter {
            to_field: Some("pid".into()),
            from_field: Some("id".into()),
            value: Some(json!(0)),
        }]);
        assert!(matches!(ambiguous.apply_to(&parent, &mut child), Err(RelationshipError::Configuration(_))));

        let parsed: RelationshipSetter = serde_json::from_value(json!({"property": "pid", "value": 0})).unwrap();
        assert_eq!(parsed, RelationshipSetter::literal("pid", 0));
    }

    #[test]
    fn root_condition() {
        let root = RootCondition::new("tl_page")
            .with_filter(vec![FilterTemplateRule::literal("pid", 0)])
            .with_setters(vec![RelationshipSetter::literal("pid", 0)]);

        let mut page = Model::with_id("tl_page", 4).with_property("pid", 2);
        assert!(!root.matches(&page));
        root.apply_to(&mut page).unwrap();
        assert!(root.matches(&page));
        assert!(!root.matches(&Model::with_id("tl_article", 1).with_property("pid", 0)));

        let copying = RootCondition::new("tl_page").with_setters(vec![RelationshipSetter::link("pid", "id")]);
        assert!(matches!(copying.apply_to(&mut page), Err(RelationshipError::Configuration(_))));
        assert!(copying.validate().is_err());
        assert!(root.validate().is_ok());

        let unfiltered = RootCondition::new("tl_page").with_setters(vec![RelationshipSetter::literal("pid", 0)]);
        assert!(matches!(
            unfiltered.validate(),
            Err(RelationshipError::Configuration(message)) if message.contains("has no filter")
        ));
    }

    #[test]
    fn templates_deserialize_from_container_json() {
        let condition: ParentChildCondition = serde_json::from_value(json!({
            "from": "tl_page",
            "to": "tl_page",
            "filter": [{"local": "id", "remote": "pid"},
                       {"operation": "OR", "children": [{"property": "type", "value": "regular"},
                                                         {"property": "type", "value": "root"}]}],
            "setters": [{"to_field": "pid", "from_field": "id"}]
        }))
        .unwrap();
        assert!(condition.validate().is_ok());
        assert_eq!(condition.filter_template()[1].operation, TemplateOperation::Or);

        let parent = Model::with_id("tl_page", 1);
        let child = Model::with_id("tl_page", 2).with_property("pid", 1).with_property("type", "root");
        assert!(condition.matches(&parent, &child));
    }
}
