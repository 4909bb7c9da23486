//! Records and pending form input.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::id::{ModelId, RecordId};

/// Name of the property holding the record id.
pub const ID_PROPERTY: &str = "id";

/// Capability interface the condition and relationship engines need from a
/// record. Hosts with their own record type implement this; [`Model`] is the
/// bundled implementation.
pub trait Record {
    fn provider_name(&self) -> &str;

    fn property(&self, name: &str) -> Option<&Value>;

    fn set_property(&mut self, name: &str, value: Value);

    fn id(&self) -> Option<RecordId> {
        self.property(ID_PROPERTY).and_then(RecordId::from_value)
    }

    fn model_id(&self) -> Option<ModelId> {
        self.id().map(|id| ModelId::new(self.provider_name(), id))
    }
}

/// A named-property bag owned by exactly one provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    provider: String,
    properties: BTreeMap<String, Value>,
}

impl Model {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_id(provider: impl Into<String>, id: impl Into<RecordId>) -> Self {
        let mut model = Self::new(provider);
        model.set_id(id.into());
        model
    }

    /// Build a model from a flat JSON object (`{"id": 1, "title": ...}`).
    pub fn from_json_object(provider: impl Into<String>, object: Map<String, Value>) -> Self {
        Self {
            provider: provider.into(),
            properties: object.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn with_property(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(name.to_string(), value.into());
        self
    }

    pub fn set_id(&mut self, id: RecordId) {
        self.properties.insert(ID_PROPERTY.to_string(), id.to_value());
    }

    pub fn properties(&self) -> &BTreeMap<String, Value> {
        &self.properties
    }

    pub fn remove_property(&mut self, name: &str) -> Option<Value> {
        self.properties.remove(name)
    }

    pub fn to_json_object(&self) -> Map<String, Value> {
        self.properties
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl Record for Model {
    fn provider_name(&self) -> &str {
        &self.provider
    }

    fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    fn set_property(&mut self, name: &str, value: Value) {
        self.properties.insert(name.to_string(), value);
    }
}

/// Candidate values submitted by a form, before they are committed to a
/// record, together with per-property validation errors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyValueBag {
    values: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    errors: BTreeMap<String, Vec<String>>,
}

impl PropertyValueBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a bag with the committed values of a record.
    pub fn from_record(model: &Model) -> Self {
        Self {
            values: model.properties().clone(),
            errors: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_value(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set_property_value(name, value.into());
        self
    }

    pub fn has_property_value(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn property_value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn set_property_value(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Removing a value also drops its errors.
    pub fn remove_property_value(&mut self, name: &str) -> Option<Value> {
        self.errors.remove(name);
        self.values.remove(name)
    }

    pub fn mark_property_value_as_invalid(&mut self, name: &str, error: impl Into<String>, append: bool) {
        let entry = self.errors.entry(name.to_string()).or_default();
        if !append {
            entry.clear();
        }
        entry.push(error.into());
    }

    pub fn is_property_value_invalid(&self, name: &str) -> bool {
        self.errors.get(name).map_or(false, |errors| !errors.is_empty())
    }

    pub fn has_invalid_property_values(&self) -> bool {
        self.errors.values().any(|errors| !errors.is_empty())
    }

    pub fn reset_property_value_errors(&mut self, name: &str) {
        self.errors.remove(name);
    }

    pub fn property_value_errors(&self, name: &str) -> &[String] {
        self.errors.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn invalid_property_errors(&self) -> &BTreeMap<String, Vec<String>> {
        &self.errors
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Value lookup used by conditions: the pending input wins over the record's
/// committed value so in-progress edits immediately affect visibility.
pub fn effective_value<'a>(
    name: &str,
    record: Option<&'a dyn Record>,
    input: Option<&'a PropertyValueBag>,
) -> Option<&'a Value> {
    if let Some(input) = input {
        if input.has_property_value(name) {
            return input.property_value(name);
        }
    }
    record.and_then(|r| r.property(name))
}
