use metaedit_model::{PropertyValueBag, Record};
use serde::{Deserialize, Serialize};

use crate::property::Property;

/// Name of the legend collecting fields listed before any `{legend}` token.
pub const UNNAMED_LEGEND: &str = "unnamed";

fn default_true() -> bool {
    true
}

/// An ordered group of fields within a palette.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Legend {
    name: String,
    #[serde(default)]
    properties: Vec<Property>,
    /// `false` when declared with `:hide` (rendered collapsed by the view).
    #[serde(default = "default_true")]
    initially_visible: bool,
}

impl Legend {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
            initially_visible: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_initially_visible(&self) -> bool {
        self.initially_visible
    }

    pub fn set_initially_visible(&mut self, visible: bool) {
        self.initially_visible = visible;
    }

    /// Append a property. A property with the same name already in the legend
    /// is merged instead of duplicated.
    pub fn add_property(&mut self, property: Property) {
        self.insert_property(property, None);
    }

    /// Insert before the property named `before` (appends if it is absent).
    pub fn add_property_before(&mut self, property: Property, before: &str) {
        self.insert_property(property, Some(before));
    }

    fn insert_property(&mut self, property: Property, before: Option<&str>) {
        if let Some(existing) = self.properties.iter_mut().find(|p| p.name() == property.name()) {
            existing.merge_visibility(&property);
            return;
        }
        let position = before
            .and_then(|name| self.properties.iter().position(|p| p.name() == name))
            .unwrap_or(self.properties.len());
        self.properties.insert(position, property);
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.properties.iter().any(|p| p.name() == name)
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name() == name)
    }

    pub fn property_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.properties.iter_mut().find(|p| p.name() == name)
    }

    pub fn remove_property(&mut self, name: &str) -> Option<Property> {
        let idx = self.properties.iter().position(|p| p.name() == name)?;
        Some(self.properties.remove(idx))
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Properties visible for the given record/input.
    pub fn visible_properties(
        &self,
        record: Option<&dyn Record>,
        input: Option<&PropertyValueBag>,
    ) -> Vec<&Property> {
        self.properties
            .iter()
            .filter(|p| p.is_visible(record, input))
            .collect()
    }
}
