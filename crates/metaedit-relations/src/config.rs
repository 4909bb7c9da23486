//! Container definitions loaded from JSON.
//!
//! ```json
//! {
//!   "name": "tl_page",
//!   "basic": {"mode": "hierarchical", "data_provider": "tl_page", "root_data_provider": "tl_page"},
//!   "palettes": {"__selector__": ["type"], "default": "{title_legend},title,type"},
//!   "subpalettes": {"type_redirect": "url"},
//!   "relationships": {
//!     "root": {"provider": "tl_page", "filter": [{"property": "pid", "value": 0}],
//!              "setters": [{"property": "pid", "value": 0}]},
//!     "children": [{"from": "tl_page", "to": "tl_page",
//!                   "filter": [{"local": "id", "remote": "pid"}],
//!                   "setters": [{"to_field": "pid", "from_field": "id"}]}]
//!   }
//! }
//! ```

use metaedit_palette::{LegacyPaletteParser, LegacyPalettes, PaletteCollection};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::definition::{BasicDefinition, ContainerMode, ModelRelationshipDefinition};
use crate::error::{ConfigError, RelationshipError};

/// The on-disk shape of a container definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerConfig {
    pub name: String,
    pub basic: BasicDefinition,
    /// Selector fields in addition to the palettes' `__selector__` entry.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selectors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub palettes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subpalettes: Option<Value>,
    #[serde(default)]
    pub relationships: ModelRelationshipDefinition,
}

impl ContainerConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Validate and compile into a [`ContainerDefinition`].
    pub fn compile(self) -> Result<ContainerDefinition, ConfigError> {
        let invalid = |message: String| ConfigError::Invalid {
            container: self.name.clone(),
            message,
        };

        if self.basic.data_provider.is_empty() {
            return Err(invalid("basic.data_provider is empty".to_string()));
        }
        match self.basic.mode {
            ContainerMode::ParentedList if self.basic.parent_data_provider.is_none() => {
                return Err(invalid(
                    "parented_list mode needs basic.parent_data_provider".to_string(),
                ));
            }
            ContainerMode::Hierarchical if self.relationships.root_condition().is_none() => {
                return Err(invalid("hierarchical mode needs relationships.root".to_string()));
            }
            _ => {}
        }
        validate_relationships(&self.relationships).map_err(|err| invalid(err.to_string()))?;

        let palettes = match &self.palettes {
            Some(palettes) => {
                let source = LegacyPalettes::from_json(palettes, self.subpalettes.as_ref())?;
                LegacyPaletteParser::new().parse(&source, &self.selectors, None)
            }
            None => PaletteCollection::new(),
        };

        tracing::debug!(
            container = %self.name,
            mode = %self.basic.mode,
            palettes = palettes.len(),
            relationships = self.relationships.child_conditions().len(),
            "container compiled"
        );

        Ok(ContainerDefinition {
            name: self.name,
            basic: self.basic,
            palettes,
            relationships: self.relationships,
        })
    }
}

fn validate_relationships(definition: &ModelRelationshipDefinition) -> Result<(), RelationshipError> {
    if let Some(root) = definition.root_condition() {
        root.validate()?;
    }
    for condition in definition.child_conditions() {
        condition.validate()?;
    }
    Ok(())
}

/// A compiled, immutable container: mode, providers, palettes and
/// relationships.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerDefinition {
    name: String,
    basic: BasicDefinition,
    palettes: PaletteCollection,
    relationships: ModelRelationshipDefinition,
}

impl ContainerDefinition {
    pub fn new(name: impl Into<String>, basic: BasicDefinition) -> Self {
        Self {
            name: name.into(),
            basic,
            palettes: PaletteCollection::new(),
            relationships: ModelRelationshipDefinition::new(),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        ContainerConfig::from_path(path)?.compile()
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        ContainerConfig::from_json_str(text)?.compile()
    }

    #[must_use]
    pub fn with_palettes(mut self, palettes: PaletteCollection) -> Self {
        self.palettes = palettes;
        self
    }

    #[must_use]
    pub fn with_relationships(mut self, relationships: ModelRelationshipDefinition) -> Self {
        self.relationships = relationships;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn basic(&self) -> &BasicDefinition {
        &self.basic
    }

    pub fn palettes(&self) -> &PaletteCollection {
        &self.palettes
    }

    pub fn relationships(&self) -> &ModelRelationshipDefinition {
        &self.relationships
    }
}
