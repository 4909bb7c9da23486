//! Container definitions: how records of a container are organised.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::condition::{ParentChildCondition, RootCondition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerMode {
    /// Unrelated records.
    #[default]
    Flat,
    /// Every record belongs to a record of a separate parent provider.
    #[serde(alias = "parented")]
    ParentedList,
    /// A tree, possibly spanning several providers.
    Hierarchical,
}

impl Display for ContainerMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Flat => "flat",
            Self::ParentedList => "parented_list",
            Self::Hierarchical => "hierarchical",
        })
    }
}

/// Mode and providers of a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicDefinition {
    #[serde(default)]
    pub mode: ContainerMode,
    pub data_provider: String,
    #[serde(default)]
    pub parent_data_provider: Option<String>,
    #[serde(default)]
    pub root_data_provider: Option<String>,
}

impl BasicDefinition {
    pub fn new(mode: ContainerMode, data_provider: impl Into<String>) -> Self {
        Self {
            mode,
            data_provider: data_provider.into(),
            parent_data_provider: None,
            root_data_provider: None,
        }
    }

    #[must_use]
    pub fn with_parent_data_provider(mut self, name: impl Into<String>) -> Self {
        self.parent_data_provider = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_root_data_provider(mut self, name: impl Into<String>) -> Self {
        self.root_data_provider = Some(name.into());
        self
    }
}

/// Root condition plus every parent→child condition of a container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelRelationshipDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    root: Option<RootCondition>,
    #[serde(default)]
    children: Vec<ParentChildCondition>,
}

impl ModelRelationshipDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_root_condition(mut self, root: RootCondition) -> Self {
        self.root = Some(root);
        self
    }

    #[must_use]
    pub fn with_child_condition(mut self, condition: ParentChildCondition) -> Self {
        self.children.push(condition);
        self
    }

    pub fn set_root_condition(&mut self, root: Option<RootCondition>) {
        self.root = root;
    }

    pub fn root_condition(&self) -> Option<&RootCondition> {
        self.root.as_ref()
    }

    pub fn add_child_condition(&mut self, condition: ParentChildCondition) {
        self.children.push(condition);
    }

    pub fn child_conditions(&self) -> &[ParentChildCondition] {
        &self.children
    }

    /// The condition linking `source` parents to `destination` children.
    pub fn child_condition(&self, source: &str, destination: &str) -> Option<&ParentChildCondition> {
        self.children
            .iter()
            .find(|c| c.source_name() == source && c.destination_name() == destination)
    }

    pub fn child_conditions_from<'a>(
        &'a self,
        source: &'a str,
    ) -> impl Iterator<Item = &'a ParentChildCondition> + 'a {
        self.children.iter().filter(move |c| c.source_name() == source)
    }

    pub fn child_conditions_to<'a>(
        &'a self,
        destination: &'a str,
    ) -> impl Iterator<Item = &'a ParentChildCondition> + 'a {
        self.children
            .iter()
            .filter(move |c| c.destination_name() == destination)
    }
}
